//! Dashboard state.

use chrono::{DateTime, Local};
use tunnel_core::{HealthSnapshot, IngressRule};

/// Most notices kept for display.
const MAX_NOTICES: usize = 20;

/// Everything one dashboard frame shows.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub health: HealthSnapshot,
    /// Shortened tunnel identifier, once a config has been read
    pub tunnel_id: Option<String>,
    pub routes: Vec<IngressRule>,
    pub notices: Vec<Notice>,
    /// Operation currently running in the background, if any
    pub busy: Option<String>,
}

impl DashboardState {
    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
        if self.notices.len() > MAX_NOTICES {
            let excess = self.notices.len() - MAX_NOTICES;
            self.notices.drain(..excess);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message posted back to the operator.
#[derive(Debug, Clone)]
pub struct Notice {
    pub at: DateTime<Local>,
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            at: Local::now(),
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            at: Local::now(),
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_are_bounded() {
        let mut state = DashboardState::default();
        for i in 0..50 {
            state.push_notice(Notice::info(format!("notice {}", i)));
        }
        assert_eq!(state.notices.len(), MAX_NOTICES);
        assert_eq!(state.notices.last().unwrap().text, "notice 49");
        assert_eq!(state.notices.first().unwrap().text, "notice 30");
    }
}
