//! Health snapshot types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tri-state result of a reachability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    /// Not checked yet
    #[default]
    Unknown,
    Ok,
    Error,
}

/// Liveness of the supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessHealth {
    /// Not checked yet
    #[default]
    Unknown,
    /// Marker present and the process is alive
    Ok,
    /// No marker, or the recorded process is gone
    Stopped,
    /// The check itself failed
    Error,
}

/// Severity derived from the tail of the tunnel log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    #[default]
    Ok,
    Warning,
    Error,
}

/// Addresses shown in the topology panel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub public_ip: Option<String>,
    pub local_ip: Option<String>,
}

/// One probe result, targeting exactly one part of the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeReading {
    Upstream(Health),
    Process {
        health: ProcessHealth,
        pid: Option<u32>,
    },
    Downstream(Health),
    Log {
        severity: LogSeverity,
        tail: Vec<String>,
    },
    Network(NetworkInfo),
}

/// Latest published result of every probe.
///
/// Fields update independently; the most recent write wins per field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub upstream: Health,
    pub process: ProcessHealth,
    pub downstream: Health,
    pub log_severity: LogSeverity,
    /// PID reported by the last liveness check
    pub pid: Option<u32>,
    /// Last lines of the tunnel log
    #[serde(skip)]
    pub recent_log: Vec<String>,
    pub network: NetworkInfo,
    /// Time of the last applied reading
    pub updated_at: Option<DateTime<Utc>>,
}

impl HealthSnapshot {
    /// Apply a reading to the field it belongs to.
    pub fn apply(&mut self, reading: ProbeReading) {
        match reading {
            ProbeReading::Upstream(health) => self.upstream = health,
            ProbeReading::Process { health, pid } => {
                self.process = health;
                self.pid = pid;
            }
            ProbeReading::Downstream(health) => self.downstream = health,
            ProbeReading::Log { severity, tail } => {
                self.log_severity = severity;
                self.recent_log = tail;
            }
            ProbeReading::Network(info) => self.network = info,
        }
        self.updated_at = Some(Utc::now());
    }

    /// Check if the tunnel process was last seen alive.
    pub fn is_live(&self) -> bool {
        self.process == ProcessHealth::Ok
    }

    pub fn upstream_label(&self) -> &'static str {
        match self.upstream {
            Health::Unknown => "Checking...",
            Health::Ok => "Connected",
            Health::Error => "Disconnected",
        }
    }

    pub fn process_label(&self) -> &'static str {
        match self.process {
            ProcessHealth::Unknown => "Checking...",
            ProcessHealth::Ok => "Active",
            ProcessHealth::Stopped => "Stopped",
            ProcessHealth::Error => "Error",
        }
    }

    /// Downstream status as seen by an operator.
    ///
    /// Without a live tunnel the local service is cut off from the edge
    /// regardless of what the last probe said.
    pub fn downstream_label(&self) -> &'static str {
        if matches!(
            self.process,
            ProcessHealth::Stopped | ProcessHealth::Error
        ) {
            return "Isolated";
        }
        match self.downstream {
            Health::Unknown => "Checking...",
            Health::Ok => "Reachable",
            Health::Error => "Unreachable",
        }
    }

    pub fn log_label(&self) -> &'static str {
        match self.log_severity {
            LogSeverity::Ok => "Healthy",
            LogSeverity::Warning => "Warnings",
            LogSeverity::Error => "Errors",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unknown() {
        let snapshot = HealthSnapshot::default();
        assert_eq!(snapshot.upstream, Health::Unknown);
        assert_eq!(snapshot.process, ProcessHealth::Unknown);
        assert_eq!(snapshot.downstream, Health::Unknown);
        assert_eq!(snapshot.log_severity, LogSeverity::Ok);
        assert!(snapshot.updated_at.is_none());
    }

    #[test]
    fn test_apply_touches_one_field() {
        let mut snapshot = HealthSnapshot::default();
        snapshot.apply(ProbeReading::Upstream(Health::Error));
        snapshot.apply(ProbeReading::Process {
            health: ProcessHealth::Ok,
            pid: Some(1234),
        });

        assert_eq!(snapshot.upstream, Health::Error);
        assert_eq!(snapshot.process, ProcessHealth::Ok);
        assert_eq!(snapshot.pid, Some(1234));
        assert_eq!(snapshot.downstream, Health::Unknown);
        assert!(snapshot.updated_at.is_some());

        snapshot.apply(ProbeReading::Downstream(Health::Ok));
        assert_eq!(snapshot.upstream, Health::Error);
        assert_eq!(snapshot.downstream, Health::Ok);
    }

    #[test]
    fn test_downstream_isolated_when_stopped() {
        let mut snapshot = HealthSnapshot::default();
        snapshot.apply(ProbeReading::Downstream(Health::Error));
        snapshot.apply(ProbeReading::Process {
            health: ProcessHealth::Stopped,
            pid: None,
        });
        assert_eq!(snapshot.downstream_label(), "Isolated");

        snapshot.apply(ProbeReading::Process {
            health: ProcessHealth::Ok,
            pid: Some(7),
        });
        assert_eq!(snapshot.downstream_label(), "Unreachable");
    }

    #[test]
    fn test_labels() {
        let mut snapshot = HealthSnapshot::default();
        assert_eq!(snapshot.upstream_label(), "Checking...");
        snapshot.apply(ProbeReading::Upstream(Health::Ok));
        assert_eq!(snapshot.upstream_label(), "Connected");
        snapshot.apply(ProbeReading::Log {
            severity: LogSeverity::Warning,
            tail: vec!["WRN retrying".to_string()],
        });
        assert_eq!(snapshot.log_label(), "Warnings");
        assert_eq!(snapshot.recent_log.len(), 1);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(LogSeverity::Error > LogSeverity::Warning);
        assert!(LogSeverity::Warning > LogSeverity::Ok);
    }
}
