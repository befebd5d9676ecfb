//! Two-field route form.

use crossterm::event::{KeyCode, KeyEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Hostname,
    Service,
}

/// What a key press did to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Editing,
    Submit { hostname: String, service: String },
    Cancel,
}

/// Hostname and service inputs for a new route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteForm {
    pub hostname: String,
    pub service: String,
    pub focus: Field,
    /// Shown under the inputs after a rejected submit
    pub error: Option<String>,
}

impl Default for RouteForm {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            service: "http://localhost:".to_string(),
            focus: Field::Hostname,
            error: None,
        }
    }
}

impl RouteForm {
    pub fn new() -> Self {
        Self::default()
    }

    fn focused(&mut self) -> &mut String {
        match self.focus {
            Field::Hostname => &mut self.hostname,
            Field::Service => &mut self.service,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Field::Hostname => Field::Service,
            Field::Service => Field::Hostname,
        };
    }

    /// Apply a key press.
    ///
    /// Enter on the hostname moves to the service; Enter on the service
    /// submits once both fields are filled.
    pub fn handle_key(&mut self, key: KeyEvent) -> FormOutcome {
        match key.code {
            KeyCode::Esc => return FormOutcome::Cancel,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => self.toggle_focus(),
            KeyCode::Backspace => {
                self.focused().pop();
            }
            KeyCode::Char(c) if !c.is_whitespace() => {
                self.focused().push(c);
                self.error = None;
            }
            KeyCode::Enter if self.focus == Field::Hostname => self.focus = Field::Service,
            KeyCode::Enter => {
                let hostname = self.hostname.trim();
                let service = self.service.trim();
                if hostname.is_empty() || service.is_empty() {
                    self.error = Some("Both hostname and service are required".to_string());
                } else {
                    return FormOutcome::Submit {
                        hostname: hostname.to_string(),
                        service: service.to_string(),
                    };
                }
            }
            _ => {}
        }
        FormOutcome::Editing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(form: &mut RouteForm, code: KeyCode) -> FormOutcome {
        form.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(form: &mut RouteForm, text: &str) {
        for c in text.chars() {
            press(form, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_fill_and_submit() {
        let mut form = RouteForm::new();
        type_text(&mut form, "app.example.com");
        assert_eq!(press(&mut form, KeyCode::Enter), FormOutcome::Editing);
        assert_eq!(form.focus, Field::Service);

        type_text(&mut form, "8000");
        assert_eq!(
            press(&mut form, KeyCode::Enter),
            FormOutcome::Submit {
                hostname: "app.example.com".to_string(),
                service: "http://localhost:8000".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_hostname_rejected() {
        let mut form = RouteForm::new();
        press(&mut form, KeyCode::Tab);
        assert_eq!(press(&mut form, KeyCode::Enter), FormOutcome::Editing);
        assert!(form.error.is_some());
    }

    #[test]
    fn test_backspace_and_cancel() {
        let mut form = RouteForm::new();
        type_text(&mut form, "abc");
        press(&mut form, KeyCode::Backspace);
        assert_eq!(form.hostname, "ab");
        assert_eq!(press(&mut form, KeyCode::Esc), FormOutcome::Cancel);
    }
}
