//! Ingress rule definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Service of the terminating catch-all rule.
pub const CATCH_ALL_SERVICE: &str = "http_status:404";

/// A single hostname → service mapping.
///
/// Rules are matched first to last; a rule without a hostname matches
/// everything and therefore terminates the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngressRule {
    /// Externally visible hostname (absent on the catch-all)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Local service URL or a sentinel such as `http_status:404`
    #[serde(default)]
    pub service: String,
    /// Keys this tool does not manage (`path`, `originRequest`, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl IngressRule {
    /// Create a route for a hostname.
    pub fn route(hostname: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            hostname: Some(hostname.into()),
            service: service.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Create the terminating catch-all rule.
    pub fn catch_all() -> Self {
        Self {
            hostname: None,
            service: CATCH_ALL_SERVICE.to_string(),
            extra: BTreeMap::new(),
        }
    }

    /// Check if this rule matches every request.
    pub fn is_catch_all(&self) -> bool {
        self.hostname.as_deref().map_or(true, |h| h.trim().is_empty())
    }

    /// Check if the service is an HTTP(S) URL that can be probed.
    pub fn is_http(&self) -> bool {
        let service = self.service.trim_start().to_ascii_lowercase();
        service.starts_with("http://") || service.starts_with("https://")
    }

    /// Hostname, or `*` for the catch-all.
    pub fn display_hostname(&self) -> &str {
        match self.hostname.as_deref() {
            Some(h) if !h.trim().is_empty() => h,
            _ => "*",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_all() {
        let rule = IngressRule::catch_all();
        assert!(rule.is_catch_all());
        assert!(!rule.is_http());
        assert_eq!(rule.display_hostname(), "*");

        let blank = IngressRule::route("  ", "http://localhost:1");
        assert!(blank.is_catch_all());
    }

    #[test]
    fn test_http_detection() {
        assert!(IngressRule::route("a.example.com", "http://localhost:8000").is_http());
        assert!(IngressRule::route("a.example.com", "HTTPS://localhost:8443").is_http());
        assert!(!IngressRule::route("a.example.com", "ssh://localhost:22").is_http());
        assert!(!IngressRule::route("a.example.com", "http_status:404").is_http());
    }

    #[test]
    fn test_catch_all_serializes_without_hostname() {
        let yaml = serde_yaml::to_string(&IngressRule::catch_all()).unwrap();
        assert_eq!(yaml.trim(), "service: http_status:404");
    }

    #[test]
    fn test_unmanaged_keys_survive() {
        let yaml = "hostname: a.example.com\nservice: http://localhost:8000\npath: /api\n";
        let rule: IngressRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rule.extra.len(), 1);
        assert!(serde_yaml::to_string(&rule).unwrap().contains("path: /api"));
    }
}
