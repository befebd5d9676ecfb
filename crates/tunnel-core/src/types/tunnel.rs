//! Persisted tunnel configuration.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use super::IngressRule;
use crate::error::{TunnelError, TunnelResult};

/// Ingress-routing configuration handed to the tunnel binary.
///
/// The last ingress rule is always the catch-all. Everything before it is
/// an editable route with a unique, non-empty hostname.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TunnelConfig {
    /// Tunnel identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tunnel: Option<String>,
    /// Path to the tunnel credentials JSON
    #[serde(
        rename = "credentials-file",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub credentials_file: Option<PathBuf>,
    /// Ordered ingress rules
    #[serde(default)]
    pub ingress: Vec<IngressRule>,
    /// Top-level keys this tool does not manage
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl TunnelConfig {
    /// Create a configuration with an optional first route and the catch-all.
    pub fn new(
        tunnel_id: impl Into<String>,
        credentials_file: impl Into<PathBuf>,
        first_route: Option<IngressRule>,
    ) -> Self {
        let mut ingress: Vec<IngressRule> = first_route.into_iter().collect();
        ingress.push(IngressRule::catch_all());

        Self {
            tunnel: Some(tunnel_id.into()),
            credentials_file: Some(credentials_file.into()),
            ingress,
            extra: BTreeMap::new(),
        }
    }

    /// Get the tunnel identifier.
    pub fn tunnel_id(&self) -> TunnelResult<&str> {
        match self.tunnel.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(TunnelError::ConfigInvalid("tunnel ID missing".to_string())),
        }
    }

    /// Abbreviated tunnel identifier for display.
    pub fn short_id(&self) -> String {
        match self.tunnel_id() {
            Ok(id) if id.chars().count() > 8 => {
                format!("{}...", id.chars().take(8).collect::<String>())
            }
            Ok(id) => id.to_string(),
            Err(_) => "Unknown".to_string(),
        }
    }

    /// Get the credentials path, verifying it exists on disk.
    pub fn credentials_path(&self) -> TunnelResult<&Path> {
        let path = self
            .credentials_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(TunnelError::MissingCredentials { path: None })?;

        if !path.exists() {
            return Err(TunnelError::MissingCredentials {
                path: Some(path.to_path_buf()),
            });
        }
        Ok(path)
    }

    /// Editable routes, catch-all excluded.
    pub fn routes(&self) -> Vec<IngressRule> {
        self.ingress
            .iter()
            .filter(|r| !r.is_catch_all())
            .cloned()
            .collect()
    }

    /// Find the route for a hostname.
    pub fn find_route(&self, hostname: &str) -> Option<&IngressRule> {
        self.ingress
            .iter()
            .find(|r| r.hostname.as_deref() == Some(hostname))
    }

    /// First route whose service can be probed over HTTP.
    pub fn first_http_service(&self) -> Option<&str> {
        self.ingress
            .iter()
            .find(|r| !r.is_catch_all() && r.is_http())
            .map(|r| r.service.as_str())
    }

    /// Append the catch-all if the list does not already end with one.
    ///
    /// Returns true if the list was changed.
    pub fn ensure_catch_all(&mut self) -> bool {
        match self.ingress.last() {
            Some(last) if last.is_catch_all() => false,
            _ => {
                self.ingress.push(IngressRule::catch_all());
                true
            }
        }
    }

    /// Insert a route immediately before the catch-all.
    pub fn insert_route(&mut self, mut rule: IngressRule) -> TunnelResult<()> {
        let hostname = match rule.hostname.as_deref().map(str::trim) {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => return Err(TunnelError::InvalidRule("hostname is empty".to_string())),
        };
        if rule.service.trim().is_empty() {
            return Err(TunnelError::InvalidRule(format!(
                "service for {} is empty",
                hostname
            )));
        }
        if self.find_route(&hostname).is_some() {
            return Err(TunnelError::DuplicateHostname(hostname));
        }

        rule.service = rule.service.trim().to_string();
        rule.hostname = Some(hostname);

        self.ensure_catch_all();
        let position = self.ingress.len() - 1;
        self.ingress.insert(position, rule);
        Ok(())
    }

    /// Remove the route with exactly this hostname.
    pub fn remove_route(&mut self, hostname: &str) -> TunnelResult<IngressRule> {
        let position = self
            .ingress
            .iter()
            .position(|r| r.hostname.as_deref() == Some(hostname))
            .ok_or_else(|| TunnelError::RouteNotFound(hostname.to_string()))?;

        Ok(self.ingress.remove(position))
    }

    /// Check the structural invariants of the document.
    ///
    /// Credentials are not checked here; that happens at launch time.
    pub fn validate(&self) -> TunnelResult<()> {
        self.tunnel_id()?;

        let Some((last, rules)) = self.ingress.split_last() else {
            return Err(TunnelError::ConfigInvalid(
                "ingress list is empty".to_string(),
            ));
        };
        if !last.is_catch_all() {
            return Err(TunnelError::ConfigInvalid(
                "last ingress rule must be a catch-all without hostname".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (index, rule) in rules.iter().enumerate() {
            if rule.is_catch_all() {
                return Err(TunnelError::ConfigInvalid(format!(
                    "ingress rule {} has no hostname but is not last",
                    index + 1
                )));
            }
            let hostname = rule.display_hostname();
            if !seen.insert(hostname) {
                return Err(TunnelError::ConfigInvalid(format!(
                    "hostname {} appears more than once",
                    hostname
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TunnelConfig {
        TunnelConfig::new(
            "8b0268ab-1111-2222-3333-444455556666",
            "/tmp/creds.json",
            Some(IngressRule::route("app.example.com", "http://localhost:8000")),
        )
    }

    #[test]
    fn test_new_ends_with_catch_all() {
        let config = sample();
        assert_eq!(config.ingress.len(), 2);
        assert!(config.ingress.last().unwrap().is_catch_all());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_routes_hide_catch_all() {
        let config = sample();
        let routes = config.routes();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].hostname.as_deref(), Some("app.example.com"));
    }

    #[test]
    fn test_insert_stores_trimmed_rule() {
        let mut config = sample();
        config
            .insert_route(IngressRule::route("  api.example.com ", " http://localhost:9000\n"))
            .unwrap();

        let rule = config.find_route("api.example.com").unwrap();
        assert_eq!(rule.hostname.as_deref(), Some("api.example.com"));
        assert_eq!(rule.service, "http://localhost:9000");

        let result =
            config.insert_route(IngressRule::route(" api.example.com", "http://localhost:9001"));
        assert!(matches!(result, Err(TunnelError::DuplicateHostname(h)) if h == "api.example.com"));
        assert_eq!(config.routes().len(), 2);
    }

    #[test]
    fn test_insert_before_catch_all() {
        let mut config = sample();
        config
            .insert_route(IngressRule::route("b.example.com", "http://localhost:9000"))
            .unwrap();

        assert_eq!(config.ingress.len(), 3);
        assert_eq!(config.ingress[1].hostname.as_deref(), Some("b.example.com"));
        assert!(config.ingress[2].is_catch_all());
    }

    #[test]
    fn test_insert_restores_missing_catch_all() {
        let mut config = sample();
        config.ingress.pop();

        config
            .insert_route(IngressRule::route("b.example.com", "http://localhost:9000"))
            .unwrap();

        assert!(config.ingress.last().unwrap().is_catch_all());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_insert_duplicate_hostname() {
        let mut config = sample();
        let result =
            config.insert_route(IngressRule::route("app.example.com", "http://localhost:9001"));

        assert!(matches!(result, Err(TunnelError::DuplicateHostname(h)) if h == "app.example.com"));
        assert_eq!(
            config.find_route("app.example.com").unwrap().service,
            "http://localhost:8000"
        );
    }

    #[test]
    fn test_insert_rejects_empty_fields() {
        let mut config = sample();
        assert!(matches!(
            config.insert_route(IngressRule::route("", "http://localhost:1")),
            Err(TunnelError::InvalidRule(_))
        ));
        assert!(matches!(
            config.insert_route(IngressRule::route("c.example.com", " ")),
            Err(TunnelError::InvalidRule(_))
        ));
    }

    #[test]
    fn test_remove_route() {
        let mut config = sample();
        let removed = config.remove_route("app.example.com").unwrap();
        assert_eq!(removed.service, "http://localhost:8000");
        assert_eq!(config.ingress, vec![IngressRule::catch_all()]);

        assert!(matches!(
            config.remove_route("app.example.com"),
            Err(TunnelError::RouteNotFound(_))
        ));
    }

    #[test]
    fn test_tunnel_id_and_short_id() {
        let config = sample();
        assert_eq!(config.short_id(), "8b0268ab...");

        let mut missing = sample();
        missing.tunnel = None;
        assert!(matches!(missing.tunnel_id(), Err(TunnelError::ConfigInvalid(_))));
        assert_eq!(missing.short_id(), "Unknown");
    }

    #[test]
    fn test_credentials_path() {
        let mut config = sample();
        config.credentials_file = None;
        assert!(matches!(
            config.credentials_path(),
            Err(TunnelError::MissingCredentials { path: None })
        ));

        config.credentials_file = Some(PathBuf::from("/definitely/not/here.json"));
        assert!(matches!(
            config.credentials_path(),
            Err(TunnelError::MissingCredentials { path: Some(_) })
        ));

        let creds = tempfile::NamedTempFile::new().unwrap();
        config.credentials_file = Some(creds.path().to_path_buf());
        assert_eq!(config.credentials_path().unwrap(), creds.path());
    }

    #[test]
    fn test_first_http_service() {
        let mut config = sample();
        config
            .insert_route(IngressRule::route("ssh.example.com", "ssh://localhost:22"))
            .unwrap();
        assert_eq!(config.first_http_service(), Some("http://localhost:8000"));

        config.remove_route("app.example.com").unwrap();
        assert_eq!(config.first_http_service(), None);
    }

    #[test]
    fn test_validate_rejects_broken_documents() {
        let mut config = sample();
        config.ingress.pop();
        assert!(config.validate().is_err());

        let mut config = sample();
        config.ingress.insert(0, IngressRule::catch_all());
        assert!(config.validate().is_err());

        let mut config = sample();
        config
            .ingress
            .insert(0, IngressRule::route("app.example.com", "http://localhost:1"));
        assert!(config.validate().is_err());

        let mut config = sample();
        config.ingress.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_shape() {
        let yaml = serde_yaml::to_string(&sample()).unwrap();
        let expected = "tunnel: 8b0268ab-1111-2222-3333-444455556666\n\
                        credentials-file: /tmp/creds.json\n\
                        ingress:\n\
                        - hostname: app.example.com\n  service: http://localhost:8000\n\
                        - service: http_status:404\n";
        assert_eq!(yaml, expected);
    }
}
