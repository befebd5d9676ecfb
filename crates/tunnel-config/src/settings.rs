//! Settings structures.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tunnel_core::TunnelPaths;

/// Main application settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub tunnel: TunnelSettings,
    #[serde(default)]
    pub probes: ProbeSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Paths context for every component.
    pub fn paths(&self) -> TunnelPaths {
        let paths = TunnelPaths::new(&self.paths.state_dir);
        match &self.paths.config_file {
            Some(config_file) => paths.with_config_file(config_file),
            None => paths,
        }
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Directory holding the config, PID marker and log
    pub state_dir: PathBuf,
    /// Tunnel config outside the state directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

impl PathSettings {
    /// `~/.tunnelflare`, or `./.tunnelflare` without a home directory.
    pub fn default_state_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tunnelflare")
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            state_dir: Self::default_state_dir(),
            config_file: None,
        }
    }
}

/// Supervised process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelSettings {
    /// Tunnel binary, looked up on PATH unless absolute
    pub binary: String,
    /// Upper bound on waiting for a stopped process to exit
    pub stop_timeout_ms: u64,
    /// Liveness poll interval while stopping
    pub stop_poll_ms: u64,
    /// Pause between stop and start on restart
    pub restart_delay_ms: u64,
}

impl TunnelSettings {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn stop_poll(&self) -> Duration {
        Duration::from_millis(self.stop_poll_ms.max(1))
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

impl Default for TunnelSettings {
    fn default() -> Self {
        Self {
            binary: "cloudflared".to_string(),
            stop_timeout_ms: 5000,
            stop_poll_ms: 100,
            restart_delay_ms: 2000,
        }
    }
}

/// Health probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Well-known address used to check internet reachability
    pub upstream_url: String,
    pub upstream_timeout_ms: u64,
    pub downstream_timeout_ms: u64,
    /// Echo service returning the public IP as plain text
    pub public_ip_url: String,
    /// Cadence of the network-bound probes
    pub slow_interval_secs: u64,
    pub process_interval_secs: u64,
    pub log_interval_secs: u64,
    pub network_interval_secs: u64,
    /// Bytes read from the end of the tunnel log per scan
    pub log_tail_bytes: u64,
    /// Lines of that window kept for display
    pub log_tail_lines: usize,
}

impl ProbeSettings {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn downstream_timeout(&self) -> Duration {
        Duration::from_millis(self.downstream_timeout_ms)
    }

    pub fn slow_interval(&self) -> Duration {
        Duration::from_secs(self.slow_interval_secs.max(1))
    }

    pub fn process_interval(&self) -> Duration {
        Duration::from_secs(self.process_interval_secs.max(1))
    }

    pub fn log_interval(&self) -> Duration {
        Duration::from_secs(self.log_interval_secs.max(1))
    }

    pub fn network_interval(&self) -> Duration {
        Duration::from_secs(self.network_interval_secs.max(1))
    }
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            upstream_url: "https://1.1.1.1".to_string(),
            upstream_timeout_ms: 2000,
            downstream_timeout_ms: 1000,
            public_ip_url: "https://ifconfig.me".to_string(),
            slow_interval_secs: 10,
            process_interval_secs: 1,
            log_interval_secs: 3,
            network_interval_secs: 60,
            log_tail_bytes: 2000,
            log_tail_lines: 200,
        }
    }
}

/// Dashboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Render period in milliseconds
    pub refresh_ms: u64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self { refresh_ms: 250 }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_cadences() {
        let settings = Settings::default();
        assert_eq!(settings.probes.upstream_timeout(), Duration::from_secs(2));
        assert_eq!(settings.probes.downstream_timeout(), Duration::from_secs(1));
        assert!(settings.probes.slow_interval() > settings.probes.process_interval());
        assert!(Duration::from_millis(settings.dashboard.refresh_ms) < Duration::from_secs(1));
    }

    #[test]
    fn test_paths_context() {
        let mut settings = Settings::default();
        settings.paths.state_dir = PathBuf::from("/srv/tunnel");
        let paths = settings.paths();
        assert_eq!(paths.pid_file, PathBuf::from("/srv/tunnel/tunnel.pid"));

        settings.paths.config_file = Some(PathBuf::from("/etc/tunnel/config.yml"));
        assert_eq!(
            settings.paths().config_file,
            PathBuf::from("/etc/tunnel/config.yml")
        );
    }

    #[test]
    fn test_to_toml() {
        let rendered = Settings::default().to_toml().unwrap();
        assert!(rendered.contains("[probes]"));
        assert!(rendered.contains("binary = \"cloudflared\""));
    }
}
