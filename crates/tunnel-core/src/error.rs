//! Error types for the tunnel supervisor.

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Top-level tunnel supervisor error.
#[derive(Error, Debug)]
pub enum TunnelError {
    #[error("No configuration file found at {}", .path.display())]
    ConfigMissing { path: PathBuf },

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Credentials file {}", describe_credentials(.path.as_deref()))]
    MissingCredentials { path: Option<PathBuf> },

    #[error("Tunnel is already running (PID: {pid})")]
    AlreadyRunning { pid: u32 },

    #[error("Tunnel is not running")]
    NotRunning,

    #[error("Hostname already routed: {0}")]
    DuplicateHostname(String),

    #[error("No route for hostname: {0}")]
    RouteNotFound(String),

    #[error("Invalid route: {0}")]
    InvalidRule(String),

    #[error("{probe} probe timed out after {after:?}")]
    ProbeTimeout { probe: String, after: Duration },

    #[error("Failed to launch {binary}: {source}")]
    ProcessSpawnFailed {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TunnelError {
    /// Operator-facing hint describing how to get out of this error.
    pub fn remediation(&self) -> Option<String> {
        let hint = match self {
            TunnelError::ConfigMissing { .. } => {
                "Run 'tunnelflare init' to create a new tunnel configuration.".to_string()
            }
            TunnelError::ConfigInvalid(_) => {
                "Your configuration file seems corrupted. Run 'tunnelflare reset' and set the tunnel up again."
                    .to_string()
            }
            TunnelError::MissingCredentials { path } => credentials_hint(path.as_deref()),
            TunnelError::AlreadyRunning { .. } => {
                "Use 'tunnelflare stop' to stop it first, or 'tunnelflare restart'.".to_string()
            }
            TunnelError::NotRunning => "Start it with 'tunnelflare start'.".to_string(),
            TunnelError::DuplicateHostname(host) => format!(
                "Remove the existing route first with 'tunnelflare route remove {}'.",
                host
            ),
            TunnelError::RouteNotFound(_) => {
                "List configured routes with 'tunnelflare route list'.".to_string()
            }
            TunnelError::InvalidRule(_) => {
                "Provide both a hostname (e.g. app.example.com) and a local service (e.g. http://localhost:8000)."
                    .to_string()
            }
            TunnelError::ProcessSpawnFailed { binary, .. } => format!(
                "Make sure '{}' is installed and on PATH, or point tunnel.binary at it in settings.",
                binary
            ),
            TunnelError::ProbeTimeout { .. }
            | TunnelError::Io(_)
            | TunnelError::Serialization(_) => return None,
        };
        Some(hint)
    }
}

fn describe_credentials(path: Option<&Path>) -> String {
    match path {
        Some(path) => format!("not found at {}", path.display()),
        None => "not defined in configuration".to_string(),
    }
}

fn credentials_hint(path: Option<&Path>) -> String {
    let under_root = path.map(|p| p.starts_with("/root")).unwrap_or(false);
    if under_root && !running_as_root() {
        "The configuration points to a file in /root but you are not running as root. \
         This usually happens when setup was run with sudo. \
         Run 'tunnelflare reset' and set the tunnel up again without sudo."
            .to_string()
    } else {
        "Your tunnel credentials seem to be missing. \
         Run 'tunnelflare reset' and set the tunnel up again to regenerate them."
            .to_string()
    }
}

#[cfg(unix)]
fn running_as_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn running_as_root() -> bool {
    false
}

impl From<serde_yaml::Error> for TunnelError {
    fn from(err: serde_yaml::Error) -> Self {
        TunnelError::Serialization(err.to_string())
    }
}

/// Result type alias for tunnel operations.
pub type TunnelResult<T> = Result<T, TunnelError>;
