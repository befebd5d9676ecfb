//! Core data types for the tunnel supervisor.

mod health;
mod ingress;
mod paths;
mod process;
mod tunnel;

pub use health::{Health, HealthSnapshot, LogSeverity, NetworkInfo, ProbeReading, ProcessHealth};
pub use ingress::{IngressRule, CATCH_ALL_SERVICE};
pub use paths::{TunnelPaths, CONFIG_FILE_NAME, LOG_FILE_NAME, PID_FILE_NAME};
pub use process::{ProcessHandle, StopOutcome};
pub use tunnel::TunnelConfig;
