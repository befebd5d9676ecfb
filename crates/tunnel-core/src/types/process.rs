//! Supervised process types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A launched tunnel process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessHandle {
    /// Process identifier recorded in the marker file
    pub pid: u32,
    /// Combined stdout/stderr log
    pub log_path: PathBuf,
}

/// Result of a successful stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopOutcome {
    pub pid: u32,
    /// False when the wait bound expired and the marker was cleared anyway
    pub exited: bool,
}
