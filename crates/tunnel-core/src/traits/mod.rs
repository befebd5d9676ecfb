//! Core traits for the tunnel supervisor.

mod monitor;
mod probe;

pub use monitor::ProcessMonitor;
pub use probe::Probe;
