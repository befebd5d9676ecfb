//! Read-only process liveness.

use crate::error::TunnelResult;

/// Non-blocking view of whether the supervised process is alive.
pub trait ProcessMonitor: Send + Sync {
    /// Live PID, `None` when stopped, or an error when the check itself failed.
    ///
    /// Must not mutate any state, stale markers included.
    fn liveness(&self) -> TunnelResult<Option<u32>>;

    /// Live PID if the process is running.
    fn is_running(&self) -> Option<u32> {
        self.liveness().ok().flatten()
    }
}
