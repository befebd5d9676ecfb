//! Lifecycle of the detached tunnel process.
//!
//! The PID marker file, not in-memory state, decides whether a tunnel is
//! running, so a fresh supervisor picks up a tunnel started by an earlier
//! one.

mod launch;
mod marker;
mod process;
mod routes;
mod supervisor;

pub use launch::LaunchSpec;
pub use marker::PidMarker;
pub use process::{is_alive, terminate};
pub use routes::{RouteChange, RouteManager};
pub use supervisor::{Supervisor, SupervisorStatus};
