//! Core types and traits for the tunnel supervisor.
//!
//! This crate provides the foundational building blocks including:
//! - The persisted tunnel configuration (ingress rules, catch-all handling)
//! - Health snapshot types shared by the probe engine and the dashboard
//! - The explicit path context handed to every component
//! - Core traits for health probes and process liveness

pub mod error;
pub mod fs;
pub mod traits;
pub mod types;

pub use error::{TunnelError, TunnelResult};
pub use traits::*;
pub use types::*;
