//! Health probe trait.

use crate::types::ProbeReading;
use async_trait::async_trait;
use std::time::Duration;

/// An independent health check contributing one part of the snapshot.
///
/// `check` never fails: a probe that cannot reach its target reports a
/// degraded reading instead.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Time between two runs.
    fn interval(&self) -> Duration;

    /// Run the check once.
    async fn check(&self) -> ProbeReading;
}
