//! Supervised process liveness.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tunnel_core::{Probe, ProbeReading, ProcessHealth, ProcessMonitor};

/// Reports whether the supervised tunnel is alive, and its PID.
pub struct ProcessProbe {
    monitor: Arc<dyn ProcessMonitor>,
    interval: Duration,
}

impl ProcessProbe {
    pub fn new(monitor: Arc<dyn ProcessMonitor>, interval: Duration) -> Self {
        Self { monitor, interval }
    }
}

#[async_trait]
impl Probe for ProcessProbe {
    fn name(&self) -> &str {
        "process"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn check(&self) -> ProbeReading {
        match self.monitor.liveness() {
            Ok(Some(pid)) => ProbeReading::Process {
                health: ProcessHealth::Ok,
                pid: Some(pid),
            },
            Ok(None) => ProbeReading::Process {
                health: ProcessHealth::Stopped,
                pid: None,
            },
            Err(e) => {
                warn!(error = %e, "Liveness check failed");
                ProbeReading::Process {
                    health: ProcessHealth::Error,
                    pid: None,
                }
            }
        }
    }
}
