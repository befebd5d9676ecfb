//! Route edits that take effect on the running tunnel.

use serde::Serialize;
use std::sync::Arc;
use tunnel_config::ConfigMutator;
use tunnel_core::{IngressRule, ProcessHandle, TunnelResult};

use crate::Supervisor;

/// Result of a route edit.
#[derive(Debug, Clone, Serialize)]
pub struct RouteChange {
    /// Routes after the edit, catch-all excluded
    pub routes: Vec<IngressRule>,
    /// New process if a running tunnel was restarted to apply the edit
    pub restarted: Option<ProcessHandle>,
}

/// Persists a route edit, then restarts the tunnel if it was running.
///
/// A failed edit leaves the tunnel alone.
pub struct RouteManager {
    mutator: ConfigMutator,
    supervisor: Arc<Supervisor>,
}

impl RouteManager {
    pub fn new(mutator: ConfigMutator, supervisor: Arc<Supervisor>) -> Self {
        Self {
            mutator,
            supervisor,
        }
    }

    pub fn routes(&self) -> TunnelResult<Vec<IngressRule>> {
        self.mutator.routes()
    }

    pub async fn add_route(&self, hostname: &str, service: &str) -> TunnelResult<RouteChange> {
        let routes = self.mutator.add_rule(hostname, service)?;
        let restarted = self.supervisor.reload().await?;
        Ok(RouteChange { routes, restarted })
    }

    pub async fn remove_route(&self, hostname: &str) -> TunnelResult<RouteChange> {
        let routes = self.mutator.remove_rule(hostname)?;
        let restarted = self.supervisor.reload().await?;
        Ok(RouteChange { routes, restarted })
    }
}
