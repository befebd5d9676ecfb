//! Local service reachability.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use tunnel_config::ConfigStore;
use tunnel_core::{Health, Probe, ProbeReading, TunnelError};

/// Checks that the first HTTP service behind the tunnel answers.
///
/// Without a configuration or an HTTP route there is nothing to check,
/// which reads as healthy.
pub struct DownstreamProbe {
    client: Client,
    store: ConfigStore,
    timeout: Duration,
    interval: Duration,
}

impl DownstreamProbe {
    pub fn new(client: Client, store: ConfigStore, timeout: Duration, interval: Duration) -> Self {
        Self {
            client,
            store,
            timeout,
            interval,
        }
    }

    /// Service URL to probe, re-read every run so route edits apply.
    fn target(&self) -> Result<Option<String>, TunnelError> {
        match self.store.load() {
            Ok(config) => Ok(config.first_http_service().map(str::to_string)),
            Err(TunnelError::ConfigMissing { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Probe for DownstreamProbe {
    fn name(&self) -> &str {
        "downstream"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn check(&self) -> ProbeReading {
        let url = match self.target() {
            Ok(Some(url)) => url,
            Ok(None) => return ProbeReading::Downstream(Health::Ok),
            Err(e) => {
                debug!(error = %e, "Cannot read routes for downstream check");
                return ProbeReading::Downstream(Health::Error);
            }
        };

        let request = self.client.get(&url).timeout(self.timeout).send();
        let health = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(_)) => Health::Ok,
            Ok(Err(e)) => {
                debug!(%url, error = %e, "Local service unreachable");
                Health::Error
            }
            Err(_) => {
                debug!(%url, timeout = ?self.timeout, "Local service timed out");
                Health::Error
            }
        };

        ProbeReading::Downstream(health)
    }
}
