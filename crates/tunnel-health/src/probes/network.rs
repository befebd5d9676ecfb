//! Public and local addresses.

use async_trait::async_trait;
use reqwest::Client;
use std::net::IpAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::debug;
use tunnel_core::{NetworkInfo, Probe, ProbeReading};

/// Any routable address works; connecting a UDP socket sends nothing.
const ROUTE_PROBE_ADDR: &str = "8.8.8.8:80";

/// Looks up the machine's public IP and the local address of its
/// default route.
pub struct NetworkProbe {
    client: Client,
    public_ip_url: String,
    timeout: Duration,
    interval: Duration,
}

impl NetworkProbe {
    pub fn new(
        client: Client,
        public_ip_url: impl Into<String>,
        timeout: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            client,
            public_ip_url: public_ip_url.into(),
            timeout,
            interval,
        }
    }

    async fn public_ip(&self) -> Option<String> {
        let fetch = async {
            let response = self
                .client
                .get(&self.public_ip_url)
                .timeout(self.timeout)
                .send()
                .await?
                .error_for_status()?;
            response.text().await
        };

        match tokio::time::timeout(self.timeout, fetch).await {
            Ok(Ok(body)) => parse_ip(&body),
            Ok(Err(e)) => {
                debug!(url = %self.public_ip_url, error = %e, "Public IP lookup failed");
                None
            }
            Err(_) => {
                debug!(url = %self.public_ip_url, "Public IP lookup timed out");
                None
            }
        }
    }
}

/// Local address the OS would use to reach the internet.
pub async fn local_ip() -> Option<String> {
    let socket = UdpSocket::bind("0.0.0.0:0").await.ok()?;
    socket.connect(ROUTE_PROBE_ADDR).await.ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified()).then(|| ip.to_string())
}

fn parse_ip(body: &str) -> Option<String> {
    body.trim().parse::<IpAddr>().ok().map(|ip| ip.to_string())
}

#[async_trait]
impl Probe for NetworkProbe {
    fn name(&self) -> &str {
        "network"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn check(&self) -> ProbeReading {
        let (public_ip, local_ip) = tokio::join!(self.public_ip(), local_ip());
        ProbeReading::Network(NetworkInfo {
            public_ip,
            local_ip,
        })
    }
}
