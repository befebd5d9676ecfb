//! Internet reachability.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use tunnel_core::{Health, Probe, ProbeReading, TunnelError};

/// Checks that a well-known public address answers over HTTP.
///
/// Any response counts, whatever the status code.
pub struct UpstreamProbe {
    client: Client,
    url: String,
    timeout: Duration,
    interval: Duration,
}

impl UpstreamProbe {
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration, interval: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
            interval,
        }
    }
}

#[async_trait]
impl Probe for UpstreamProbe {
    fn name(&self) -> &str {
        "upstream"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn check(&self) -> ProbeReading {
        let request = self.client.get(&self.url).timeout(self.timeout).send();

        let health = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) => {
                debug!(url = %self.url, status = %response.status(), "Upstream reachable");
                Health::Ok
            }
            Ok(Err(e)) => {
                debug!(url = %self.url, error = %e, "Upstream unreachable");
                Health::Error
            }
            Err(_) => {
                let err = TunnelError::ProbeTimeout {
                    probe: self.name().to_string(),
                    after: self.timeout,
                };
                debug!(url = %self.url, error = %err, "Upstream unreachable");
                Health::Error
            }
        };

        ProbeReading::Upstream(health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn http_server(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        format!("http://{}", addr)
    }

    fn probe(url: String, timeout: Duration) -> UpstreamProbe {
        UpstreamProbe::new(Client::new(), url, timeout, Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_reachable() {
        let url = http_server("HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n").await;
        let reading = probe(url, Duration::from_secs(2)).check().await;
        assert_eq!(reading, ProbeReading::Upstream(Health::Ok));
    }

    #[tokio::test]
    async fn test_error_status_still_reachable() {
        let url = http_server("HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\n\r\n").await;
        let reading = probe(url, Duration::from_secs(2)).check().await;
        assert_eq!(reading, ProbeReading::Upstream(Health::Ok));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let _hold = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let started = std::time::Instant::now();
        let reading = probe(url, Duration::from_millis(200)).check().await;
        assert_eq!(reading, ProbeReading::Upstream(Health::Error));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let reading = probe(url, Duration::from_secs(1)).check().await;
        assert_eq!(reading, ProbeReading::Upstream(Health::Error));
    }
}
