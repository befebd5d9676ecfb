//! Probe implementations.

mod downstream;
mod log;
mod network;
mod process;
mod upstream;

pub use downstream::DownstreamProbe;
pub use log::{classify_line, read_tail, scan_tail, LogProbe};
pub use network::NetworkProbe;
pub use process::ProcessProbe;
pub use upstream::UpstreamProbe;

use reqwest::Client;
use std::sync::Arc;
use tunnel_config::{ConfigStore, ProbeSettings};
use tunnel_core::{Probe, ProcessMonitor, TunnelError, TunnelPaths, TunnelResult};

/// Shared HTTP client for the network-bound probes.
pub fn http_client() -> TunnelResult<Client> {
    Client::builder()
        .user_agent(concat!("tunnelflare/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| TunnelError::Io(std::io::Error::other(e)))
}

/// The full probe set behind the dashboard and `status`.
pub fn standard_probes(
    settings: &ProbeSettings,
    paths: &TunnelPaths,
    monitor: Arc<dyn ProcessMonitor>,
) -> TunnelResult<Vec<Arc<dyn Probe>>> {
    let client = http_client()?;

    Ok(vec![
        Arc::new(UpstreamProbe::new(
            client.clone(),
            &settings.upstream_url,
            settings.upstream_timeout(),
            settings.slow_interval(),
        )),
        Arc::new(ProcessProbe::new(monitor, settings.process_interval())),
        Arc::new(DownstreamProbe::new(
            client.clone(),
            ConfigStore::from_paths(paths),
            settings.downstream_timeout(),
            settings.slow_interval(),
        )),
        Arc::new(LogProbe::new(
            &paths.log_file,
            settings.log_tail_bytes,
            settings.log_tail_lines,
            settings.log_interval(),
        )),
        Arc::new(NetworkProbe::new(
            client,
            &settings.public_ip_url,
            settings.upstream_timeout(),
            settings.network_interval(),
        )),
    ])
}
