//! Tunnel process supervisor.

use serde::Serialize;
use std::fs::File;
use std::path::PathBuf;
use std::process::Child;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use tunnel_config::{ConfigStore, TunnelSettings};
use tunnel_core::{
    ProcessHandle, ProcessMonitor, StopOutcome, TunnelError, TunnelPaths, TunnelResult,
};

use crate::launch::LaunchSpec;
use crate::marker::PidMarker;
use crate::process;

/// Starts, stops and restarts the detached tunnel process.
///
/// Lifecycle operations are serialized; liveness queries are not and
/// never touch the marker.
pub struct Supervisor {
    paths: TunnelPaths,
    settings: TunnelSettings,
    store: ConfigStore,
    marker: PidMarker,
    /// Held for the whole of start, stop and restart. Owns the child we
    /// spawned so it can be reaped.
    ops: Mutex<Option<Child>>,
}

/// Point-in-time view for `status` output.
#[derive(Debug, Clone, Serialize)]
pub struct SupervisorStatus {
    pub running: bool,
    pub pid: Option<u32>,
    /// Marker exists but does not point at our tunnel
    pub stale_marker: bool,
    pub config_present: bool,
    pub config_file: PathBuf,
    pub log_file: PathBuf,
}

impl Supervisor {
    pub fn new(paths: TunnelPaths, settings: TunnelSettings, store: ConfigStore) -> Self {
        let marker = PidMarker::new(&paths.pid_file);
        Self {
            paths,
            settings,
            store,
            marker,
            ops: Mutex::new(None),
        }
    }

    pub fn paths(&self) -> &TunnelPaths {
        &self.paths
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Launch the tunnel in the background.
    pub async fn start(&self) -> TunnelResult<ProcessHandle> {
        let mut slot = self.ops.lock().await;
        self.start_locked(&mut slot)
    }

    /// Stop the tunnel.
    ///
    /// Waits up to the stop timeout for the process to exit, then clears
    /// the marker even if it has not.
    pub async fn stop(&self) -> TunnelResult<StopOutcome> {
        let mut slot = self.ops.lock().await;
        self.stop_locked(&mut slot).await
    }

    /// Stop if running, pause, then start.
    pub async fn restart(&self) -> TunnelResult<ProcessHandle> {
        let mut slot = self.ops.lock().await;
        self.cycle_locked(&mut slot).await
    }

    /// Restart only if the tunnel is running, so it picks up a changed config.
    pub async fn reload(&self) -> TunnelResult<Option<ProcessHandle>> {
        let mut slot = self.ops.lock().await;
        if self.is_running().is_none() {
            debug!("Tunnel not running, nothing to reload");
            return Ok(None);
        }
        self.cycle_locked(&mut slot).await.map(Some)
    }

    pub fn status(&self) -> SupervisorStatus {
        let pid = self.is_running();
        SupervisorStatus {
            running: pid.is_some(),
            pid,
            stale_marker: pid.is_none() && self.marker.exists(),
            config_present: self.store.exists(),
            config_file: self.store.path().to_path_buf(),
            log_file: self.paths.log_file.clone(),
        }
    }

    fn start_locked(&self, slot: &mut Option<Child>) -> TunnelResult<ProcessHandle> {
        match self.liveness() {
            Ok(Some(pid)) => return Err(TunnelError::AlreadyRunning { pid }),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Replacing unreadable PID marker"),
        }
        reap(slot);

        let config = self.store.load()?;
        let spec = LaunchSpec::from_config(&self.settings.binary, self.store.path(), &config)?;

        self.paths.ensure_state_dir()?;
        let log = File::create(&self.paths.log_file)?;
        let mut child = spec
            .command(log)?
            .spawn()
            .map_err(|source| TunnelError::ProcessSpawnFailed {
                binary: spec.binary.clone(),
                source,
            })?;
        let pid = child.id();

        if let Err(e) = self.marker.write(pid) {
            // An unmarked tunnel could never be stopped; take it down again.
            let _ = child.kill();
            let _ = child.wait();
            return Err(e.into());
        }
        *slot = Some(child);

        info!(
            pid,
            tunnel = %spec.tunnel_id,
            log = %self.paths.log_file.display(),
            "Tunnel started"
        );
        Ok(ProcessHandle {
            pid,
            log_path: self.paths.log_file.clone(),
        })
    }

    async fn stop_locked(&self, slot: &mut Option<Child>) -> TunnelResult<StopOutcome> {
        let pid = match self.liveness() {
            Ok(Some(pid)) => pid,
            Ok(None) | Err(_) => {
                if self.marker.exists() {
                    info!(path = %self.marker.path().display(), "Removing stale PID marker");
                    self.marker.clear()?;
                }
                reap(slot);
                return Err(TunnelError::NotRunning);
            }
        };

        process::terminate(pid)?;
        let deadline = Instant::now() + self.settings.stop_timeout();
        let exited = loop {
            if reaped(slot, pid) || !process::is_alive(pid) {
                break true;
            }
            if Instant::now() >= deadline {
                break false;
            }
            tokio::time::sleep(self.settings.stop_poll()).await;
        };

        if exited {
            info!(pid, "Tunnel stopped");
        } else {
            warn!(
                pid,
                timeout = ?self.settings.stop_timeout(),
                "Tunnel still exiting after timeout, clearing marker anyway"
            );
        }
        self.marker.clear()?;
        Ok(StopOutcome { pid, exited })
    }

    async fn cycle_locked(&self, slot: &mut Option<Child>) -> TunnelResult<ProcessHandle> {
        match self.stop_locked(slot).await {
            Ok(_) => tokio::time::sleep(self.settings.restart_delay()).await,
            Err(TunnelError::NotRunning) => {}
            Err(e) => return Err(e),
        }
        self.start_locked(slot)
    }
}

impl ProcessMonitor for Supervisor {
    fn liveness(&self) -> TunnelResult<Option<u32>> {
        let Some(pid) = self.marker.read()? else {
            return Ok(None);
        };

        if process::is_alive(pid) && process::launched_with(pid, self.store.path()) {
            Ok(Some(pid))
        } else {
            Ok(None)
        }
    }
}

/// Collect our previous child if it has exited.
fn reap(slot: &mut Option<Child>) {
    if let Some(child) = slot.as_mut() {
        if !matches!(child.try_wait(), Ok(None)) {
            *slot = None;
        }
    }
}

/// Reap `pid` if it is our child and has exited.
fn reaped(slot: &mut Option<Child>, pid: u32) -> bool {
    match slot.as_mut() {
        Some(child) if child.id() == pid => match child.try_wait() {
            Ok(Some(_)) => {
                *slot = None;
                true
            }
            _ => false,
        },
        _ => false,
    }
}
