//! Probe scheduling and snapshot publication.

use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tunnel_core::{HealthSnapshot, Probe};

/// Runs a set of probes and publishes their readings.
pub struct HealthEngine {
    probes: Vec<Arc<dyn Probe>>,
    tx: Arc<watch::Sender<HealthSnapshot>>,
}

/// Read side of the published snapshot.
#[derive(Clone)]
pub struct HealthBoard {
    rx: watch::Receiver<HealthSnapshot>,
}

impl HealthBoard {
    /// Copy of the latest snapshot. Never waits on a probe.
    pub fn latest(&self) -> HealthSnapshot {
        self.rx.borrow().clone()
    }

    /// Wait until any probe publishes a new reading.
    ///
    /// Returns false once the engine is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

/// Probe tasks started by [`HealthEngine::start`].
pub struct EngineHandle {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    board: HealthBoard,
}

impl EngineHandle {
    pub fn board(&self) -> HealthBoard {
        self.board.clone()
    }

    /// Token that stops every probe task when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop all probes, abandoning checks still in flight.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            let _ = task.await;
        }
        debug!("Health engine stopped");
    }
}

impl HealthEngine {
    pub fn new(probes: Vec<Arc<dyn Probe>>) -> Self {
        let (tx, _rx) = watch::channel(HealthSnapshot::default());
        Self {
            probes,
            tx: Arc::new(tx),
        }
    }

    pub fn board(&self) -> HealthBoard {
        HealthBoard {
            rx: self.tx.subscribe(),
        }
    }

    /// Run every probe once, concurrently, and return the resulting snapshot.
    pub async fn run_once(&self) -> HealthSnapshot {
        let readings = join_all(self.probes.iter().map(|probe| probe.check())).await;
        for reading in readings {
            self.tx.send_modify(|snapshot| snapshot.apply(reading));
        }
        self.tx.borrow().clone()
    }

    /// Schedule every probe on its own interval until cancelled.
    ///
    /// A probe that hangs only delays its own next reading.
    pub fn start(self) -> EngineHandle {
        let cancel = CancellationToken::new();
        let board = self.board();

        let tasks = self
            .probes
            .into_iter()
            .map(|probe| {
                let tx = self.tx.clone();
                let cancel = cancel.clone();
                tokio::spawn(run_probe(probe, tx, cancel))
            })
            .collect::<Vec<_>>();

        info!(probes = tasks.len(), "Health engine started");
        EngineHandle {
            cancel,
            tasks,
            board,
        }
    }
}

async fn run_probe(
    probe: Arc<dyn Probe>,
    tx: Arc<watch::Sender<HealthSnapshot>>,
    cancel: CancellationToken,
) {
    let interval = probe.interval();
    loop {
        let reading = tokio::select! {
            _ = cancel.cancelled() => break,
            reading = probe.check() => reading,
        };
        tx.send_modify(|snapshot| snapshot.apply(reading));

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    debug!(probe = probe.name(), "Probe stopped");
}
