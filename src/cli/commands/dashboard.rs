//! Live dashboard and the controller behind its keys.

use anyhow::Result;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};
use tunnel_config::{ConfigMutator, ConfigStore};
use tunnel_core::{ProcessMonitor, TunnelError};
use tunnel_health::{standard_probes, HealthEngine};
use tunnel_monitor::{Dashboard, DashboardAction, DashboardState, Notice};
use tunnel_supervisor::{RouteManager, Supervisor};

use crate::cli::Context;

type SharedState = Arc<Mutex<DashboardState>>;

/// How often the route list is re-read for edits made elsewhere.
const CONFIG_REFRESH: Duration = Duration::from_secs(2);

pub async fn run(ctx: &Context) -> Result<()> {
    let supervisor = Arc::new(ctx.supervisor());
    let monitor: Arc<dyn ProcessMonitor> = supervisor.clone();
    let engine = HealthEngine::new(standard_probes(&ctx.settings.probes, &ctx.paths, monitor)?);
    let engine = engine.start();
    let board = engine.board();

    let shared: SharedState = Arc::new(Mutex::new(DashboardState::default()));
    refresh_config(&shared, &ctx.store());

    let (tx, rx) = mpsc::unbounded_channel();
    let controller = tokio::spawn(Controller {
        supervisor: supervisor.clone(),
        routes: RouteManager::new(ConfigMutator::new(ctx.store()), supervisor),
        store: ctx.store(),
        shared: shared.clone(),
    }
    .run(rx));

    info!("Dashboard started");
    let dashboard = Dashboard::new(ctx.settings.dashboard.refresh_ms);
    let ui = tokio::task::spawn_blocking(move || {
        dashboard.run(
            move || {
                let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner).clone();
                state.health = board.latest();
                state
            },
            tx,
        )
    })
    .await?;

    engine.shutdown().await;
    // The sender is gone with the dashboard; let an in-flight operation finish.
    controller.await?;
    info!("Dashboard closed");

    ui.map_err(Into::into)
}

fn with_state(shared: &SharedState, f: impl FnOnce(&mut DashboardState)) {
    let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut state);
}

fn refresh_config(shared: &SharedState, store: &ConfigStore) {
    let config = store.load().ok();
    with_state(shared, |state| {
        state.tunnel_id = config.as_ref().map(|c| c.short_id());
        state.routes = config.map(|c| c.routes()).unwrap_or_default();
    });
}

fn failure_notice(err: &TunnelError) -> Notice {
    match err.remediation() {
        Some(hint) => Notice::error(format!("{} ({})", err, hint)),
        None => Notice::error(err.to_string()),
    }
}

/// Runs dashboard actions one at a time and posts the outcome back.
struct Controller {
    supervisor: Arc<Supervisor>,
    routes: RouteManager,
    store: ConfigStore,
    shared: SharedState,
}

impl Controller {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<DashboardAction>) {
        let mut refresh = tokio::time::interval(CONFIG_REFRESH);
        loop {
            tokio::select! {
                action = rx.recv() => match action {
                    Some(action) => self.handle(action).await,
                    None => break,
                },
                _ = refresh.tick() => refresh_config(&self.shared, &self.store),
            }
        }
    }

    async fn handle(&self, action: DashboardAction) {
        let busy = match &action {
            DashboardAction::Toggle if self.supervisor.is_running().is_some() => "Stopping...",
            DashboardAction::Toggle => "Starting...",
            DashboardAction::Restart => "Restarting...",
            DashboardAction::AddRoute { .. } => "Adding route...",
            DashboardAction::RemoveRoute { .. } => "Removing route...",
        };
        with_state(&self.shared, |state| state.busy = Some(busy.to_string()));

        let notice = match self.execute(action).await {
            Ok(notice) => notice,
            Err(e) => {
                error!(error = %e, "Dashboard action failed");
                failure_notice(&e)
            }
        };

        refresh_config(&self.shared, &self.store);
        with_state(&self.shared, |state| {
            state.busy = None;
            state.push_notice(notice);
        });
    }

    async fn execute(&self, action: DashboardAction) -> Result<Notice, TunnelError> {
        match action {
            DashboardAction::Toggle => match self.supervisor.is_running() {
                Some(_) => {
                    let outcome = self.supervisor.stop().await?;
                    Ok(Notice::info(format!("Tunnel stopped (PID: {})", outcome.pid)))
                }
                None => {
                    let handle = self.supervisor.start().await?;
                    Ok(Notice::info(format!("Tunnel started (PID: {})", handle.pid)))
                }
            },
            DashboardAction::Restart => {
                let verb = match self.supervisor.is_running() {
                    Some(_) => "restarted",
                    None => "started",
                };
                let handle = self.supervisor.restart().await?;
                Ok(Notice::info(format!("Tunnel {} (PID: {})", verb, handle.pid)))
            }
            DashboardAction::AddRoute { hostname, service } => {
                let change = self.routes.add_route(&hostname, &service).await?;
                Ok(Notice::info(route_message(
                    format!("Added {} -> {}", hostname, service),
                    change.restarted.is_some(),
                )))
            }
            DashboardAction::RemoveRoute { hostname } => {
                let change = self.routes.remove_route(&hostname).await?;
                Ok(Notice::info(route_message(
                    format!("Removed {}", hostname),
                    change.restarted.is_some(),
                )))
            }
        }
    }
}

fn route_message(done: String, restarted: bool) -> String {
    if restarted {
        format!("{}; tunnel restarted", done)
    } else {
        done
    }
}
