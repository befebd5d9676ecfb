//! Status command implementation.

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tunnel_core::{HealthSnapshot, ProcessMonitor};
use tunnel_health::{standard_probes, HealthEngine};
use tunnel_supervisor::SupervisorStatus;

use crate::cli::{commands::dashboard, Context, StatusArgs};

#[derive(Serialize)]
struct StatusReport {
    supervisor: SupervisorStatus,
    tunnel_id: Option<String>,
    health: HealthSnapshot,
    recent_log: Vec<String>,
}

pub async fn run(args: StatusArgs, ctx: &Context) -> Result<()> {
    if !args.once && !args.json {
        return dashboard::run(ctx).await;
    }

    let supervisor = Arc::new(ctx.supervisor());
    let monitor: Arc<dyn ProcessMonitor> = supervisor.clone();
    let engine = HealthEngine::new(standard_probes(&ctx.settings.probes, &ctx.paths, monitor)?);
    let health = engine.run_once().await;

    let report = StatusReport {
        supervisor: supervisor.status(),
        tunnel_id: ctx.store().load().ok().map(|c| c.short_id()),
        recent_log: health.recent_log.iter().rev().take(10).rev().cloned().collect(),
        health,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &StatusReport) {
    let health = &report.health;
    let status = &report.supervisor;

    println!("TunnelFlare status ({})", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    println!();
    match status.pid {
        Some(pid) => println!("Tunnel:      {} (PID: {})", health.process_label(), pid),
        None => println!("Tunnel:      {}", health.process_label()),
    }
    if status.stale_marker {
        println!("             stale PID file; 'tunnelflare stop' removes it");
    }
    println!("Internet:    {}", health.upstream_label());
    println!("Local app:   {}", health.downstream_label());
    println!("Log:         {}", health.log_label());
    println!();
    println!(
        "Tunnel ID:   {}",
        report.tunnel_id.as_deref().unwrap_or("(not configured)")
    );
    println!(
        "Public IP:   {}",
        health.network.public_ip.as_deref().unwrap_or("Unavailable")
    );
    println!(
        "Local IP:    {}",
        health.network.local_ip.as_deref().unwrap_or("Unavailable")
    );
    println!("Config:      {}", status.config_file.display());
    println!("Log file:    {}", status.log_file.display());

    if !report.recent_log.is_empty() {
        println!();
        println!("Recent log:");
        for line in &report.recent_log {
            println!("  {}", line);
        }
    }
}
