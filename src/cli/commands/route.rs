//! Route commands.

use anyhow::Result;
use std::sync::Arc;
use tunnel_config::ConfigMutator;
use tunnel_core::IngressRule;
use tunnel_supervisor::{RouteChange, RouteManager};

use crate::cli::{Context, RouteCommand};

pub async fn run(cmd: RouteCommand, ctx: &Context) -> Result<()> {
    let manager = RouteManager::new(
        ConfigMutator::new(ctx.store()),
        Arc::new(ctx.supervisor()),
    );

    match cmd {
        RouteCommand::Add { hostname, service } => {
            let change = manager.add_route(&hostname, &service).await?;
            println!("Added route {} -> {}", hostname.trim(), service.trim());
            print_change(&change);
        }
        RouteCommand::Remove { hostname } => {
            let change = manager.remove_route(&hostname).await?;
            println!("Removed route {}", hostname.trim());
            print_change(&change);
        }
        RouteCommand::List => print_routes(&manager.routes()?),
    }

    Ok(())
}

fn print_change(change: &RouteChange) {
    match &change.restarted {
        Some(handle) => println!("Tunnel restarted to apply the change (PID: {})", handle.pid),
        None => println!("Tunnel is not running; the change applies on next start"),
    }
    println!();
    print_routes(&change.routes);
}

fn print_routes(routes: &[IngressRule]) {
    if routes.is_empty() {
        println!("No routes configured");
        return;
    }

    let width = routes
        .iter()
        .map(|r| r.display_hostname().len())
        .max()
        .unwrap_or(0)
        .max("HOSTNAME".len());

    println!("{:<width$}  SERVICE", "HOSTNAME", width = width);
    for route in routes {
        println!(
            "{:<width$}  {}",
            route.display_hostname(),
            route.service,
            width = width
        );
    }
}
