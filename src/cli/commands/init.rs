//! Init command implementation.

use anyhow::{bail, Result};
use tunnel_core::{IngressRule, TunnelConfig, TunnelError};

use crate::cli::{Context, InitArgs};

pub async fn run(args: InitArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store();
    if store.exists() && !args.force {
        bail!(
            "A configuration already exists at {} (use --force to overwrite, or 'tunnelflare reset')",
            store.path().display()
        );
    }

    if !args.credentials_file.is_file() {
        return Err(TunnelError::MissingCredentials {
            path: Some(args.credentials_file),
        }
        .into());
    }

    let first_route = match (args.hostname, args.service) {
        (Some(hostname), Some(service)) => Some(IngressRule::route(hostname.trim(), service.trim())),
        _ => None,
    };
    let config = TunnelConfig::new(args.tunnel_id.trim(), &args.credentials_file, first_route);

    store.create(&config)?;

    println!("Configuration saved to {}", store.path().display());
    println!("Tunnel: {}", config.short_id());
    for route in config.routes() {
        println!("Route: {} -> {}", route.display_hostname(), route.service);
    }
    println!();
    println!("Start the tunnel with 'tunnelflare start'.");

    Ok(())
}
