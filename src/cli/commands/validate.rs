//! Validate configuration command.

use anyhow::Result;

use crate::cli::Context;

pub async fn run(ctx: &Context) -> Result<()> {
    let store = ctx.store();
    println!("Validating configuration: {}", store.path().display());

    let result = store.load().and_then(|config| {
        config.validate()?;
        config.credentials_path()?;
        Ok(config)
    });

    match result {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("Tunnel: {}", config.tunnel_id()?);
            if let Some(creds) = &config.credentials_file {
                println!("Credentials: {}", creds.display());
            }
            println!("Routes: {}", config.routes().len());
            println!("Tunnel binary: {}", ctx.settings.tunnel.binary);
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
