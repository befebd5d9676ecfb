//! Start, stop and restart commands.

use anyhow::Result;
use tunnel_core::{ProcessHandle, TunnelError};

use crate::cli::Context;

fn print_started(handle: &ProcessHandle) {
    println!("Tunnel started (PID: {})", handle.pid);
    println!("Logs: {}", handle.log_path.display());
}

pub async fn start(ctx: &Context) -> Result<()> {
    let handle = ctx.supervisor().start().await?;
    print_started(&handle);
    Ok(())
}

pub async fn stop(ctx: &Context) -> Result<()> {
    match ctx.supervisor().stop().await {
        Ok(outcome) if outcome.exited => {
            println!("Tunnel stopped (PID: {})", outcome.pid);
        }
        Ok(outcome) => {
            println!(
                "Tunnel (PID: {}) did not exit within {:?}; it was signalled and its PID file removed",
                outcome.pid,
                ctx.settings.tunnel.stop_timeout()
            );
        }
        Err(TunnelError::NotRunning) => println!("Tunnel is not running"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

pub async fn restart(ctx: &Context) -> Result<()> {
    let handle = ctx.supervisor().restart().await?;
    print_started(&handle);
    Ok(())
}
