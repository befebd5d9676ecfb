//! Reset command implementation.

use anyhow::Result;
use std::io::{self, BufRead, Write};
use tunnel_core::ProcessMonitor;

use crate::cli::{Context, ResetArgs};

pub async fn run(args: ResetArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store();
    if !store.exists() {
        println!("No configuration found at {}", store.path().display());
        return Ok(());
    }

    if let Some(pid) = ctx.supervisor().is_running() {
        println!(
            "Warning: the tunnel is still running (PID: {}); it keeps its current routes until stopped.",
            pid
        );
    }

    if !args.yes && !confirm(&format!("Remove {}?", store.path().display()))? {
        println!("Aborted");
        return Ok(());
    }

    store.remove()?;
    println!("Configuration removed. Run 'tunnelflare init' to set up a tunnel again.");
    Ok(())
}

fn confirm(question: &str) -> io::Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
