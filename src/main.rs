//! Tunnel supervisor CLI application.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, Context};
use std::process::ExitCode;
use tunnel_core::TunnelError;
use tunnel_monitor::{setup_file_logging, setup_logging};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::load(&cli)?;

    // Setup logging; the dashboard owns the terminal so it logs to a file
    let level = ctx.settings.logging.level.clone();
    let _guard = if cli.command.is_interactive() {
        Some(setup_file_logging(&level, &ctx.paths.state_dir)?)
    } else {
        setup_logging(&level, ctx.settings.logging.format == "json");
        None
    };

    // Execute command
    match cli.command {
        Commands::Init(args) => cli::commands::init::run(args, &ctx).await,
        Commands::Start => cli::commands::lifecycle::start(&ctx).await,
        Commands::Stop => cli::commands::lifecycle::stop(&ctx).await,
        Commands::Restart => cli::commands::lifecycle::restart(&ctx).await,
        Commands::Status(args) => cli::commands::status::run(args, &ctx).await,
        Commands::Route(cmd) => cli::commands::route::run(cmd, &ctx).await,
        Commands::ValidateConfig => cli::commands::validate::run(&ctx).await,
        Commands::Reset(args) => cli::commands::reset::run(args, &ctx).await,
        Commands::Settings => cli::commands::settings::run(&ctx).await,
    }
}

/// Print an error with its remediation hint, if there is one.
fn report(err: &anyhow::Error) {
    eprintln!("Error: {}", err);
    for cause in err.chain().skip(1) {
        eprintln!("  caused by: {}", cause);
    }

    if let Some(hint) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<TunnelError>())
        .and_then(TunnelError::remediation)
    {
        eprintln!();
        eprintln!("Hint: {}", hint);
    }
}
