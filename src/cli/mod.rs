//! CLI definitions.

pub mod commands;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tunnel_config::{load_settings, ConfigStore, Settings, DEFAULT_SETTINGS_FILE};
use tunnel_core::TunnelPaths;
use tunnel_supervisor::Supervisor;

#[derive(Parser)]
#[command(name = "tunnelflare")]
#[command(author, version, about = "Run and watch a cloudflared tunnel")]
pub struct Cli {
    /// Settings file (TOML)
    #[arg(long, env = "TUNNELFLARE_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// State directory holding config.yml, tunnel.pid and tunnel.log
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the tunnel configuration
    Init(InitArgs),
    /// Start the tunnel in the background
    Start,
    /// Stop the tunnel
    Stop,
    /// Restart the tunnel
    Restart,
    /// Show tunnel health (live dashboard unless --once)
    Status(StatusArgs),
    /// Manage ingress routes
    #[command(subcommand)]
    Route(RouteCommand),
    /// Validate the tunnel configuration
    ValidateConfig,
    /// Remove the tunnel configuration
    Reset(ResetArgs),
    /// Print the effective settings
    Settings,
}

impl Commands {
    /// Whether the command takes over the terminal.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Commands::Status(args) if !args.once && !args.json)
    }
}

#[derive(clap::Args)]
pub struct InitArgs {
    /// Tunnel UUID
    #[arg(long)]
    pub tunnel_id: String,

    /// Credentials JSON written by `cloudflared tunnel create`
    #[arg(long)]
    pub credentials_file: PathBuf,

    /// Public hostname of the first route
    #[arg(long, requires = "service")]
    pub hostname: Option<String>,

    /// Local service of the first route (e.g. http://localhost:8000)
    #[arg(long, requires = "hostname")]
    pub service: Option<String>,

    /// Overwrite an existing configuration
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args)]
pub struct StatusArgs {
    /// Run every probe once and print the result
    #[arg(long)]
    pub once: bool,

    /// Print JSON instead of text (implies --once)
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum RouteCommand {
    /// Route a hostname to a local service
    Add {
        /// Public hostname (e.g. app.example.com)
        hostname: String,
        /// Local service (e.g. http://localhost:8000)
        service: String,
    },
    /// Remove the route for a hostname
    Remove {
        hostname: String,
    },
    /// List configured routes
    List,
}

#[derive(clap::Args)]
pub struct ResetArgs {
    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Settings and paths shared by every command.
pub struct Context {
    pub settings: Settings,
    pub paths: TunnelPaths,
}

impl Context {
    pub fn load(cli: &Cli) -> Result<Self> {
        let settings_file = cli.settings.clone().or_else(|| {
            cli.state_dir
                .as_ref()
                .map(|dir| dir.join(DEFAULT_SETTINGS_FILE))
                .filter(|file| file.is_file())
        });

        let mut settings = load_settings(settings_file.as_deref())
            .context("Failed to load settings")?;
        if let Some(state_dir) = &cli.state_dir {
            settings.paths.state_dir = state_dir.clone();
        }
        if let Some(level) = cli.log_level {
            settings.logging.level = level.as_str().to_string();
        }
        if cli.json_logs {
            settings.logging.format = "json".to_string();
        }

        let paths = settings.paths().canonicalize().with_context(|| {
            format!(
                "Failed to prepare state directory {}",
                settings.paths.state_dir.display()
            )
        })?;
        Ok(Self { settings, paths })
    }

    pub fn store(&self) -> ConfigStore {
        ConfigStore::from_paths(&self.paths)
    }

    pub fn supervisor(&self) -> Supervisor {
        Supervisor::new(self.paths.clone(), self.settings.tunnel.clone(), self.store())
    }
}
