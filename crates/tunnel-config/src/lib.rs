//! Tunnel configuration store and application settings.

mod mutator;
mod settings;
mod store;

pub use mutator::ConfigMutator;
pub use settings::{
    DashboardSettings, LoggingSettings, PathSettings, ProbeSettings, Settings, TunnelSettings,
};
pub use store::ConfigStore;

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Settings file looked up when none is given explicitly.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.toml";

/// Load settings from an optional file and the environment.
///
/// Without an explicit path, `settings.toml` in the default state directory
/// is read if it exists. `TUNNELFLARE__<SECTION>__<KEY>` variables win over
/// both.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::from(PathSettings::default_state_dir().join(DEFAULT_SETTINGS_FILE))
            .required(false),
    };

    let config = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix("TUNNELFLARE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}
