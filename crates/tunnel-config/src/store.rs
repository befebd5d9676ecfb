//! On-disk tunnel configuration.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tunnel_core::fs::write_atomic;
use tunnel_core::{TunnelConfig, TunnelError, TunnelPaths, TunnelResult};

/// Owner read/write only: the document references credential files.
const CONFIG_MODE: u32 = 0o600;

/// Reads and writes the YAML tunnel configuration.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Create a store for a config file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store for the config file of a paths context.
    pub fn from_paths(paths: &TunnelPaths) -> Self {
        Self::new(&paths.config_file)
    }

    /// Get the config file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if a configuration has been written.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the configuration.
    pub fn load(&self) -> TunnelResult<TunnelConfig> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(TunnelError::ConfigMissing {
                    path: self.path.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        serde_yaml::from_str(&contents).map_err(|e| {
            TunnelError::ConfigInvalid(format!("{}: {}", self.path.display(), e))
        })
    }

    /// Persist the configuration atomically.
    pub fn save(&self, config: &TunnelConfig) -> TunnelResult<()> {
        let contents = serde_yaml::to_string(config)?;
        write_atomic(&self.path, contents.as_bytes(), CONFIG_MODE)?;
        debug!(path = %self.path.display(), bytes = contents.len(), "Configuration written");
        Ok(())
    }

    /// Validate and write a fresh configuration.
    pub fn create(&self, config: &TunnelConfig) -> TunnelResult<()> {
        config.validate()?;
        self.save(config)?;
        info!(path = %self.path.display(), "Configuration saved");
        Ok(())
    }

    /// Delete the configuration file.
    ///
    /// Returns false if there was nothing to delete.
    pub fn remove(&self) -> TunnelResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Configuration removed");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
