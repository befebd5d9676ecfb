//! Read-modify-write edits of the ingress list.

use std::sync::{Mutex, PoisonError};
use tracing::info;
use tunnel_core::{IngressRule, TunnelResult};

use crate::ConfigStore;

/// Applies route edits to the stored configuration.
///
/// Each edit loads the file, changes it in memory and writes it back
/// atomically. Edits never restart the tunnel; callers decide that.
#[derive(Debug)]
pub struct ConfigMutator {
    store: ConfigStore,
    lock: Mutex<()>,
}

impl ConfigMutator {
    /// Create a mutator over a store.
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Get the underlying store.
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Current editable routes.
    pub fn routes(&self) -> TunnelResult<Vec<IngressRule>> {
        Ok(self.store.load()?.routes())
    }

    /// Add a route just before the catch-all.
    ///
    /// Returns the refreshed route listing.
    pub fn add_rule(&self, hostname: &str, service: &str) -> TunnelResult<Vec<IngressRule>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut config = self.store.load()?;
        config.insert_route(IngressRule::route(hostname.trim(), service.trim()))?;
        self.store.save(&config)?;

        info!(hostname = hostname.trim(), service = service.trim(), "Route added");
        Ok(config.routes())
    }

    /// Remove the route for a hostname.
    ///
    /// Returns the refreshed route listing.
    pub fn remove_rule(&self, hostname: &str) -> TunnelResult<Vec<IngressRule>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut config = self.store.load()?;
        let removed = config.remove_route(hostname.trim())?;
        self.store.save(&config)?;

        info!(hostname = hostname.trim(), service = %removed.service, "Route removed");
        Ok(config.routes())
    }
}
