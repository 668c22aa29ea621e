//! Plugin-based record store registry
//!
//! The registry maps store type names to factories so the daemon can build
//! a backend from configuration without a hardcoded match.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use minidns_core::registry::StoreRegistry;
//! use minidns_core::config::StoreConfig;
//!
//! let registry = StoreRegistry::with_builtin();
//! let store = registry
//!     .create_store(&StoreConfig::File { path: "/var/lib/minidns/records.json".into() })
//!     .await?;
//! ```
//!
//! ## Registration
//!
//! Out-of-tree backends register themselves under the name used in
//! `StoreConfig::Custom { factory, .. }`:
//!
//! ```rust,ignore
//! pub fn register(registry: &StoreRegistry) {
//!     registry.register_store("sqlite", Box::new(SqliteRecordStoreFactory));
//! }
//! ```

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::store::{FileRecordStoreFactory, MemoryRecordStoreFactory};
use crate::traits::{RecordStore, RecordStoreFactory};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Registry of record store factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct StoreRegistry {
    stores: RwLock<HashMap<String, Arc<dyn RecordStoreFactory>>>,
}

impl StoreRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the "memory" and "file" backends registered
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_store("memory", Box::new(MemoryRecordStoreFactory));
        registry.register_store("file", Box::new(FileRecordStoreFactory));
        registry
    }

    /// Register a record store factory
    ///
    /// Registering an existing name replaces the previous factory.
    ///
    /// # Parameters
    ///
    /// - `name`: Store type name (e.g., "file", "memory")
    /// - `factory`: Factory object for creating store instances
    pub fn register_store(&self, name: impl Into<String>, factory: Box<dyn RecordStoreFactory>) {
        let name = name.into();
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        stores.insert(name, Arc::from(factory));
    }

    /// Create a record store from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn RecordStore>)`: Created store instance
    /// - `Err(Error)`: If the store type is not registered or creation fails
    pub async fn create_store(&self, config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
        let store_type = config.type_name();

        let factory = {
            let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
            stores
                .get(store_type)
                .cloned()
                .ok_or_else(|| Error::config(format!("Unknown record store type: {}", store_type)))?
        };

        // Custom stores receive their own config block; built-ins get the
        // tagged StoreConfig.
        let config_json = match config {
            StoreConfig::Custom { config, .. } => config.clone(),
            other => serde_json::to_value(other)?,
        };

        debug!(store_type, "Creating record store");
        let store = factory.create(&config_json).await?;
        Ok(Arc::from(store))
    }

    /// List all registered store types
    pub fn list_stores(&self) -> Vec<String> {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = stores.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a store type is registered
    pub fn has_store(&self, name: &str) -> bool {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        stores.contains_key(name)
    }
}
