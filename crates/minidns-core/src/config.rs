//! Configuration types for minidns
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

use crate::validate::MAX_CNAME_CHAIN_LENGTH;

/// Upper bound accepted for `ServiceConfig::max_cname_depth`
pub const MAX_CONFIGURABLE_DEPTH: usize = 64;

/// Main minidns configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MiniDnsConfig {
    /// Record store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Write path and resolution settings
    #[serde(default)]
    pub service: ServiceConfig,

    /// Background sweeper settings
    #[serde(default)]
    pub sweeper: SweeperConfig,
}

impl MiniDnsConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.store.validate()?;
        self.service.validate()?;
        self.sweeper.validate()?;
        Ok(())
    }
}

/// Record store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// In-memory record store (not persistent)
    #[default]
    Memory,

    /// File-based record store
    File {
        /// Path to the store file
        path: String,
    },

    /// Custom record store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::Memory => Ok(()),
            StoreConfig::File { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config("File store path cannot be empty"));
                }
                Ok(())
            }
            StoreConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom store factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom store config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Registry name of the factory that builds this store
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::Memory => "memory",
            StoreConfig::File { .. } => "file",
            StoreConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Write path and resolution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Maximum CNAME hops, used both for the write-time loop check and for
    /// resolution
    #[serde(default = "default_max_cname_depth")]
    pub max_cname_depth: usize,
}

impl ServiceConfig {
    /// Validate the service configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_cname_depth == 0 || self.max_cname_depth > MAX_CONFIGURABLE_DEPTH {
            return Err(crate::Error::config(format!(
                "max_cname_depth must be between 1 and {}. Got: {}",
                MAX_CONFIGURABLE_DEPTH, self.max_cname_depth
            )));
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_cname_depth: default_max_cname_depth(),
        }
    }
}

/// Background sweeper settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    /// Interval between expiry scans (in seconds)
    #[serde(default = "default_expire_interval_secs")]
    pub expire_interval_secs: u64,

    /// Interval between statistics snapshots (in seconds)
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,

    /// Delete records whose TTL has elapsed instead of only reporting them
    #[serde(default)]
    pub delete_expired: bool,
}

impl SweeperConfig {
    /// Validate the sweeper configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.expire_interval_secs == 0 {
            return Err(crate::Error::config("Expire interval must be > 0"));
        }
        if self.stats_interval_secs == 0 {
            return Err(crate::Error::config("Stats interval must be > 0"));
        }
        Ok(())
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            expire_interval_secs: default_expire_interval_secs(),
            stats_interval_secs: default_stats_interval_secs(),
            delete_expired: false,
        }
    }
}

fn default_max_cname_depth() -> usize {
    MAX_CNAME_CHAIN_LENGTH
}

fn default_expire_interval_secs() -> u64 {
    3600
}

fn default_stats_interval_secs() -> u64 {
    300
}
