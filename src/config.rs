//! # Service configuration.
//!
//! Provides [`Config`] centralized settings for the lot service and the reference
//! daemon.
//!
//! Config is used in two ways:
//! 1. **Service creation**: `LotService::builder(config)`
//! 2. **Daemon startup**: `Config::load(path)` reads a TOML file; every field is optional
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1
//! - `outbound_capacity = 0` → clamped to 1
//!
//! ## Example file
//! ```toml
//! listen = "0.0.0.0:10380"
//! fee_rate = 10            # hundredths per whole minute
//! evict_superseded = true
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::policies::FeeCalculator;

/// Errors raised while loading a configuration file.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for the lot service.
///
/// ## Field semantics
/// - `listen`: Address the reference daemon binds to
/// - `bus_capacity`: Event bus ring buffer size (min 1)
/// - `fee_rate`: Hundredths of a currency unit charged per whole minute
/// - `evict_superseded`: Evict the older connection when a station connects twice
/// - `outbound_capacity`: Per-connection outbound queue of the daemon (min 1)
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub listen: String,
    pub bus_capacity: usize,
    pub fee_rate: u64,
    pub evict_superseded: bool,
    pub outbound_capacity: usize,
}

impl Config {
    /// Parses a TOML document; missing fields keep their defaults.
    pub fn from_toml(src: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(src)?)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&src)
    }

    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    #[inline]
    pub fn outbound_capacity_clamped(&self) -> usize {
        self.outbound_capacity.max(1)
    }

    /// Fee calculator using the configured rate.
    #[inline]
    pub fn fee_calculator(&self) -> FeeCalculator {
        FeeCalculator::new(self.fee_rate)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `listen = 127.0.0.1:10380`
    /// - `bus_capacity = 1024`
    /// - `fee_rate = 10` (0.1 unit per minute)
    /// - `evict_superseded = true`
    /// - `outbound_capacity = 64`
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:10380".to_string(),
            bus_capacity: 1024,
            fee_rate: FeeCalculator::DEFAULT_RATE,
            evict_superseded: true,
            outbound_capacity: 64,
        }
    }
}
