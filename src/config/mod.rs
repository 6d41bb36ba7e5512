//! # Freight Configuration System
//!
//! Layered configuration for the staging core: built-in defaults, then an
//! optional TOML/YAML/JSON file, then `FREIGHT__SECTION__KEY` environment
//! overrides. Loaded values are validated before use.
//!
//! ```rust,no_run
//! use freight_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let interval = manager.config().poller.interval();
//! # Ok(())
//! # }
//! ```

pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{defaults, Carrier};
use crate::error::{FreightError, FreightResult};

pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FreightConfig {
    /// Backend and carrier API access
    pub backend: BackendConfig,

    /// Long-running job polling
    pub poller: PollerConfig,

    /// Staging cache persistence
    pub cache: CacheConfig,

    /// In-process carrier event bus
    pub events: EventBusConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    /// Bearer token per carrier, keyed by carrier name (`xpo`, `estes`)
    pub carrier_tokens: HashMap<String, String>,
    /// Token for shipped-order and job endpoints, and carriers without their own
    pub default_token: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BACKEND_BASE_URL.to_string(),
            timeout_ms: defaults::BACKEND_TIMEOUT_MS,
            carrier_tokens: HashMap::new(),
            default_token: None,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Token for a carrier call, falling back to the default token
    pub fn token_for(&self, carrier: Option<Carrier>) -> Option<&str> {
        carrier
            .and_then(|carrier| self.carrier_tokens.get(carrier.as_str()))
            .or(self.default_token.as_ref())
            .map(String::as_str)
            .filter(|token| !token.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PollerConfig {
    pub interval_ms: u64,
    /// Poll ceiling per job; reaching it stops the loop without a terminal status
    pub max_attempts: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: defaults::POLL_INTERVAL_MS,
            max_attempts: defaults::POLL_MAX_ATTEMPTS,
        }
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// JSON file for the durable store; in-memory when unset
    pub durable_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EventBusConfig {
    /// Per-kind broadcast capacity; slow subscribers lose the oldest messages
    pub buffer_size: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            buffer_size: defaults::EVENT_BUFFER_SIZE,
        }
    }
}

impl FreightConfig {
    pub fn validate(&self) -> FreightResult<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(FreightError::ConfigurationError(
                "backend.base_url is required".to_string(),
            ));
        }
        reqwest::Url::parse(&self.backend.base_url).map_err(|e| {
            FreightError::ConfigurationError(format!("backend.base_url is not a valid URL: {e}"))
        })?;

        if self.backend.timeout_ms == 0 {
            return Err(FreightError::ConfigurationError(
                "backend.timeout_ms must be greater than 0".to_string(),
            ));
        }

        for carrier in self.backend.carrier_tokens.keys() {
            carrier.parse::<Carrier>().map_err(|e| {
                FreightError::ConfigurationError(format!("backend.carrier_tokens: {e}"))
            })?;
        }

        if self.poller.interval_ms == 0 {
            return Err(FreightError::ConfigurationError(
                "poller.interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.poller.max_attempts == 0 {
            return Err(FreightError::ConfigurationError(
                "poller.max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.events.buffer_size == 0 {
            return Err(FreightError::ConfigurationError(
                "events.buffer_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
