//! Configuration Loader
//!
//! Environment-aware configuration loading built on the `config` crate.
//! Sources are layered defaults → file → environment, later sources winning.

use config::{Config, Environment, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::FreightConfig;
use crate::error::{FreightError, FreightResult};

const ENV_PREFIX: &str = "FREIGHT";
const CONFIG_PATH_VAR: &str = "FREIGHT_CONFIG_PATH";

#[derive(Debug)]
pub struct ConfigManager {
    config: FreightConfig,
    environment: String,
    source_file: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection.
    ///
    /// The file comes from `FREIGHT_CONFIG_PATH`, else `config/<environment>`
    /// with any extension the `config` crate understands (optional).
    pub fn load() -> FreightResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        let explicit = std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from);
        Self::load_with_env(explicit.as_deref(), &environment)
    }

    /// Load configuration from a specific file (which must exist)
    pub fn load_from(path: &Path) -> FreightResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_with_env(Some(path), &environment)
    }

    /// Load with an explicit environment name, for tests that must not touch
    /// process-wide variables
    pub fn load_with_env(path: Option<&Path>, environment: &str) -> FreightResult<Arc<ConfigManager>> {
        let defaults = Config::try_from(&FreightConfig::default())?;

        let mut builder = Config::builder().add_source(defaults);
        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(
                File::with_name(&format!("config/{environment}")).required(false),
            ),
        };
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: FreightConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            "Configuration loaded successfully: {}",
            serde_json::to_string_pretty(&Self::sanitize_config_for_logging(&config))
                .unwrap_or_else(|_| "[serialization error]".to_string())
        );
        info!(
            environment = %environment,
            base_url = %config.backend.base_url,
            poll_interval_ms = config.poller.interval_ms,
            "Configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            source_file: path.map(Path::to_path_buf),
        }))
    }

    /// Detect current environment
    pub fn detect_environment() -> String {
        crate::logging::get_environment()
    }

    pub fn config(&self) -> &FreightConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    /// Configuration as JSON with tokens masked
    pub fn debug_config(&self) -> serde_json::Value {
        Self::sanitize_config_for_logging(&self.config)
    }

    fn sanitize_config_for_logging(config: &FreightConfig) -> serde_json::Value {
        let mut config_json = serde_json::json!(config);
        let sensitive_patterns = ["token", "secret", "password", "key"];
        Self::sanitize_json_recursive(&mut config_json, &sensitive_patterns, false);
        config_json
    }

    /// Mask every string below a key that looks sensitive
    fn sanitize_json_recursive(
        value: &mut serde_json::Value,
        sensitive_patterns: &[&str],
        inside_sensitive: bool,
    ) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let is_sensitive = inside_sensitive
                        || sensitive_patterns
                            .iter()
                            .any(|pattern| key_lower.contains(pattern));
                    Self::sanitize_json_recursive(val, sensitive_patterns, is_sensitive);
                }
            }
            serde_json::Value::String(s) if inside_sensitive => {
                let masked = if s.is_empty() {
                    "[EMPTY]".to_string()
                } else {
                    "[MASKED]".to_string()
                };
                *value = serde_json::Value::String(masked);
            }
            serde_json::Value::Array(items) => {
                for item in items {
                    Self::sanitize_json_recursive(item, sensitive_patterns, inside_sensitive);
                }
            }
            _ => {}
        }
    }
}

impl TryFrom<&Path> for FreightConfig {
    type Error = FreightError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let manager = ConfigManager::load_with_env(Some(path), "file")?;
        Ok(manager.config().clone())
    }
}
