use std::io::Write;
use std::path::Path;

use freight_core::config::{ConfigManager, FreightConfig};
use freight_core::constants::Carrier;
use freight_core::error::FreightError;

fn write_config(extension: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(extension)
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_yaml_file_is_accepted() {
    let file = write_config(
        ".yaml",
        r#"
backend:
  base_url: "https://staging.freight.example.com"
  timeout_ms: 5000
  carrier_tokens:
    estes: "estes-token"
cache:
  durable_path: "/var/lib/freight/staging.json"
"#,
    );

    let config = FreightConfig::try_from(file.path()).unwrap();
    assert_eq!(config.backend.base_url, "https://staging.freight.example.com");
    assert_eq!(config.backend.timeout().as_millis(), 5000);
    assert_eq!(config.backend.token_for(Some(Carrier::Estes)), Some("estes-token"));
    assert_eq!(config.backend.token_for(Some(Carrier::Xpo)), None);
    assert_eq!(
        config.cache.durable_path.as_deref(),
        Some(Path::new("/var/lib/freight/staging.json"))
    );
}

#[test]
fn test_missing_explicit_file_is_a_configuration_error() {
    let err = ConfigManager::load_with_env(Some(Path::new("/nonexistent/freight.toml")), "test").unwrap_err();
    assert!(matches!(err, FreightError::ConfigurationError(_)));
}

#[test]
fn test_unknown_carrier_in_file_is_rejected() {
    let file = write_config(".toml", "[backend.carrier_tokens]\nups = \"t\"\n");
    let err = ConfigManager::load_with_env(Some(file.path()), "test").unwrap_err();
    assert!(matches!(err, FreightError::ConfigurationError(_)));
}

#[test]
fn test_environment_overrides_file() {
    let file = write_config(".toml", "[poller]\ninterval_ms = 500\nmax_attempts = 20\n");

    std::env::set_var("FREIGHT__POLLER__INTERVAL_MS", "750");
    let loaded = ConfigManager::load_with_env(Some(file.path()), "test");
    std::env::remove_var("FREIGHT__POLLER__INTERVAL_MS");

    let manager = loaded.unwrap();
    assert_eq!(manager.config().poller.interval_ms, 750);
    assert_eq!(manager.config().poller.max_attempts, 20);
    assert_eq!(manager.source_file(), Some(file.path()));
}
