//! Print the effective freight configuration with tokens masked.
//!
//! Usage: `freight_config [path/to/config.toml]`. Without a path the file is
//! taken from `FREIGHT_CONFIG_PATH` or `config/<FREIGHT_ENV>` if present.

use anyhow::Context;
use std::path::PathBuf;

use freight_core::config::ConfigManager;
use freight_core::logging::init_structured_logging;

fn main() -> anyhow::Result<()> {
    init_structured_logging();

    let manager = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => ConfigManager::load_from(&path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => ConfigManager::load().context("failed to load configuration")?,
    };

    println!("🔧 Freight configuration");
    println!("   - Environment: {}", manager.environment());
    match manager.source_file() {
        Some(path) => println!("   - Source file: {}", path.display()),
        None => println!("   - Source file: (defaults and environment only)"),
    }
    println!("{}", serde_json::to_string_pretty(&manager.debug_config())?);

    Ok(())
}
