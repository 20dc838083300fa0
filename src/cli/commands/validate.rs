//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use supertrend_config::{to_toml, AppConfig};
use supertrend_core::traits::Validate;

pub fn run(config_path: Option<&Path>, config: &AppConfig) -> Result<()> {
    match config_path {
        Some(path) => println!("Validating configuration: {}", path.display()),
        None => println!("Validating built-in defaults and environment overrides"),
    }

    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Err(e.into());
    }

    println!("Configuration is valid!");
    println!();
    println!("{}", to_toml(config)?);
    Ok(())
}
