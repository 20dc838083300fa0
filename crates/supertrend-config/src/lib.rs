//! Configuration management.
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then `SUPERTREND__SECTION__KEY` environment variables. The binary
//! applies its command-line overrides on top and validates the result
//! before any computation starts.

mod settings;

pub use settings::{AppConfig, AppSettings, BacktestSettings, LoggingConfig, StrategySettings};

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use supertrend_core::error::PipelineError;
use thiserror::Error;

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "SUPERTREND";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error(transparent)]
    Invalid(#[from] PipelineError),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Load configuration from an optional file and the environment.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, SettingsError> {
    load_with_env(path, environment())
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

fn load_with_env(path: Option<&Path>, env: Environment) -> Result<AppConfig, SettingsError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }
    let config = builder.add_source(env).build()?;
    Ok(config.try_deserialize()?)
}

/// Render a configuration as TOML.
pub fn to_toml(config: &AppConfig) -> Result<String, SettingsError> {
    Ok(toml::to_string_pretty(config)?)
}
