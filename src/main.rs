//! SuperTrend backtesting CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::PathBuf;
use supertrend_config::{load_config, AppConfig};
use supertrend_monitor::setup_logging;

/// Logging options: command-line flags win over the configuration.
struct LogOptions {
    level: String,
    json: bool,
    dir: Option<PathBuf>,
}

impl LogOptions {
    fn resolve(cli: &Cli, config: &AppConfig) -> Self {
        let level = match cli.log_level {
            Some(level) => level.as_str().to_string(),
            None => config.logging.level.clone(),
        };
        Self {
            level,
            json: cli.json_logs || config.logging.format.eq_ignore_ascii_case("json"),
            dir: cli
                .log_dir
                .clone()
                .or_else(|| config.logging.file.as_ref().map(PathBuf::from)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    // Setup logging
    let logging = LogOptions::resolve(&cli, &config);
    let _log_guard = setup_logging(&logging.level, logging.json, logging.dir.as_deref())
        .context("Failed to initialize logging")?;

    // Execute command
    match cli.command {
        Commands::Backtest(args) => cli::commands::backtest::run(args, config).await,
        Commands::Sweep(args) => cli::commands::sweep::run(args, config).await,
        Commands::ValidateConfig => cli::commands::validate::run(cli.config.as_deref(), &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_flag_overrides_config() {
        let mut config = AppConfig::default();
        config.logging.level = "warn".to_string();

        let cli = Cli::parse_from(["supertrend", "--log-level", "debug", "validate-config"]);
        let logging = LogOptions::resolve(&cli, &config);
        assert_eq!(logging.level, "debug");
        assert!(!logging.json);
        assert!(logging.dir.is_none());

        // The configuration is still owned and usable by the command
        assert!(matches!(cli.command, Commands::ValidateConfig));
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_log_options_fall_back_to_config() {
        let mut config = AppConfig::default();
        config.logging.level = "trace".to_string();
        config.logging.format = "JSON".to_string();
        config.logging.file = Some("/var/log/supertrend".to_string());

        let cli = Cli::parse_from(["supertrend", "validate-config"]);
        let logging = LogOptions::resolve(&cli, &config);
        assert_eq!(logging.level, "trace");
        assert!(logging.json);
        assert_eq!(logging.dir, Some(PathBuf::from("/var/log/supertrend")));
    }
}
