//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use supertrend_config::AppConfig;
use supertrend_core::types::Timeframe;

#[derive(Parser)]
#[command(name = "supertrend")]
#[command(author, version, about = "SuperTrend signals and bracketed-order backtests")]
pub struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, env = "SUPERTREND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level, overrides the configured one
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    /// Directory for daily rolling log files
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one backtest
    Backtest(BacktestArgs),
    /// Backtest every multiplier / risk-reward combination
    Sweep(SweepArgs),
    /// Validate configuration
    ValidateConfig,
}

/// Where the bars come from and how they are labelled.
#[derive(clap::Args)]
pub struct DataArgs {
    /// Data file (CSV with date/open/high/low/close columns)
    #[arg(long)]
    pub data: PathBuf,

    /// Symbol label for the report
    #[arg(short, long)]
    pub symbol: Option<String>,

    /// Bar timeframe (1m, 5m, 15m, 30m, 1h, 4h, 1d, 1wk)
    #[arg(short, long)]
    pub timeframe: Option<Timeframe>,

    /// Ignore bars before this date
    #[arg(long)]
    pub start: Option<String>,

    /// Ignore bars after this date
    #[arg(long)]
    pub end: Option<String>,
}

/// Overrides shared by every run.
#[derive(clap::Args)]
pub struct StrategyArgs {
    /// ATR lookback period
    #[arg(long)]
    pub atr_period: Option<usize>,

    /// Analysis window in calendar days (7-60)
    #[arg(long)]
    pub window_days: Option<u32>,

    /// Initial cash
    #[arg(long)]
    pub cash: Option<Decimal>,

    /// Proportional fee per fill, e.g. 0.001
    #[arg(long)]
    pub fee: Option<Decimal>,
}

impl StrategyArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(period) = self.atr_period {
            config.strategy.atr_period = period;
        }
        if let Some(days) = self.window_days {
            config.backtest.window_days = days;
        }
        if let Some(cash) = self.cash {
            config.backtest.initial_cash = cash;
        }
        if let Some(fee) = self.fee {
            config.backtest.fee_rate = fee;
        }
    }
}

#[derive(clap::Args)]
pub struct BacktestArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub strategy: StrategyArgs,

    /// ATR multiplier (1.0-5.0)
    #[arg(short, long)]
    pub multiplier: Option<f64>,

    /// Risk/reward ratio (1.0-3.0)
    #[arg(short, long)]
    pub risk_reward: Option<f64>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub output: OutputFormat,

    /// Save the full report as JSON
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Write the trade ledger as CSV
    #[arg(long)]
    pub trades_csv: Option<PathBuf>,

    /// Write the equity curve as CSV
    #[arg(long)]
    pub equity_csv: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct SweepArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub strategy: StrategyArgs,

    /// ATR multipliers to try (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "1,2,3,4,5")]
    pub multipliers: Vec<f64>,

    /// Risk/reward ratios to try (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "1,1.5,2,2.5,3")]
    pub risk_rewards: Vec<f64>,

    /// Only print the best N combinations
    #[arg(long)]
    pub top: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub output: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_backtest_overrides() {
        let cli = Cli::try_parse_from([
            "supertrend",
            "backtest",
            "--data",
            "bars.csv",
            "--timeframe",
            "1h",
            "--multiplier",
            "2.5",
            "--window-days",
            "14",
            "--fee",
            "0.002",
        ])
        .unwrap();

        let Commands::Backtest(args) = cli.command else {
            panic!("expected backtest");
        };
        assert_eq!(args.data.timeframe, Some(Timeframe::Hour1));
        assert_eq!(args.multiplier, Some(2.5));
        assert!(args.output == OutputFormat::Text);

        let mut config = AppConfig::default();
        args.strategy.apply(&mut config);
        assert_eq!(config.backtest.window_days, 14);
        assert_eq!(config.backtest.fee_rate, Decimal::new(2, 3));
        assert_eq!(config.strategy.atr_period, 10);
    }

    #[test]
    fn test_sweep_grid_parsing() {
        let cli = Cli::try_parse_from([
            "supertrend",
            "sweep",
            "--data",
            "bars.csv",
            "--multipliers",
            "1.5,3",
        ])
        .unwrap();

        let Commands::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        assert_eq!(args.multipliers, vec![1.5, 3.0]);
        assert_eq!(args.risk_rewards, vec![1.0, 1.5, 2.0, 2.5, 3.0]);
    }
}
