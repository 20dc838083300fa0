//! Backtest command implementation.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::BufWriter;
use supertrend_backtest::Pipeline;
use supertrend_config::AppConfig;
use supertrend_core::traits::Validate;
use tracing::{info, warn};

use super::load_series;
use crate::cli::{BacktestArgs, OutputFormat};

pub async fn run(args: BacktestArgs, mut config: AppConfig) -> Result<()> {
    args.strategy.apply(&mut config);
    if let Some(multiplier) = args.multiplier {
        config.strategy.atr_multiplier = multiplier;
    }
    if let Some(risk_reward) = args.risk_reward {
        config.strategy.risk_reward = risk_reward;
    }
    config.validate().context("Invalid configuration")?;

    let series = load_series(&args.data, &config.app).await?;
    let pipeline = Pipeline::new(config.pipeline_config())?;

    info!(
        symbol = %series.symbol,
        multiplier = config.strategy.atr_multiplier,
        risk_reward = config.strategy.risk_reward,
        "Starting backtest"
    );
    let report = match pipeline.run(&series) {
        Ok(report) => report,
        Err(e) if e.is_no_data() => {
            warn!(error = %e, "not enough data to backtest");
            bail!("No data available for a backtest of {}: {}", series.symbol, e);
        }
        Err(e) => return Err(e).context("Backtest failed"),
    };

    if report.trades.is_empty() {
        info!("no trades triggered in the analysis window");
    }

    // Output results
    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    // Save if requested
    if let Some(path) = &args.save {
        std::fs::write(path, report.to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Report saved to {}", path.display());
    }
    if let Some(path) = &args.trades_csv {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        report.write_trades_csv(BufWriter::new(file))?;
        info!("Trades saved to {}", path.display());
    }
    if let Some(path) = &args.equity_csv {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        report.write_equity_csv(BufWriter::new(file))?;
        info!("Equity curve saved to {}", path.display());
    }

    Ok(())
}
