//! CLI command implementations.

pub mod backtest;
pub mod sweep;
pub mod validate;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use supertrend_config::AppSettings;
use supertrend_core::error::DataError;
use supertrend_core::traits::DataSource;
use supertrend_core::types::BarSeries;
use supertrend_data::{parse_timestamp, CsvDataSource};
use tracing::info;

use crate::cli::DataArgs;

/// Load and validate the bar series described by the data arguments.
pub async fn load_series(args: &DataArgs, app: &AppSettings) -> Result<BarSeries> {
    let symbol = args.symbol.clone().unwrap_or_else(|| app.symbol.clone());
    let timeframe = args.timeframe.unwrap_or(app.timeframe);

    if !args.data.exists() {
        bail!(
            "Data path '{}' does not exist. Provide a CSV file with --data (e.g. --data ./data/btc.csv)",
            args.data.display()
        );
    }
    let source = CsvDataSource::new(&args.data)?;

    let start = args.start.as_deref().map(parse_date).transpose()?;
    let end = args.end.as_deref().map(parse_date).transpose()?;

    let bars = match source.get_historical_bars(&symbol, timeframe, start, end).await {
        Ok(bars) => bars,
        Err(DataError::NoDataAvailable) => bail!(
            "No data available for {} in '{}'",
            symbol,
            args.data.display()
        ),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read '{}'", args.data.display()))
        }
    };

    let series = BarSeries::new(symbol, timeframe, bars).context("Bar data failed validation")?;
    info!(
        symbol = %series.symbol,
        %timeframe,
        bars = series.len(),
        source = source.name(),
        "loaded bar series"
    );
    Ok(series)
}

fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    let millis = parse_timestamp(value)?;
    DateTime::from_timestamp_millis(millis).with_context(|| format!("Date out of range: {value}"))
}
