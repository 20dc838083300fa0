//! CSV data source.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use supertrend_core::error::DataError;
use supertrend_core::traits::DataSource;
use supertrend_core::types::{Bar, Timeframe};
use tracing::{debug, warn};

/// CSV record format. Extra columns such as volume are ignored.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(
        alias = "Date",
        alias = "Datetime",
        alias = "datetime",
        alias = "timestamp",
        alias = "Timestamp"
    )]
    date: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
}

/// Historical bars read from a CSV export.
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    path: PathBuf,
}

impl CsvDataSource {
    /// Create a source for an existing file.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.is_file() {
            warn!(path = %path.display(), "csv file not found");
            return Err(DataError::NoDataAvailable);
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Parse CSV text into bars, keeping the file's row order. Ordering
    /// is checked when the bars become a `BarSeries`.
    fn parse(contents: &str) -> Result<Vec<Bar>, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(contents.as_bytes());

        let mut bars = Vec::new();
        for (line, result) in reader.deserialize().enumerate() {
            let record: CsvRecord =
                result.map_err(|e| DataError::ParseError(format!("row {}: {e}", line + 1)))?;
            let timestamp = parse_timestamp(&record.date)?;
            bars.push(Bar::new(
                timestamp,
                record.open,
                record.high,
                record.low,
                record.close,
            ));
        }

        Ok(bars)
    }
}

#[async_trait]
impl DataSource for CsvDataSource {
    async fn get_historical_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Bar>, DataError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let start = start.map_or(i64::MIN, |dt| dt.timestamp_millis());
        let end = end.map_or(i64::MAX, |dt| dt.timestamp_millis());

        let bars: Vec<Bar> = Self::parse(&contents)?
            .into_iter()
            .filter(|b| (start..=end).contains(&b.timestamp))
            .collect();

        debug!(
            symbol,
            %timeframe,
            path = %self.path.display(),
            bars = bars.len(),
            "loaded bars from csv"
        );
        if bars.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(bars)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Parse a timestamp in any of the common export formats into Unix
/// milliseconds. Values without an offset are taken as UTC.
pub fn parse_timestamp(value: &str) -> Result<i64, DataError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(dt.timestamp_millis());
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(value, format) {
            return Ok(d.and_time(NaiveTime::MIN).and_utc().timestamp_millis());
        }
    }

    // Unix epoch, milliseconds if more than 10 digits
    if let Ok(ts) = value.parse::<i64>() {
        return Ok(if ts.abs() > 10_000_000_000 { ts } else { ts * 1000 });
    }

    Err(DataError::ParseError(format!("could not parse date: {value}")))
}
