//! Data source trait definitions.

use crate::error::DataError;
use crate::types::{Bar, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait for historical bar providers.
///
/// Retrieval, retries and vendor quirks live behind this seam; the
/// pipeline only ever sees the materialized bars.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch historical bars ordered from oldest to newest.
    ///
    /// `start`/`end` bound the range inclusively when given.
    async fn get_historical_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Bar>, DataError>;

    /// Get the data source name.
    fn name(&self) -> &str;
}
