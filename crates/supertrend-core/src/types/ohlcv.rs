//! OHLC bar data types.

use serde::{Deserialize, Serialize};

use super::Timeframe;
use crate::error::{BarValidationError, PipelineError, PipelineResult};

/// One OHLC price observation.
/// Uses f64 for fast indicator calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
}

impl Bar {
    /// Create a new bar. No validation is performed until the bar is
    /// ingested into a [`BarSeries`].
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }

    /// Check the bar's internal consistency.
    pub fn validate(&self) -> Result<(), BarValidationError> {
        if !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
        {
            return Err(BarValidationError::NonFinite {
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }

        if self.high < self.low {
            return Err(BarValidationError::HighBelowLow {
                high: self.high,
                low: self.low,
            });
        }

        if self.open < self.low || self.open > self.high {
            return Err(BarValidationError::OpenOutOfRange {
                open: self.open,
                low: self.low,
                high: self.high,
            });
        }

        if self.close < self.low || self.close > self.high {
            return Err(BarValidationError::CloseOutOfRange {
                close: self.close,
                low: self.low,
                high: self.high,
            });
        }

        Ok(())
    }
}

/// Immutable, validated time series of bars.
///
/// Bars are ordered by strictly increasing timestamp. A series that
/// violates any bar invariant is rejected as a whole: the downstream
/// recurrence is order-dependent, so skipping a bar would silently
/// change every later value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    /// Symbol identifier (display only)
    pub symbol: String,
    /// Timeframe of the bars
    pub timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Validate and ingest a bar sequence.
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<Bar>,
    ) -> PipelineResult<Self> {
        let mut previous: Option<i64> = None;

        for (index, bar) in bars.iter().enumerate() {
            let invalid = |reason| PipelineError::InvalidBar {
                index,
                timestamp: bar.timestamp,
                reason,
            };

            bar.validate().map_err(invalid)?;

            if let Some(prev) = previous {
                if bar.timestamp <= prev {
                    return Err(invalid(BarValidationError::NonIncreasingTimestamp {
                        previous: prev,
                    }));
                }
            }
            previous = Some(bar.timestamp);
        }

        Ok(Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        })
    }

    /// Get the number of bars.
    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Check if the series is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Get all bars as a slice.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Get a bar by index (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    /// Get the last bar.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Index of the first bar whose timestamp is at or after `timestamp`.
    /// Returns `len()` when every bar is older.
    pub fn index_at_or_after(&self, timestamp: i64) -> usize {
        self.bars.partition_point(|b| b.timestamp < timestamp)
    }

    /// Extract close prices as a vector.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Extract high prices as a vector.
    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    /// Extract low prices as a vector.
    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    /// Get an iterator over the bars.
    pub fn iter(&self) -> impl Iterator<Item = &Bar> {
        self.bars.iter()
    }
}
