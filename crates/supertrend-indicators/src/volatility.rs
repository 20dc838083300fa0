//! Volatility indicators: ATR and the raw SuperTrend bands.

use serde::{Deserialize, Serialize};
use supertrend_core::error::{PipelineError, PipelineResult};
use supertrend_core::traits::{Indicator, Validate};

use crate::moving_average::{Rma, Sma};

/// Smoothing applied to the true range series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AtrSmoothing {
    /// Wilder's running average, seeded with the simple mean.
    #[default]
    Wilder,
    /// Plain rolling mean over the trailing window.
    Sma,
}

/// Average True Range (ATR).
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    smoothing: AtrSmoothing,
}

impl Atr {
    /// Create a new ATR indicator with Wilder smoothing.
    pub fn new(period: usize) -> Self {
        Self::with_smoothing(period, AtrSmoothing::Wilder)
    }

    /// Create an ATR with an explicit smoothing method.
    pub fn with_smoothing(period: usize, smoothing: AtrSmoothing) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period, smoothing }
    }

    /// True range per bar. Bar 0 has no previous close, so its true
    /// range is its own high-low range.
    pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
        let len = high.len().min(low.len()).min(close.len());

        (0..len)
            .map(|i| {
                let hl = high[i] - low[i];
                if i == 0 {
                    return hl;
                }
                let hc = (high[i] - close[i - 1]).abs();
                let lc = (low[i] - close[i - 1]).abs();
                hl.max(hc).max(lc)
            })
            .collect()
    }

    /// Calculate ATR from OHLC data.
    ///
    /// The first value corresponds to bar index `period - 1`.
    pub fn calculate_ohlc(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
        let tr = Self::true_range(high, low, close);
        match self.smoothing {
            AtrSmoothing::Wilder => Rma::new(self.period).calculate(&tr),
            AtrSmoothing::Sma => Sma::new(self.period).calculate(&tr),
        }
    }

    /// Index of the first defined ATR value.
    pub fn warmup(&self) -> usize {
        self.period - 1
    }
}

/// Parameters of the volatility band builder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandParams {
    /// ATR lookback period
    pub period: usize,
    /// ATR multiple added to / subtracted from the midpoint
    pub multiplier: f64,
    /// ATR smoothing method
    pub smoothing: AtrSmoothing,
}

impl Default for BandParams {
    fn default() -> Self {
        Self {
            period: 10,
            multiplier: 3.0,
            smoothing: AtrSmoothing::Wilder,
        }
    }
}

impl Validate for BandParams {
    fn validate(&self) -> Result<(), PipelineError> {
        if self.period < 1 {
            return Err(PipelineError::invalid_config(
                "atr_period",
                self.period,
                "must be at least 1",
            ));
        }
        if !(1.0..=5.0).contains(&self.multiplier) {
            return Err(PipelineError::invalid_config(
                "atr_multiplier",
                self.multiplier,
                "must be between 1.0 and 5.0",
            ));
        }
        Ok(())
    }
}

/// Raw upper/lower bands over the usable region of a bar series.
///
/// Only indices `start..len` are stored; the warm-up region is sliced
/// off once here instead of carrying NaN markers downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBands {
    start: usize,
    upper: Vec<f64>,
    lower: Vec<f64>,
}

impl RawBands {
    /// Assemble bands from precomputed parts, `upper[k]` belonging to bar
    /// `start + k`.
    pub fn from_parts(start: usize, upper: Vec<f64>, lower: Vec<f64>) -> Self {
        debug_assert_eq!(upper.len(), lower.len());
        Self {
            start,
            upper,
            lower,
        }
    }

    /// First bar index with defined bands.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Length of the underlying bar series.
    pub fn len(&self) -> usize {
        self.start + self.upper.len()
    }

    /// True if no band value is defined.
    pub fn is_empty(&self) -> bool {
        self.upper.is_empty()
    }

    /// `(up, dn)` for bar `index`, `None` inside the warm-up region.
    pub fn band(&self, index: usize) -> Option<(f64, f64)> {
        let k = index.checked_sub(self.start)?;
        Some((*self.upper.get(k)?, *self.lower.get(k)?))
    }
}

/// Volatility band builder:
/// `up = mid + M * atr`, `dn = mid - M * atr`, `mid = (high + low) / 2`.
#[derive(Debug, Clone)]
pub struct VolatilityBands {
    params: BandParams,
    atr: Atr,
}

impl VolatilityBands {
    /// Create a validated band builder.
    pub fn new(params: BandParams) -> PipelineResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            atr: Atr::with_smoothing(params.period, params.smoothing),
        })
    }

    /// Minimum number of bars for the bands to be usable.
    pub fn min_bars(&self) -> usize {
        self.params.period + 1
    }

    /// Build the raw bands.
    pub fn build(&self, high: &[f64], low: &[f64], close: &[f64]) -> PipelineResult<RawBands> {
        let len = high.len();
        if low.len() != len || close.len() != len {
            return Err(PipelineError::InvalidInput(format!(
                "high/low/close lengths differ: {}/{}/{}",
                len,
                low.len(),
                close.len()
            )));
        }
        if len < self.min_bars() {
            return Err(PipelineError::InsufficientData {
                required: self.min_bars(),
                available: len,
            });
        }

        let atr = self.atr.calculate_ohlc(high, low, close);
        let start = self.atr.warmup();
        let m = self.params.multiplier;

        let (upper, lower) = atr
            .iter()
            .enumerate()
            .map(|(k, &a)| {
                let i = start + k;
                let mid = (high[i] + low[i]) / 2.0;
                (mid + m * a, mid - m * a)
            })
            .unzip();

        Ok(RawBands {
            start,
            upper,
            lower,
        })
    }
}
