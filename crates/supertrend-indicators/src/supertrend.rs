//! SuperTrend state recurrence.
//!
//! A two-state machine (uptrend / downtrend) folded over the bar series.
//! Each step depends on the full state of the previous bar, so the series
//! can only be computed front to back from the seed.
//!
//! Per step, the bands are ratcheted first and the flip test then compares
//! the current close against the *current* bar's ratcheted band:
//!
//! - `upper = up` if `up < upper_prev` or `close_prev > upper_prev`, else `upper_prev`
//! - `lower = dn` if `dn > lower_prev` or `close_prev < lower_prev`, else `lower_prev`
//! - uptrend: flip down when `close <= lower` (line = `upper`), else
//!   line = `max(line_prev, lower)`
//! - downtrend: flip up when `close >= upper` (line = `lower`), else
//!   line = `min(line_prev, upper)`

use serde::{Deserialize, Serialize};
use supertrend_core::error::{PipelineError, PipelineResult};
use tracing::debug;

use crate::volatility::RawBands;

/// Trend state of one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendState {
    pub upper_band: f64,
    pub lower_band: f64,
    pub trend_line: f64,
    pub is_uptrend: bool,
}

impl TrendState {
    /// State at the first usable bar. The line sits on the band matching
    /// the seed direction.
    pub fn seed(up: f64, dn: f64, uptrend: bool) -> Self {
        Self {
            upper_band: up,
            lower_band: dn,
            trend_line: if uptrend { dn } else { up },
            is_uptrend: uptrend,
        }
    }

    /// Advance one bar.
    pub fn next(&self, prev_close: f64, close: f64, up: f64, dn: f64) -> Self {
        let upper_band = if up < self.upper_band || prev_close > self.upper_band {
            up
        } else {
            self.upper_band
        };
        let lower_band = if dn > self.lower_band || prev_close < self.lower_band {
            dn
        } else {
            self.lower_band
        };

        let (is_uptrend, trend_line) = if self.is_uptrend {
            if close <= lower_band {
                (false, upper_band)
            } else {
                (true, self.trend_line.max(lower_band))
            }
        } else if close >= upper_band {
            (true, lower_band)
        } else {
            (false, self.trend_line.min(upper_band))
        };

        Self {
            upper_band,
            lower_band,
            trend_line,
            is_uptrend,
        }
    }
}

/// Trend states for the usable region of a bar series.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeries {
    start: usize,
    states: Vec<TrendState>,
}

impl TrendSeries {
    /// Run the recurrence over `closes` using the raw bands.
    ///
    /// The seed bar is the first bar with defined bands, but never bar 0:
    /// bar 0 has no prior close to ratchet against.
    pub fn compute(closes: &[f64], bands: &RawBands, seed_uptrend: bool) -> PipelineResult<Self> {
        if closes.len() != bands.len() {
            return Err(PipelineError::InvalidInput(format!(
                "close series has {} bars but bands cover {}",
                closes.len(),
                bands.len()
            )));
        }

        let start = bands.start().max(1);
        let (up, dn) = bands
            .band(start)
            .ok_or(PipelineError::InsufficientData {
                required: start + 1,
                available: closes.len(),
            })?;

        let seed = TrendState::seed(up, dn, seed_uptrend);
        let states: Vec<TrendState> = std::iter::once(seed)
            .chain((start + 1..closes.len()).scan(seed, |state, i| {
                let (up, dn) = bands.band(i)?;
                *state = state.next(closes[i - 1], closes[i], up, dn);
                Some(*state)
            }))
            .collect();

        let series = Self { start, states };
        debug!(
            start,
            bars = series.states.len(),
            flips = series.flip_count(),
            "trend recurrence complete"
        );
        Ok(series)
    }

    /// First bar index with a defined state.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Length of the underlying bar series.
    pub fn len(&self) -> usize {
        self.start + self.states.len()
    }

    /// True if no state is defined.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// State for bar `index`, `None` before the seed bar.
    pub fn state(&self, index: usize) -> Option<&TrendState> {
        self.states.get(index.checked_sub(self.start)?)
    }

    /// Trend line for bar `index`.
    pub fn trend_line(&self, index: usize) -> Option<f64> {
        self.state(index).map(|s| s.trend_line)
    }

    /// Trend line aligned 1:1 with the bar series, for display.
    pub fn trend_lines(&self) -> Vec<Option<f64>> {
        (0..self.len()).map(|i| self.trend_line(i)).collect()
    }

    /// True if the direction changed on bar `index`.
    pub fn flipped_at(&self, index: usize) -> bool {
        match (index.checked_sub(1).and_then(|p| self.state(p)), self.state(index)) {
            (Some(prev), Some(cur)) => prev.is_uptrend != cur.is_uptrend,
            _ => false,
        }
    }

    fn flip_count(&self) -> usize {
        (self.start + 1..self.len())
            .filter(|&i| self.flipped_at(i))
            .count()
    }
}
