//! Signal generator parameters.

use serde::{Deserialize, Serialize};
use supertrend_core::error::PipelineError;
use supertrend_core::traits::Validate;

/// Thresholds and bracket sizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalParams {
    /// Target distance as a multiple of the stop distance
    pub risk_reward: f64,
    /// Momentum below this on the previous bar allows longs
    pub oversold: f64,
    /// Momentum above this on the previous bar allows shorts
    pub overbought: f64,
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            risk_reward: 1.5,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

impl Validate for SignalParams {
    fn validate(&self) -> Result<(), PipelineError> {
        if !(1.0..=3.0).contains(&self.risk_reward) {
            return Err(PipelineError::invalid_config(
                "risk_reward",
                self.risk_reward,
                "must be between 1.0 and 3.0",
            ));
        }
        if !(0.0..=100.0).contains(&self.oversold) {
            return Err(PipelineError::invalid_config(
                "oversold",
                self.oversold,
                "must be between 0 and 100",
            ));
        }
        if !(0.0..=100.0).contains(&self.overbought) {
            return Err(PipelineError::invalid_config(
                "overbought",
                self.overbought,
                "must be between 0 and 100",
            ));
        }
        if self.overbought <= self.oversold {
            return Err(PipelineError::invalid_config(
                "overbought",
                self.overbought,
                format!("must be greater than oversold ({})", self.oversold),
            ));
        }
        Ok(())
    }
}

/// Periods for the bundled oscillator implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OscillatorParams {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

impl Validate for OscillatorParams {
    fn validate(&self) -> Result<(), PipelineError> {
        if self.rsi_period < 1 {
            return Err(PipelineError::invalid_config(
                "rsi_period",
                self.rsi_period,
                "must be at least 1",
            ));
        }
        if self.macd_fast < 1 || self.macd_signal < 1 {
            return Err(PipelineError::invalid_config(
                "macd_fast/macd_signal",
                format!("{}/{}", self.macd_fast, self.macd_signal),
                "periods must be at least 1",
            ));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(PipelineError::invalid_config(
                "macd_slow",
                self.macd_slow,
                format!("must be greater than macd_fast ({})", self.macd_fast),
            ));
        }
        Ok(())
    }
}
