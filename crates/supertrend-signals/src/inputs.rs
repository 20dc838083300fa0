//! Oscillator series consumed by the signal generator.

use supertrend_core::error::{PipelineError, PipelineResult};
use supertrend_core::traits::{Indicator, MultiOutputIndicator, Validate};
use supertrend_indicators::{Macd, MacdOutput, Rsi};

use crate::config::OscillatorParams;

/// Momentum and MACD series aligned 1:1 with the bar series.
///
/// Each series may start with `None` during its own warm-up. Once a series
/// becomes defined it must stay defined: a gap would make the crossing
/// tests compare against a missing previous value.
#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorInputs {
    /// Momentum oscillator, 0-100
    pub momentum: Vec<Option<f64>>,
    /// MACD line and its signal line
    pub macd: Vec<Option<MacdOutput>>,
}

impl OscillatorInputs {
    /// Compute both series with the bundled RSI and MACD implementations.
    pub fn compute(closes: &[f64], params: &OscillatorParams) -> PipelineResult<Self> {
        params.validate()?;
        let rsi = Rsi::new(params.rsi_period);
        let macd = Macd::with_periods(params.macd_fast, params.macd_slow, params.macd_signal);

        Ok(Self {
            momentum: rsi.calculate_aligned(closes),
            macd: macd.calculate_aligned(closes),
        })
    }

    /// Check alignment with a series of `len` bars and value sanity.
    pub fn validate(&self, len: usize) -> PipelineResult<()> {
        if self.momentum.len() != len || self.macd.len() != len {
            return Err(PipelineError::InvalidInput(format!(
                "oscillator series must have {} values, got momentum={} macd={}",
                len,
                self.momentum.len(),
                self.macd.len()
            )));
        }

        for (i, value) in self.momentum.iter().enumerate() {
            if let Some(v) = value {
                if !(0.0..=100.0).contains(v) {
                    return Err(PipelineError::InvalidInput(format!(
                        "momentum at bar {i} is {v}, expected 0-100"
                    )));
                }
            }
        }
        for (i, value) in self.macd.iter().enumerate() {
            if let Some(m) = value {
                if !m.macd.is_finite() || !m.signal.is_finite() {
                    return Err(PipelineError::InvalidInput(format!(
                        "macd at bar {i} is not finite: {}/{}",
                        m.macd, m.signal
                    )));
                }
            }
        }

        first_defined(&self.momentum, "momentum")?;
        first_defined(&self.macd, "macd")?;
        Ok(())
    }

    /// First bar index where both series are defined, `None` if never.
    pub fn first_defined(&self) -> PipelineResult<Option<usize>> {
        let momentum = first_defined(&self.momentum, "momentum")?;
        let macd = first_defined(&self.macd, "macd")?;
        Ok(momentum.zip(macd).map(|(a, b)| a.max(b)))
    }
}

/// Index of the first `Some`, rejecting any `None` after it.
fn first_defined<T>(values: &[Option<T>], name: &str) -> PipelineResult<Option<usize>> {
    let Some(first) = values.iter().position(Option::is_some) else {
        return Ok(None);
    };
    if let Some(gap) = values[first..].iter().position(Option::is_none) {
        return Err(PipelineError::InvalidInput(format!(
            "{name} series has a gap at bar {} after its warm-up",
            first + gap
        )));
    }
    Ok(Some(first))
}
