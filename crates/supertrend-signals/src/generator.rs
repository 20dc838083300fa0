//! Entry flags and brackets per bar.

use serde::{Deserialize, Serialize};
use supertrend_core::error::{PipelineError, PipelineResult};
use supertrend_core::traits::Validate;
use supertrend_indicators::TrendSeries;
use tracing::debug;

use crate::config::SignalParams;
use crate::inputs::OscillatorInputs;

/// Signal for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub long_entry: bool,
    pub short_entry: bool,
    pub long_stop: f64,
    pub long_target: f64,
    pub short_stop: f64,
    pub short_target: f64,
}

/// Signals for the usable region of a bar series.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    start: usize,
    signals: Vec<Signal>,
}

impl SignalSeries {
    /// Build from signals for bars `start..`, rejecting any bar that raises
    /// both a long and a short entry.
    pub fn new(start: usize, signals: Vec<Signal>) -> PipelineResult<Self> {
        if let Some(offset) = signals.iter().position(|s| s.long_entry && s.short_entry) {
            return Err(PipelineError::InvalidInput(format!(
                "bar {} raised both a long and a short entry",
                start + offset
            )));
        }
        Ok(Self { start, signals })
    }

    /// First bar index with a signal.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Length of the underlying bar series.
    pub fn len(&self) -> usize {
        self.start + self.signals.len()
    }

    /// True if no bar carries a signal.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Signal for bar `index`, `None` during warm-up.
    pub fn get(&self, index: usize) -> Option<&Signal> {
        self.signals.get(index.checked_sub(self.start)?)
    }

    /// Long entry flags aligned with the bar series.
    pub fn long_entries(&self) -> Vec<bool> {
        (0..self.len())
            .map(|i| self.get(i).is_some_and(|s| s.long_entry))
            .collect()
    }

    /// Short entry flags aligned with the bar series.
    pub fn short_entries(&self) -> Vec<bool> {
        (0..self.len())
            .map(|i| self.get(i).is_some_and(|s| s.short_entry))
            .collect()
    }

    /// Number of `(long, short)` entry flags raised.
    pub fn entry_counts(&self) -> (usize, usize) {
        self.signals.iter().fold((0, 0), |(l, s), sig| {
            (l + sig.long_entry as usize, s + sig.short_entry as usize)
        })
    }
}

/// Combines trend-line crossings with momentum and MACD confirmation.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    params: SignalParams,
}

impl SignalGenerator {
    /// Create a validated generator.
    pub fn new(params: SignalParams) -> PipelineResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// First bar that can carry a signal: every input must be defined on
    /// the bar before it.
    pub fn warmup(trend: &TrendSeries, inputs: &OscillatorInputs) -> PipelineResult<usize> {
        let oscillators = inputs.first_defined()?.ok_or(PipelineError::InsufficientData {
            required: inputs.momentum.len() + 1,
            available: inputs.momentum.len(),
        })?;
        Ok(trend.start().max(oscillators) + 1)
    }

    /// Generate per-bar signals.
    pub fn generate(
        &self,
        closes: &[f64],
        trend: &TrendSeries,
        inputs: &OscillatorInputs,
    ) -> PipelineResult<SignalSeries> {
        let len = closes.len();
        if trend.len() != len {
            return Err(PipelineError::InvalidInput(format!(
                "trend covers {} bars, close series has {}",
                trend.len(),
                len
            )));
        }
        inputs.validate(len)?;

        let start = Self::warmup(trend, inputs)?;
        if start >= len {
            return Err(PipelineError::InsufficientData {
                required: start + 1,
                available: len,
            });
        }

        let signals = (start..len)
            .map(|i| self.signal_at(i, closes, trend, inputs))
            .collect::<PipelineResult<Vec<_>>>()?;

        let series = SignalSeries::new(start, signals)?;
        let (longs, shorts) = series.entry_counts();
        debug!(start, longs, shorts, "signals generated");
        Ok(series)
    }

    fn signal_at(
        &self,
        i: usize,
        closes: &[f64],
        trend: &TrendSeries,
        inputs: &OscillatorInputs,
    ) -> PipelineResult<Signal> {
        let missing = || PipelineError::InvalidInput(format!("input undefined at bar {i}"));

        let line = trend.trend_line(i).ok_or_else(missing)?;
        let prev_line = trend.trend_line(i - 1).ok_or_else(missing)?;
        let prev_momentum = inputs.momentum[i - 1].ok_or_else(missing)?;
        let macd = inputs.macd[i].ok_or_else(missing)?;
        let prev_macd = inputs.macd[i - 1].ok_or_else(missing)?;

        let close = closes[i];
        let prev_close = closes[i - 1];

        let cross_up = close > line && prev_close <= prev_line;
        let cross_down = close < line && prev_close >= prev_line;
        let oversold = prev_momentum < self.params.oversold;
        let overbought = prev_momentum > self.params.overbought;
        let macd_cross_up = macd.macd > macd.signal && prev_macd.macd <= prev_macd.signal;
        let macd_cross_down = macd.macd < macd.signal && prev_macd.macd >= prev_macd.signal;

        let rr = self.params.risk_reward;
        Ok(Signal {
            long_entry: cross_up && oversold && macd_cross_up,
            short_entry: cross_down && overbought && macd_cross_down,
            long_stop: line,
            long_target: close + (close - line) * rr,
            short_stop: line,
            short_target: close - (line - close) * rr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use supertrend_indicators::{MacdOutput, RawBands};

    /// Trend series whose line is flat at `level` from bar 1 onwards.
    fn flat_trend(len: usize, level: f64) -> TrendSeries {
        let up = vec![level + 10.0; len - 1];
        let dn = vec![level; len - 1];
        let bands = RawBands::from_parts(1, up, dn);
        let closes = vec![level + 1.0; len];
        TrendSeries::compute(&closes, &bands, true).unwrap()
    }

    fn macd(macd: f64, signal: f64) -> Option<MacdOutput> {
        Some(MacdOutput { macd, signal })
    }

    #[test]
    fn test_long_entry_requires_all_three_conditions() {
        let trend = flat_trend(5, 100.0);
        // Close crosses above the line on bar 3
        let closes = [101.0, 99.0, 99.5, 102.0, 103.0];
        let inputs = OscillatorInputs {
            momentum: vec![Some(40.0), Some(35.0), Some(25.0), Some(45.0), Some(50.0)],
            macd: vec![macd(0.0, 0.1), macd(-0.2, 0.0), macd(-0.1, 0.0), macd(0.3, 0.1), macd(0.4, 0.2)],
        };

        let generator = SignalGenerator::new(SignalParams::default()).unwrap();
        let signals = generator.generate(&closes, &trend, &inputs).unwrap();

        assert_eq!(signals.start(), 2);
        assert_eq!(signals.long_entries(), vec![false, false, false, true, false]);
        assert_eq!(signals.short_entries(), vec![false; 5]);

        let s = signals.get(3).unwrap();
        assert_eq!(s.long_stop, 100.0);
        assert_eq!(s.long_target, 102.0 + 2.0 * 1.5);

        // Same crossing without an oversold reading on the previous bar
        let mut no_oversold = inputs.clone();
        no_oversold.momentum[2] = Some(31.0);
        let signals = generator.generate(&closes, &trend, &no_oversold).unwrap();
        assert_eq!(signals.entry_counts(), (0, 0));

        // Same crossing without a MACD crossover
        let mut no_macd = inputs.clone();
        no_macd.macd[2] = macd(0.2, 0.1);
        let signals = generator.generate(&closes, &trend, &no_macd).unwrap();
        assert_eq!(signals.entry_counts(), (0, 0));
    }

    #[test]
    fn test_short_entry_and_bracket() {
        let trend = flat_trend(4, 100.0);
        let closes = [101.0, 101.0, 100.5, 98.0];
        let inputs = OscillatorInputs {
            momentum: vec![Some(60.0), Some(72.0), Some(75.0), Some(50.0)],
            macd: vec![macd(0.5, 0.1), macd(0.4, 0.2), macd(0.3, 0.2), macd(0.1, 0.2)],
        };

        let generator = SignalGenerator::new(SignalParams {
            risk_reward: 2.0,
            ..Default::default()
        })
        .unwrap();
        let signals = generator.generate(&closes, &trend, &inputs).unwrap();

        assert_eq!(signals.short_entries(), vec![false, false, false, true]);
        let s = signals.get(3).unwrap();
        assert_eq!(s.short_stop, 100.0);
        assert_eq!(s.short_target, 98.0 - 2.0 * 2.0);
    }

    #[test]
    fn test_warmup_waits_for_oscillators() {
        let trend = flat_trend(6, 100.0);
        let closes = [101.0; 6];
        let inputs = OscillatorInputs {
            momentum: vec![None, None, None, Some(50.0), Some(50.0), Some(50.0)],
            macd: vec![None, None, macd(0.0, 0.0), macd(0.0, 0.0), macd(0.0, 0.0), macd(0.0, 0.0)],
        };

        let generator = SignalGenerator::new(SignalParams::default()).unwrap();
        let signals = generator.generate(&closes, &trend, &inputs).unwrap();
        assert_eq!(signals.start(), 4);
        assert!(signals.get(3).is_none());
    }

    #[test]
    fn test_insufficient_when_oscillators_never_ready() {
        let trend = flat_trend(3, 100.0);
        let inputs = OscillatorInputs {
            momentum: vec![None, None, Some(50.0)],
            macd: vec![None, None, macd(0.0, 0.0)],
        };
        let generator = SignalGenerator::new(SignalParams::default()).unwrap();

        assert!(matches!(
            generator.generate(&[101.0; 3], &trend, &inputs),
            Err(PipelineError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_series_rejects_conflicting_entries() {
        let both = Signal {
            long_entry: true,
            short_entry: true,
            long_stop: 99.0,
            long_target: 102.0,
            short_stop: 101.0,
            short_target: 98.0,
        };
        let err = SignalSeries::new(4, vec![both]).unwrap_err();
        assert!(err.to_string().contains("bar 4"));
    }

    #[test]
    fn test_long_and_short_never_on_same_bar() {
        use supertrend_indicators::{BandParams, VolatilityBands};

        let n = 600;
        let closes: Vec<f64> = (0..n)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 6.0 + (i as f64 * 0.011).sin() * 9.0)
            .collect();
        let high: Vec<f64> = closes.iter().map(|c| c + 0.8).collect();
        let low: Vec<f64> = closes.iter().map(|c| c - 0.8).collect();

        let bands = VolatilityBands::new(BandParams {
            period: 5,
            multiplier: 1.0,
            ..Default::default()
        })
        .unwrap()
        .build(&high, &low, &closes)
        .unwrap();
        let trend = TrendSeries::compute(&closes, &bands, true).unwrap();

        // Momentum swings between oversold and overbought and MACD crosses
        // its signal line on every bar, so most trend-line crossings pass
        let inputs = OscillatorInputs {
            momentum: (0..n)
                .map(|i| Some(if (i as f64 * 1.3).sin() > 0.0 { 20.0 } else { 80.0 }))
                .collect(),
            macd: (0..n)
                .map(|i| macd(if i % 2 == 0 { 1.0 } else { -1.0 }, 0.0))
                .collect(),
        };

        let generator = SignalGenerator::new(SignalParams::default()).unwrap();
        let signals = generator.generate(&closes, &trend, &inputs).unwrap();
        for i in 0..n {
            if let Some(s) = signals.get(i) {
                assert!(!(s.long_entry && s.short_entry), "bar {i}");
            }
        }
        let (longs, shorts) = signals.entry_counts();
        assert!(longs + shorts > 0, "series should raise some entries");
    }
}
