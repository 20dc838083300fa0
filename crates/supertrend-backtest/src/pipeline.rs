//! End-to-end run: bands, trend, signals, then the simulator.

use serde::{Deserialize, Serialize};
use supertrend_core::error::{DataError, PipelineError, PipelineResult};
use supertrend_core::traits::Validate;
use supertrend_core::types::BarSeries;
use supertrend_indicators::{BandParams, TrendSeries, VolatilityBands};
use supertrend_signals::{OscillatorInputs, OscillatorParams, SignalGenerator, SignalParams};
use tracing::{info, instrument};

use crate::engine::{BacktestConfig, BacktestEngine};
use crate::report::BacktestReport;

const DAY_MS: i64 = 86_400_000;

/// Every parameter of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub bands: BandParams,
    /// Direction assumed at the first usable bar
    pub seed_uptrend: bool,
    pub signals: SignalParams,
    pub oscillators: OscillatorParams,
    pub backtest: BacktestConfig,
    /// Calendar days, counted back from the last bar, replayed by the simulator
    pub window_days: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bands: BandParams::default(),
            seed_uptrend: true,
            signals: SignalParams::default(),
            oscillators: OscillatorParams::default(),
            backtest: BacktestConfig::default(),
            window_days: 30,
        }
    }
}

impl Validate for PipelineConfig {
    fn validate(&self) -> Result<(), PipelineError> {
        self.bands.validate()?;
        self.signals.validate()?;
        self.oscillators.validate()?;
        self.backtest.validate()?;
        if !(7..=60).contains(&self.window_days) {
            return Err(PipelineError::invalid_config(
                "window_days",
                self.window_days,
                "must be between 7 and 60",
            ));
        }
        Ok(())
    }
}

/// Runs the whole computation for one bar series.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    bands: VolatilityBands,
    generator: SignalGenerator,
    engine: BacktestEngine,
}

impl Pipeline {
    /// Validate the configuration and build every stage.
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            bands: VolatilityBands::new(config.bands)?,
            generator: SignalGenerator::new(config.signals)?,
            engine: BacktestEngine::new(config.backtest.clone())?,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run with the bundled RSI and MACD as oscillator inputs.
    pub fn run(&self, series: &BarSeries) -> PipelineResult<BacktestReport> {
        if series.is_empty() {
            return Err(DataError::NoDataAvailable.into());
        }
        let inputs = OscillatorInputs::compute(&series.closes(), &self.config.oscillators)?;
        self.run_with_inputs(series, &inputs)
    }

    /// Run with externally computed oscillator series.
    #[instrument(skip_all, fields(symbol = %series.symbol, bars = series.len()))]
    pub fn run_with_inputs(
        &self,
        series: &BarSeries,
        inputs: &OscillatorInputs,
    ) -> PipelineResult<BacktestReport> {
        if series.is_empty() {
            return Err(DataError::NoDataAvailable.into());
        }
        inputs.validate(series.len())?;

        // Fail before any recurrence work if no bar could ever carry a signal
        let required = self.required_bars(inputs)?;
        if series.len() < required {
            return Err(PipelineError::InsufficientData {
                required,
                available: series.len(),
            });
        }

        let closes = series.closes();
        let raw = self.bands.build(&series.highs(), &series.lows(), &closes)?;
        let trend = TrendSeries::compute(&closes, &raw, self.config.seed_uptrend)?;
        let signals = self.generator.generate(&closes, &trend, inputs)?;

        let from = self.window_start(series);
        info!(
            window_start = from,
            signal_start = signals.start(),
            "replaying analysis window"
        );
        let result = self.engine.run(series.bars(), &signals, from)?;

        Ok(BacktestReport::new(
            series,
            self.config.clone(),
            trend.trend_lines(),
            &signals,
            result,
        ))
    }

    /// Minimum series length for at least one bar to carry a signal.
    pub fn required_bars(&self, inputs: &OscillatorInputs) -> PipelineResult<usize> {
        let available = inputs.momentum.len();
        let oscillators = inputs.first_defined()?.ok_or(PipelineError::InsufficientData {
            required: available + 1,
            available,
        })?;
        let trend_start = self.config.bands.period.saturating_sub(1).max(1);
        Ok((trend_start.max(oscillators) + 2).max(self.bands.min_bars()))
    }

    /// First bar inside the analysis window, counted back from the last
    /// bar's timestamp.
    pub fn window_start(&self, series: &BarSeries) -> usize {
        let Some(last) = series.last() else {
            return 0;
        };
        let cutoff = last.timestamp - i64::from(self.config.window_days) * DAY_MS;
        series.index_at_or_after(cutoff)
    }
}
