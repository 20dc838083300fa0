//! Configuration structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use supertrend_backtest::{BacktestConfig, PipelineConfig};
use supertrend_core::error::PipelineError;
use supertrend_core::traits::Validate;
use supertrend_core::types::Timeframe;
use supertrend_indicators::{AtrSmoothing, BandParams};
use supertrend_signals::{OscillatorParams, SignalParams};

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub strategy: StrategySettings,
    #[serde(default)]
    pub backtest: BacktestSettings,
}

impl AppConfig {
    /// Parameters for one pipeline run.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let s = &self.strategy;
        PipelineConfig {
            bands: BandParams {
                period: s.atr_period,
                multiplier: s.atr_multiplier,
                smoothing: s.atr_smoothing,
            },
            seed_uptrend: s.seed_uptrend,
            signals: SignalParams {
                risk_reward: s.risk_reward,
                oversold: s.oversold,
                overbought: s.overbought,
            },
            oscillators: OscillatorParams {
                rsi_period: s.rsi_period,
                macd_fast: s.macd_fast,
                macd_slow: s.macd_slow,
                macd_signal: s.macd_signal,
            },
            backtest: BacktestConfig {
                initial_cash: self.backtest.initial_cash,
                fee_rate: self.backtest.fee_rate,
                position_fraction: self.backtest.position_fraction,
            },
            window_days: self.backtest.window_days,
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<(), PipelineError> {
        self.pipeline_config().validate()
    }
}

/// General app settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    /// Symbol label shown in reports
    pub symbol: String,
    pub timeframe: Timeframe,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "supertrend".to_string(),
            symbol: "BTC-USD".to_string(),
            timeframe: Timeframe::Minute15,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// Directory for daily rolling log files
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// Indicator and signal parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub atr_smoothing: AtrSmoothing,
    pub seed_uptrend: bool,
    pub risk_reward: f64,
    pub rsi_period: usize,
    pub oversold: f64,
    pub overbought: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for StrategySettings {
    fn default() -> Self {
        let bands = BandParams::default();
        let signals = SignalParams::default();
        let oscillators = OscillatorParams::default();
        Self {
            atr_period: bands.period,
            atr_multiplier: bands.multiplier,
            atr_smoothing: bands.smoothing,
            seed_uptrend: true,
            risk_reward: signals.risk_reward,
            rsi_period: oscillators.rsi_period,
            oversold: signals.oversold,
            overbought: signals.overbought,
            macd_fast: oscillators.macd_fast,
            macd_slow: oscillators.macd_slow,
            macd_signal: oscillators.macd_signal,
        }
    }
}

/// Backtest settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub initial_cash: Decimal,
    pub fee_rate: Decimal,
    pub position_fraction: Decimal,
    pub window_days: u32,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        let engine = BacktestConfig::default();
        Self {
            initial_cash: engine.initial_cash,
            fee_rate: engine.fee_rate,
            position_fraction: engine.position_fraction,
            window_days: 30,
        }
    }
}
