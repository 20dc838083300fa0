//! Signal generation.
//!
//! A long entry needs three things on the same bar: the close crossing
//! above the SuperTrend line, the momentum oscillator oversold on the
//! previous bar, and MACD crossing above its signal line. Short entries
//! mirror this. Every usable bar also carries a stop/target bracket derived
//! from the trend line and the risk/reward ratio.

mod config;
mod generator;
mod inputs;

pub use config::{OscillatorParams, SignalParams};
pub use generator::{Signal, SignalGenerator, SignalSeries};
pub use inputs::OscillatorInputs;
