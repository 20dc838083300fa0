//! Technical indicators for the SuperTrend pipeline.
//!
//! - Moving averages (SMA, EMA, Wilder's RMA)
//! - Auxiliary oscillators (RSI, MACD), consumed by the signal generator
//!   as externally computed series
//! - Volatility bands (ATR offset from the bar midpoint)
//! - The SuperTrend state recurrence over those bands

pub mod momentum;
pub mod moving_average;
pub mod supertrend;
pub mod volatility;

pub use momentum::{Macd, MacdOutput, Rsi};
pub use moving_average::{Ema, Rma, Sma};
pub use supertrend::{TrendSeries, TrendState};
pub use volatility::{Atr, AtrSmoothing, BandParams, RawBands, VolatilityBands};
