//! Core data types for the pipeline.

mod direction;
mod ohlcv;
mod timeframe;

pub use direction::Direction;
pub use ohlcv::{Bar, BarSeries};
pub use timeframe::Timeframe;
