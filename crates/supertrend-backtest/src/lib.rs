//! Backtesting engine.
//!
//! Replays a bar series holding at most one long and one short position,
//! each with a stop-loss / take-profit bracket, and reports the trade
//! ledger plus portfolio statistics.

mod engine;
mod pipeline;
mod position;
mod report;
mod statistics;

pub use engine::{BacktestConfig, BacktestEngine, BacktestResult};
pub use pipeline::{Pipeline, PipelineConfig};
pub use position::{ExitReason, Position, PositionSlot, TradeRecord};
pub use report::{BacktestReport, ReportWindow, NO_TRADES_MESSAGE};
pub use statistics::PortfolioStats;
