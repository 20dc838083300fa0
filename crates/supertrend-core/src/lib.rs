//! Core types and traits for the SuperTrend backtester.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, BarSeries) with ingest-time validation
//! - Trade direction and timeframe types
//! - Error kinds shared by every stage of the pipeline
//! - Core traits for indicators, data sources and configuration validation

pub mod error;
pub mod traits;
pub mod types;

pub use error::{BarValidationError, DataError, PipelineError, PipelineResult};
pub use traits::*;
pub use types::*;
