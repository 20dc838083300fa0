//! Error types for the SuperTrend pipeline.

use thiserror::Error;

/// Top-level pipeline error.
///
/// Every variant carries enough context (bar index, timestamp, offending
/// value) to diagnose the failure without re-running the computation.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Insufficient data: need {required} bars, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid bar at index {index} (timestamp {timestamp}): {reason}")]
    InvalidBar {
        index: usize,
        timestamp: i64,
        reason: BarValidationError,
    },

    #[error("Invalid configuration: {field} = {value}: {reason}")]
    InvalidConfiguration {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Data error: {0}")]
    Data(#[from] DataError),
}

impl PipelineError {
    /// Build an `InvalidConfiguration` error for a field outside its range.
    pub fn invalid_config(
        field: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        PipelineError::InvalidConfiguration {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// True when the error means there was nothing usable to compute on,
    /// as opposed to a computation that ran and produced no trades.
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            PipelineError::InsufficientData { .. } | PipelineError::Data(DataError::NoDataAvailable)
        )
    }
}

/// Consistency violations of a single bar or of the bar ordering.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BarValidationError {
    #[error("prices must be finite: open={open}, high={high}, low={low}, close={close}")]
    NonFinite {
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },

    #[error("high ({high}) must be >= low ({low})")]
    HighBelowLow { high: f64, low: f64 },

    #[error("open ({open}) must be between low ({low}) and high ({high})")]
    OpenOutOfRange { open: f64, low: f64, high: f64 },

    #[error("close ({close}) must be between low ({low}) and high ({high})")]
    CloseOutOfRange { close: f64, low: f64, high: f64 },

    #[error("timestamp must be strictly after the previous bar ({previous})")]
    NonIncreasingTimestamp { previous: i64 },
}

/// Data source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
