//! Configuration validation trait.

use crate::error::PipelineError;

/// Parameter sets that must be range-checked before any computation.
pub trait Validate {
    /// Return the first out-of-range field as `InvalidConfiguration`.
    fn validate(&self) -> Result<(), PipelineError>;
}
