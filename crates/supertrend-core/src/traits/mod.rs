//! Core traits for the pipeline.

mod data_source;
mod indicator;
mod validate;

pub use data_source::DataSource;
pub use indicator::{Indicator, MultiOutputIndicator};
pub use validate::Validate;
