//! Data sources for the SuperTrend pipeline.

mod csv_source;

pub use csv_source::{parse_timestamp, CsvDataSource};
