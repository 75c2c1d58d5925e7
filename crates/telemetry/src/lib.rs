//! Structured logging and run metrics for the songplay ETL pipeline.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::*;
pub use tracing_setup::*;
