//! Core types, configuration, and validation for the songplay ETL pipeline.

pub mod config;
pub mod dialect;
pub mod error;
pub mod literal;
pub mod phase;
pub mod records;
pub mod tables;

pub use config::*;
pub use dialect::Dialect;
pub use error::{Error, Result};
pub use literal::JsonFormat;
pub use phase::Phase;
pub use records::*;
pub use tables::*;
