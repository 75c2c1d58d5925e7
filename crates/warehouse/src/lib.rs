//! Warehouse side of the songplay ETL pipeline.
//!
//! Renders the DDL, COPY and INSERT…SELECT statements, orders them into a
//! [`QueryPlan`] and runs the plan over a single session.

pub mod client;
pub mod config;
pub mod copy;
pub mod health;
pub mod local_load;
pub mod plan;
pub mod query;
pub mod runner;
pub mod schema;
pub mod transform;

pub use client::WarehouseClient;
pub use config::WarehouseConfig;
pub use health::check_connection;
pub use plan::{PlanSettings, QueryPlan, Statement};
pub use query::{row_counts, TableCount};
pub use runner::{RunReport, Runner, StatementExecutor};
