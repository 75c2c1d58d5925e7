use clap::{Parser, Subcommand};

use std::path::PathBuf;

use etl_core::{Dialect, ExecutionMode, Phase, UserLevelPolicy};

#[derive(Parser)]
#[command(name = "songplay-etl")]
#[command(version, about = "Star-schema ETL for song play analytics", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the INI configuration file
    #[arg(long, short = 'c', global = true, env = "DWH_CONFIG", default_value = "dwh.cfg")]
    pub config: PathBuf,

    /// SQL dialect (overrides [PIPELINE] DIALECT)
    #[arg(long, global = true)]
    pub dialect: Option<Dialect>,

    /// Execution mode (overrides [PIPELINE] EXECUTION_MODE)
    #[arg(long, global = true)]
    pub mode: Option<ExecutionMode>,

    /// Level-change handling for the users dimension (overrides [PIPELINE] USER_LEVEL_POLICY)
    #[arg(long, global = true)]
    pub user_policy: Option<UserLevelPolicy>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Drop, create, copy and insert
    Run,
    /// Drop and recreate every table
    CreateTables,
    /// Copy staging data and populate the star schema
    Etl,
    /// Print the SQL plan without connecting
    Render {
        /// Only render this phase (repeatable)
        #[arg(long)]
        phase: Vec<Phase>,
    },
    /// Check the warehouse connection
    Check,
    /// Print the row count of every table
    Counts,
    /// Load staging tables from local JSON files
    LoadLocal {
        /// Event log file or directory
        #[arg(long)]
        events: Option<PathBuf>,
        /// Song metadata file or directory
        #[arg(long)]
        songs: Option<PathBuf>,
    },
}

impl Commands {
    /// Phases the command executes, if it executes the plan.
    pub fn phases(&self) -> Option<&'static [Phase]> {
        match self {
            Self::Run => Some(&Phase::ALL),
            Self::CreateTables => Some(&Phase::CREATE_TABLES),
            Self::Etl => Some(&Phase::ETL),
            _ => None,
        }
    }
}
