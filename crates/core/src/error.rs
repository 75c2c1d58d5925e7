//! Unified error types for the ETL pipeline.
//!
//! Error codes:
//! - CFG_001-002: Configuration errors
//! - DB_001-003: Warehouse errors
//! - LOAD_001: Local staging input errors

use crate::phase::Phase;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCode {
    /// CFG_001: Required key is missing or the source is unreadable
    Missing,
    /// CFG_002: Value failed validation
    InvalidValue,
}

impl ConfigErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Missing => "CFG_001",
            Self::InvalidValue => "CFG_002",
        }
    }
}

/// Warehouse error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorCode {
    /// DB_001: Could not connect to the warehouse
    ConnectFailed,
    /// DB_002: A pipeline statement failed
    StatementFailed,
    /// DB_003: A read query failed
    QueryFailed,
}

impl DbErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConnectFailed => "DB_001",
            Self::StatementFailed => "DB_002",
            Self::QueryFailed => "DB_003",
        }
    }
}

/// Unified error type for the pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with code.
    #[error("[{code}] {message}")]
    Config { code: &'static str, message: String },

    /// Warehouse error with code.
    #[error("[{code}] {message}")]
    Database { code: &'static str, message: String },

    /// A statement of the plan failed; carries the SQL that was sent.
    #[error("[DB_002] {phase} statement '{label}' failed: {message}\n{sql}")]
    Statement {
        phase: Phase,
        label: String,
        sql: String,
        message: String,
    },

    #[error("[LOAD_001] {0}")]
    Load(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(code: ConfigErrorCode, msg: impl Into<String>) -> Self {
        Self::Config {
            code: code.code(),
            message: msg.into(),
        }
    }

    /// Create a warehouse error.
    pub fn database(code: DbErrorCode, msg: impl Into<String>) -> Self {
        Self::Database {
            code: code.code(),
            message: msg.into(),
        }
    }

    pub fn missing(msg: impl Into<String>) -> Self {
        Self::config(ConfigErrorCode::Missing, msg)
    }

    pub fn invalid_value(key: &str, msg: impl std::fmt::Display) -> Self {
        Self::config(ConfigErrorCode::InvalidValue, format!("{}: {}", key, msg))
    }

    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::Config { code, .. } => Some(*code),
            Self::Database { code, .. } => Some(*code),
            Self::Statement { .. } => Some(DbErrorCode::StatementFailed.code()),
            Self::Load(_) => Some("LOAD_001"),
            _ => None,
        }
    }

    /// Process exit status for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Database { .. } => 3,
            Self::Statement { .. } => 4,
            Self::Load(_) | Self::Io(_) | Self::Serialization(_) => 5,
            Self::Internal(_) => 1,
        }
    }
}
