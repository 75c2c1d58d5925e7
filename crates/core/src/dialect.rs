//! SQL dialects the pipeline can target.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Target warehouse dialect.
///
/// Redshift is the production target. Postgres shares the wire protocol and
/// almost all of the SQL, and is used for local runs and integration tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Redshift,
    Postgres,
}

impl Dialect {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Redshift => "redshift",
            Self::Postgres => "postgres",
        }
    }

    /// Column definition for an auto-incrementing surrogate key.
    pub fn identity_column(&self, column: &str) -> String {
        match self {
            Self::Redshift => format!("{} INT IDENTITY(0,1) NOT NULL", column),
            Self::Postgres => format!("{} INT GENERATED BY DEFAULT AS IDENTITY NOT NULL", column),
        }
    }

    /// Whether `COPY ... FROM 's3://...'` is available.
    pub fn supports_s3_copy(&self) -> bool {
        matches!(self, Self::Redshift)
    }

    /// Default client port.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Redshift => 5439,
            Self::Postgres => 5432,
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redshift" => Ok(Self::Redshift),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(format!("unknown dialect '{}'", other)),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
