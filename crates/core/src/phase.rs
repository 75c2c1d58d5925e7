//! Pipeline phases.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One step of a pipeline run. Phases always execute in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Drop,
    Create,
    Copy,
    Insert,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Drop, Phase::Create, Phase::Copy, Phase::Insert];

    /// Drop and recreate every table.
    pub const CREATE_TABLES: [Phase; 2] = [Phase::Drop, Phase::Create];

    /// Load staging and populate the star schema.
    pub const ETL: [Phase; 2] = [Phase::Copy, Phase::Insert];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drop => "drop",
            Self::Create => "create",
            Self::Copy => "copy",
            Self::Insert => "insert",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "create" => Ok(Self::Create),
            "copy" => Ok(Self::Copy),
            "insert" => Ok(Self::Insert),
            other => Err(format!("unknown phase '{}'", other)),
        }
    }
}
