//! Warehouse table catalogue.
//!
//! Two staging tables receive raw JSON, four dimension tables and one fact
//! table form the star schema. The orders below are the only orders the
//! pipeline ever touches tables in.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a table in the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableRole {
    Staging,
    Dimension,
    Fact,
}

/// Every table managed by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    StagingEvents,
    StagingSongs,
    Users,
    Songs,
    Artists,
    Time,
    Songplays,
}

impl Table {
    /// Fact table first so no table is dropped while still referenced.
    pub const DROP_ORDER: [Table; 7] = [
        Table::Songplays,
        Table::StagingEvents,
        Table::StagingSongs,
        Table::Users,
        Table::Songs,
        Table::Artists,
        Table::Time,
    ];

    /// Referenced tables are created before the tables pointing at them.
    pub const CREATE_ORDER: [Table; 7] = [
        Table::StagingEvents,
        Table::StagingSongs,
        Table::Users,
        Table::Artists,
        Table::Songs,
        Table::Time,
        Table::Songplays,
    ];

    /// Insert order of the transformations; artists precede songs.
    pub const LOAD_ORDER: [Table; 5] = [
        Table::Users,
        Table::Artists,
        Table::Songs,
        Table::Time,
        Table::Songplays,
    ];

    /// Staging tables filled by COPY.
    pub const STAGING: [Table; 2] = [Table::StagingEvents, Table::StagingSongs];

    pub fn name(&self) -> &'static str {
        match self {
            Self::StagingEvents => "staging_events",
            Self::StagingSongs => "staging_songs",
            Self::Users => "users",
            Self::Songs => "songs",
            Self::Artists => "artists",
            Self::Time => "time",
            Self::Songplays => "songplays",
        }
    }

    pub fn role(&self) -> TableRole {
        match self {
            Self::StagingEvents | Self::StagingSongs => TableRole::Staging,
            Self::Users | Self::Songs | Self::Artists | Self::Time => TableRole::Dimension,
            Self::Songplays => TableRole::Fact,
        }
    }

    /// Tables this table holds foreign keys into.
    pub fn references(&self) -> &'static [Table] {
        match self {
            Self::Songs => &[Table::Artists],
            Self::Songplays => &[Table::Time, Table::Users, Table::Songs, Table::Artists],
            _ => &[],
        }
    }

    pub fn is_staging(&self) -> bool {
        self.role() == TableRole::Staging
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
