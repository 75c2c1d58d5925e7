//! The ordered statement lists a pipeline run executes.

use serde::Serialize;
use std::fmt::Write;

use etl_core::{CopyOptions, Dialect, Phase, Result, Table, UserLevelPolicy};

use crate::{copy, schema, transform};

/// One SQL statement of the plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub phase: Phase,
    pub table: Table,
    pub sql: String,
}

impl Statement {
    fn new(phase: Phase, table: Table, sql: String) -> Self {
        Self { phase, table, sql }
    }

    /// Short human label, e.g. `create songplays`.
    pub fn label(&self) -> String {
        format!("{} {}", self.phase, self.table)
    }
}

/// Inputs of plan generation.
#[derive(Debug, Clone)]
pub struct PlanSettings {
    pub dialect: Dialect,
    pub user_level_policy: UserLevelPolicy,
    /// Required to render the copy phase on dialects that support COPY.
    pub copy: Option<CopyOptions>,
}

/// Drop, create, copy and insert lists, each executed in list order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryPlan {
    pub drop: Vec<Statement>,
    pub create: Vec<Statement>,
    pub copy: Vec<Statement>,
    pub insert: Vec<Statement>,
}

impl QueryPlan {
    /// Builds every phase.
    ///
    /// The copy phase is empty when the dialect cannot COPY from S3 or when
    /// no copy options were supplied; staging is then loaded some other way.
    pub fn build(settings: &PlanSettings) -> Result<Self> {
        let copy_statements = match (&settings.copy, settings.dialect.supports_s3_copy()) {
            (Some(options), true) => copy::copy_statements(options)?,
            _ => Vec::new(),
        };

        Ok(Self {
            drop: wrap(Phase::Drop, schema::drop_statements()),
            create: wrap(Phase::Create, schema::create_statements(settings.dialect)),
            copy: wrap(Phase::Copy, copy_statements),
            insert: wrap(
                Phase::Insert,
                transform::insert_statements(settings.user_level_policy),
            ),
        })
    }

    pub fn statements(&self, phase: Phase) -> &[Statement] {
        match phase {
            Phase::Drop => &self.drop,
            Phase::Create => &self.create,
            Phase::Copy => &self.copy,
            Phase::Insert => &self.insert,
        }
    }

    /// Statements of the selected phases, in phase order.
    pub fn iter_phases<'a>(&'a self, phases: &'a [Phase]) -> impl Iterator<Item = &'a Statement> + 'a {
        let mut selected = phases.to_vec();
        selected.sort();
        selected.dedup();
        selected
            .into_iter()
            .flat_map(move |phase| self.statements(phase).iter())
    }

    pub fn len(&self) -> usize {
        self.drop.len() + self.create.len() + self.copy.len() + self.insert.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// SQL script of the selected phases, with a comment header per statement.
    pub fn render(&self, phases: &[Phase]) -> String {
        let mut out = String::new();
        for statement in self.iter_phases(phases) {
            let _ = writeln!(out, "-- {}", statement.label());
            let _ = writeln!(out, "{}\n", statement.sql.trim());
        }
        out
    }
}

fn wrap(phase: Phase, statements: Vec<(Table, String)>) -> Vec<Statement> {
    statements
        .into_iter()
        .map(|(table, sql)| Statement::new(phase, table, sql))
        .collect()
}
