//! Sequential execution of a query plan.
//!
//! Statements run one at a time, in phase order and list order, on a single
//! session. The first failure stops the run.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use etl_core::{Error, ExecutionMode, Phase, Result};
use telemetry::{PhaseTiming, PipelineMetrics};

use crate::plan::{QueryPlan, Statement};

/// Anything that can run SQL text and report affected rows.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<u64>;
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub mode: ExecutionMode,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub phases: Vec<PhaseTiming>,
}

impl RunReport {
    pub fn statements(&self) -> u64 {
        self.phases.iter().map(|p| p.statements).sum()
    }
}

/// Executes plans against a [`StatementExecutor`].
pub struct Runner<'a> {
    executor: &'a dyn StatementExecutor,
    mode: ExecutionMode,
    metrics: &'a PipelineMetrics,
}

impl<'a> Runner<'a> {
    pub fn new(
        executor: &'a dyn StatementExecutor,
        mode: ExecutionMode,
        metrics: &'a PipelineMetrics,
    ) -> Self {
        Self {
            executor,
            mode,
            metrics,
        }
    }

    /// Runs the selected phases of `plan`.
    ///
    /// In transaction mode the run is wrapped in `BEGIN`/`COMMIT` and rolled
    /// back when any statement fails.
    pub async fn run(&self, plan: &QueryPlan, phases: &[Phase]) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", %run_id, mode = ?self.mode);
        self.run_inner(run_id, plan, phases).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, plan: &QueryPlan, phases: &[Phase]) -> Result<RunReport> {
        let started_at = Utc::now();
        let start = Instant::now();

        let mut selected = phases.to_vec();
        selected.sort();
        selected.dedup();

        info!(
            phases = ?selected,
            statements = plan.iter_phases(&selected).count(),
            "Starting pipeline run"
        );

        if self.mode == ExecutionMode::Transaction {
            self.control("BEGIN").await?;
        }

        let mut timings = Vec::with_capacity(selected.len());
        for phase in &selected {
            match self.run_phase(*phase, plan.statements(*phase)).await {
                Ok(timing) => timings.push(timing),
                Err(e) => {
                    if self.mode == ExecutionMode::Transaction {
                        if let Err(rollback) = self.control("ROLLBACK").await {
                            error!(error = %rollback, "Rollback failed");
                        } else {
                            warn!("Run rolled back");
                        }
                    }
                    return Err(e);
                }
            }
        }

        if self.mode == ExecutionMode::Transaction {
            self.control("COMMIT").await?;
        }

        let report = RunReport {
            run_id,
            mode: self.mode,
            started_at,
            elapsed_ms: start.elapsed().as_millis() as u64,
            phases: timings,
        };

        info!(
            statements = report.statements(),
            elapsed_ms = report.elapsed_ms,
            "Pipeline run complete"
        );
        Ok(report)
    }

    async fn run_phase(&self, phase: Phase, statements: &[Statement]) -> Result<PhaseTiming> {
        let start = Instant::now();

        if statements.is_empty() {
            if phase == Phase::Copy {
                warn!("Copy phase has no statements; staging tables must be loaded separately");
            } else {
                warn!(%phase, "Phase has no statements");
            }
        }

        let mut rows_affected = 0;
        for statement in statements {
            rows_affected += self.run_statement(statement).await?;
        }

        let timing = PhaseTiming {
            phase: phase.to_string(),
            statements: statements.len() as u64,
            rows_affected,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            %phase,
            statements = timing.statements,
            rows = timing.rows_affected,
            elapsed_ms = timing.elapsed_ms,
            "Phase complete"
        );
        self.metrics.record_phase(timing.clone());
        Ok(timing)
    }

    async fn run_statement(&self, statement: &Statement) -> Result<u64> {
        let label = statement.label();
        debug!(statement = %label, "Executing");
        let start = Instant::now();

        match self.executor.execute(&statement.sql).await {
            Ok(rows) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                self.metrics.record_statement(rows, elapsed_ms);
                debug!(statement = %label, rows, elapsed_ms, "Executed");
                Ok(rows)
            }
            Err(e) => {
                self.metrics.record_failure();
                let message = driver_message(e);
                error!(statement = %label, error = %message, "Statement failed");
                Err(Error::Statement {
                    phase: statement.phase,
                    label,
                    sql: statement.sql.clone(),
                    message,
                })
            }
        }
    }

    async fn control(&self, sql: &str) -> Result<()> {
        debug!(command = sql, "Transaction control");
        self.executor.execute(sql).await.map(|_| ())
    }
}

/// Message of an executor error without its code prefix.
fn driver_message(err: Error) -> String {
    match err {
        Error::Database { message, .. } => message,
        other => other.to_string(),
    }
}
