//! Pipeline run metrics.
//!
//! Collected in memory while a run executes and logged as a summary when it
//! finishes.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Histogram for statement latency.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 10ms, 100ms, 1s, 10s, 1m, 5m, 30m
    buckets: [AtomicU64; 7],
    sum: AtomicU64,
    count: AtomicU64,
    max: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 7] = [10, 100, 1_000, 10_000, 60_000, 300_000, 1_800_000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
            max: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.max.fetch_max(ms, Ordering::Relaxed);

        let last = Self::BUCKET_BOUNDS.len() - 1;
        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(last);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn max(&self) -> u64 {
        self.max.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Totals of one completed phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub phase: String,
    pub statements: u64,
    pub rows_affected: u64,
    pub elapsed_ms: u64,
}

/// Metrics of one pipeline run.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    pub statements_executed: Counter,
    pub statements_failed: Counter,
    pub rows_affected: Counter,
    pub statement_latency_ms: Histogram,
    phases: Mutex<Vec<PhaseTiming>>,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful statement.
    pub fn record_statement(&self, rows: u64, elapsed_ms: u64) {
        self.statements_executed.inc();
        self.rows_affected.inc_by(rows);
        self.statement_latency_ms.observe(elapsed_ms);
    }

    pub fn record_failure(&self) {
        self.statements_failed.inc();
    }

    pub fn record_phase(&self, timing: PhaseTiming) {
        self.phases.lock().push(timing);
    }

    pub fn phases(&self) -> Vec<PhaseTiming> {
        self.phases.lock().clone()
    }

    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            statements_executed: self.statements_executed.get(),
            statements_failed: self.statements_failed.get(),
            rows_affected: self.rows_affected.get(),
            statement_latency_mean_ms: self.statement_latency_ms.mean(),
            statement_latency_max_ms: self.statement_latency_ms.max(),
            phases: self.phases(),
        }
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub statements_executed: u64,
    pub statements_failed: u64,
    pub rows_affected: u64,
    pub statement_latency_mean_ms: f64,
    pub statement_latency_max_ms: u64,
    pub phases: Vec<PhaseTiming>,
}

impl MetricsSnapshot {
    /// Logs the snapshot as one structured event.
    pub fn log(&self) {
        tracing::info!(
            statements = self.statements_executed,
            failed = self.statements_failed,
            rows = self.rows_affected,
            mean_ms = format!("{:.1}", self.statement_latency_mean_ms),
            max_ms = self.statement_latency_max_ms,
            "Pipeline metrics"
        );
        for phase in &self.phases {
            tracing::info!(
                phase = %phase.phase,
                statements = phase.statements,
                rows = phase.rows_affected,
                elapsed_ms = phase.elapsed_ms,
                "Phase summary"
            );
        }
    }
}
