use crate::domain::ports::Session;
use crate::domain::value_objects::{ExecOutcome, RowMap};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, instrument};

// ─── PerfReport ──────────────────────────────────────────────────────────────

/// A single timed statement.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OpTiming {
    /// Operation name: "query" or "execute".
    pub operation: &'static str,
    /// Leading keywords of the statement, e.g. "SHOW FIELDS" or "ALTER TABLE".
    pub statement: String,
    /// Elapsed wall time in milliseconds.
    pub duration_ms: u128,
    /// Rows returned (query) or affected (execute).
    pub rows: u64,
    pub ok: bool,
}

/// Accumulated statement timings for a single tablesync run.
///
/// Shared by every decorator instance of the run via `Arc<Mutex<_>>`.
/// After the run, pass to [`crate::presentation::cli_summary::print_perf_summary`]
/// to render a human-readable table.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct PerfReport {
    pub timings: Vec<OpTiming>,
    pub total_queries: usize,
    pub total_ddl: usize,
    pub total_ms: u128,
}

impl PerfReport {
    pub fn new() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::default()))
    }

    fn record(report: &Arc<Mutex<Self>>, timing: OpTiming) {
        if let Ok(mut r) = report.lock() {
            r.total_ms += timing.duration_ms;
            match timing.operation {
                "query" => r.total_queries += 1,
                _ => r.total_ddl += 1,
            }
            r.timings.push(timing);
        }
    }
}

/// First two words, which is enough to tell statements apart in a summary.
fn statement_kind(sql: &str) -> String {
    sql.split_whitespace().take(2).collect::<Vec<_>>().join(" ")
}

// ─── MonitoringSession ───────────────────────────────────────────────────────

/// Decorator: wraps any `Session`, measures wall time per statement, and
/// appends the result to the shared `PerfReport`.
pub struct MonitoringSession {
    inner: Arc<dyn Session>,
    report: Arc<Mutex<PerfReport>>,
}

impl MonitoringSession {
    pub fn new(inner: Arc<dyn Session>, report: Arc<Mutex<PerfReport>>) -> Self {
        Self { inner, report }
    }

    fn finish(&self, operation: &'static str, sql: &str, start: Instant, rows: u64, ok: bool) {
        let duration_ms = start.elapsed().as_millis();
        let statement = statement_kind(sql);
        debug!(operation, statement = %statement, rows, duration_ms, ok, "statement completed");
        PerfReport::record(
            &self.report,
            OpTiming {
                operation,
                statement,
                duration_ms,
                rows,
                ok,
            },
        );
    }
}

#[async_trait]
impl Session for MonitoringSession {
    fn driver(&self) -> &'static str {
        self.inner.driver()
    }

    #[instrument(name = "query", skip(self, sql), fields(db.statement = %statement_kind(sql)), level = "debug")]
    async fn query(&self, sql: &str) -> Result<Vec<RowMap>> {
        let start = Instant::now();
        let result = self.inner.query(sql).await;
        let rows = result.as_ref().map_or(0, |r| r.len() as u64);
        self.finish("query", sql, start, rows, result.is_ok());
        result
    }

    #[instrument(name = "execute", skip(self, sql), fields(db.statement = %statement_kind(sql)), level = "info")]
    async fn execute(&self, sql: &str) -> Result<ExecOutcome> {
        let start = Instant::now();
        let result = self.inner.execute(sql).await;
        let rows = result.as_ref().map_or(0, |o| o.rows_affected);
        self.finish("execute", sql, start, rows, result.is_ok());
        if result.is_ok() {
            info!(statement = %statement_kind(sql), "execute completed");
        }
        result
    }
}
