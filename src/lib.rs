use anyhow::{Context, Result};
use std::sync::Arc;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

#[cfg(test)]
mod testing;

// ─── Log level ────────────────────────────────────────────────────────────────

/// Controls the verbosity of tablesync's internal tracing output.
///
/// Pass to [`init_tracing`] before calling any async entry point.
///
/// | Variant | `tracing` level | When to use                              |
/// |---------|-----------------|------------------------------------------|
/// | `Error` | `error`         | `--quiet` / CI scripting                 |
/// | `Info`  | `info`          | Default: every applied DDL statement     |
/// | `Debug` | `debug`         | `--verbose`: metadata queries too        |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    #[default]
    Info,
    Debug,
}

/// Initialise the global `tracing` subscriber for tablesync.
///
/// Respects `RUST_LOG` when set, falling back to `level` otherwise. Call this
/// once at startup; library consumers who manage their own subscriber should
/// skip it.
///
/// Only available with the `cli` feature (pulls in `tracing-subscriber`).
#[cfg(feature = "cli")]
pub fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;

    let default_filter = match level {
        LogLevel::Error => "tablesync=error",
        LogLevel::Info => "tablesync=info",
        LogLevel::Debug => "tablesync=debug",
    };

    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

// ─── Public API Facade ───

pub use application::monitoring::{MonitoringSession, PerfReport};
pub use application::normalizer::{normalize, raw_column};
pub use domain::ddl::DdlStep;
pub use domain::diff_result::{DiffResult, Drift};
pub use domain::error::SpecError;
pub use domain::ports::Session;
pub use domain::spec::{RawTableSpec, TableSpec};
pub use domain::sync_report::{Diagnostic, StepStatus, SyncMode, SyncReport, SyncState};
pub use domain::value_objects::{ExecOutcome, RowMap};
pub use infrastructure::config::{AppConfig, DbConfig, SyncConfig};
pub use infrastructure::db::client::{connect, SqlxSession};

use crate::application::executor::SyncExecutor;

// ─── Public entry points ───

/// Compare one table spec with the live schema. Issues metadata reads only.
pub async fn check(session: &dyn Session, spec: &RawTableSpec) -> Result<DiffResult> {
    let spec = normalize(spec)?;
    SyncExecutor::new(session).check(&spec).await
}

/// Check one table and render the DDL a sync would run, without running it.
pub async fn plan(session: &dyn Session, spec: &RawTableSpec) -> Result<SyncReport> {
    let spec = normalize(spec)?;
    SyncExecutor::new(session).plan(&spec).await
}

/// Bring one table in line with its spec.
///
/// Returns `Err` for an invalid spec (before touching the database) or when
/// the live schema cannot be read. Failed DDL statements are recorded in the
/// report and do not stop the remaining steps.
pub async fn sync(session: &dyn Session, spec: &RawTableSpec) -> Result<SyncReport> {
    let spec = normalize(spec)?;
    SyncExecutor::new(session).sync(&spec).await
}

/// Validate every spec up front so a bad one fails before any table is touched.
fn normalize_all(specs: &[RawTableSpec]) -> Result<Vec<TableSpec>> {
    Ok(specs.iter().map(normalize).collect::<Result<Vec<_>, _>>()?)
}

/// [`check`] each spec in turn. A metadata read that fails aborts the batch,
/// naming the table it failed on.
pub async fn check_all(session: &dyn Session, specs: &[RawTableSpec]) -> Result<Vec<DiffResult>> {
    let executor = SyncExecutor::new(session);
    let mut results = Vec::with_capacity(specs.len());
    for spec in normalize_all(specs)? {
        let diff = executor
            .check(&spec)
            .await
            .with_context(|| format!("Failed to check table {}", spec.name))?;
        results.push(diff);
    }
    Ok(results)
}

/// [`plan`] each spec in turn. Aborts like [`check_all`].
pub async fn plan_all(session: &dyn Session, specs: &[RawTableSpec]) -> Result<Vec<SyncReport>> {
    let executor = SyncExecutor::new(session);
    let mut reports = Vec::with_capacity(specs.len());
    for spec in normalize_all(specs)? {
        let report = executor
            .plan(&spec)
            .await
            .with_context(|| format!("Failed to plan table {}", spec.name))?;
        reports.push(report);
    }
    Ok(reports)
}

/// [`sync`] each spec in turn, in the order given.
///
/// A failed DDL statement on one table does not stop the next table. A
/// metadata read that fails is different: the live schema of that table is
/// unknown, so the batch stops there with an error naming the table. Tables
/// already synced keep their changes.
pub async fn sync_all(session: &dyn Session, specs: &[RawTableSpec]) -> Result<Vec<SyncReport>> {
    let executor = SyncExecutor::new(session);
    let mut reports = Vec::with_capacity(specs.len());
    for spec in normalize_all(specs)? {
        let report = executor
            .sync(&spec)
            .await
            .with_context(|| format!("Failed to sync table {}", spec.name))?;
        reports.push(report);
    }
    Ok(reports)
}

/// Connect with `cfg.database` and sync (or, with `dry_run`, plan) every
/// configured table.
pub async fn run(cfg: &AppConfig, dry_run: bool) -> Result<Vec<SyncReport>> {
    let (reports, _) = run_with_timing(cfg, dry_run).await?;
    Ok(reports)
}

/// [`run`] with per-statement timings.
pub async fn run_with_timing(cfg: &AppConfig, dry_run: bool) -> Result<(Vec<SyncReport>, PerfReport)> {
    let report = PerfReport::new();
    let session = MonitoringSession::new(Arc::new(connect(&cfg.database).await?), Arc::clone(&report));

    let reports = if dry_run || cfg.sync.dry_run {
        plan_all(&session, &cfg.tables).await?
    } else {
        sync_all(&session, &cfg.tables).await?
    };

    let perf = report.lock().map(|r| r.clone()).unwrap_or_default();
    Ok((reports, perf))
}
