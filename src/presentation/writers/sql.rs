use std::fmt::Write as FmtWrite;

use anyhow::Result;

use crate::domain::{
    ddl::DdlStep,
    ports::OutputWriter,
    sync_report::{StepStatus, SyncReport},
};

/// The planned or applied DDL as a reviewable script.
///
/// Guarded drops are commented out with their guard query, so running the
/// script by hand never drops a column that still holds data.
pub struct SqlWriter;

impl OutputWriter for SqlWriter {
    fn format(&self, reports: &[SyncReport]) -> Result<String> {
        let mut sql = String::new();

        writeln!(sql, "-- tablesync")?;
        writeln!(sql, "-- Tables: {}", reports.len())?;
        if let Some(first) = reports.first() {
            writeln!(sql, "-- Generated: {}", first.created_at)?;
        }
        writeln!(sql)?;

        for report in reports {
            writeln!(sql, "-- ============================================")?;
            writeln!(sql, "-- Table: {}", report.table)?;
            writeln!(sql, "-- Report: {}", report.report_id)?;
            writeln!(sql, "-- ============================================")?;
            writeln!(sql)?;

            if report.steps.is_empty() {
                writeln!(sql, "-- in sync, nothing to do")?;
                writeln!(sql)?;
            }

            for outcome in &report.steps {
                writeln!(sql, "-- {}", outcome.step)?;
                match &outcome.status {
                    StepStatus::Skipped { reason } => {
                        writeln!(sql, "-- skipped: {}", reason)?;
                        writeln!(sql, "-- {};", outcome.sql)?;
                    }
                    StepStatus::Failed { error } => {
                        writeln!(sql, "-- failed: {}", error)?;
                        writeln!(sql, "{};", outcome.sql)?;
                    }
                    _ if outcome.step.is_destructive() => {
                        if let DdlStep::DropColumnIfEmpty { table, column } = &outcome.step {
                            writeln!(
                                sql,
                                "-- only when `SELECT COUNT(*) FROM {} WHERE {} IS NOT NULL` is 0:",
                                table, column
                            )?;
                        }
                        writeln!(sql, "-- {};", outcome.sql)?;
                    }
                    _ => writeln!(sql, "{};", outcome.sql)?,
                }
                writeln!(sql)?;
            }

            for diag in &report.diagnostics {
                writeln!(sql, "-- {:?}: {}", diag.level, diag.message)?;
            }
        }

        Ok(sql)
    }

    fn extension(&self) -> &'static str {
        "sql"
    }
}
