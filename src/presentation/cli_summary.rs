use crate::application::monitoring::PerfReport;
use crate::domain::sync_report::{DiagnosticLevel, SyncMode, SyncReport};
use colored::*;
use tabled::settings::{object::Columns, Alignment, Modify, Style};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct TableRow {
    table: String,
    status: String,
    planned: String,
    applied: String,
    skipped: String,
    failed: String,
}

fn status_label(report: &SyncReport) -> String {
    if !report.diff.table_exists() {
        match report.mode {
            SyncMode::Check => "missing".yellow().to_string(),
            SyncMode::Sync => "created".green().to_string(),
        }
    } else if report.is_in_sync() {
        "in sync".green().to_string()
    } else {
        "drifted".yellow().to_string()
    }
}

pub fn print_summary(reports: &[SyncReport]) {
    println!();

    let mode = reports.first().map_or(SyncMode::Check, |r| r.mode);
    let title = match mode {
        SyncMode::Check => "TABLESYNC PLAN",
        SyncMode::Sync => "TABLESYNC SYNC",
    };
    println!("{}", title.bold().cyan());
    println!();

    if reports.is_empty() {
        println!("{}", "No tables configured.".italic());
        return;
    }

    let rows: Vec<TableRow> = reports
        .iter()
        .map(|r| TableRow {
            table: r.table.bold().to_string(),
            status: status_label(r),
            planned: r.summary.planned.to_string(),
            applied: r.summary.applied.to_string().green().to_string(),
            skipped: r.summary.skipped.to_string().yellow().to_string(),
            failed: r.summary.failed.to_string().red().to_string(),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..=5)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let diagnostics: Vec<_> = reports.iter().flat_map(|r| &r.diagnostics).collect();
    if !diagnostics.is_empty() {
        println!();
        for d in diagnostics {
            let tag = match d.level {
                DiagnosticLevel::Notice => "notice ".dimmed(),
                DiagnosticLevel::Warning => "warning".yellow(),
                DiagnosticLevel::Error => "error  ".red(),
            };
            println!("  {} {}", tag, d.message);
        }
    }
    println!();
}

// ─── Performance summary ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PerfRow {
    operation: String,
    statement: String,
    #[tabled(rename = "rows")]
    rows: String,
    #[tabled(rename = "time (ms)")]
    duration_ms: String,
}

/// Print a performance timing table to stdout.
pub fn print_perf_summary(report: &PerfReport) {
    if report.timings.is_empty() {
        return;
    }

    println!("{}", "PERFORMANCE".bold().cyan());

    let rows: Vec<PerfRow> = report
        .timings
        .iter()
        .map(|t| PerfRow {
            operation: t.operation.dimmed().to_string(),
            statement: if t.ok {
                t.statement.bold().to_string()
            } else {
                t.statement.red().to_string()
            },
            rows: t.rows.to_string(),
            duration_ms: format_duration(t.duration_ms),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..=3)).with(Alignment::right()))
        .to_string();

    println!("{table}");

    println!(
        "  Total: {} metadata read(s)  ·  {} DDL statement(s)  ·  {} ms elapsed",
        report.total_queries.to_string().bold(),
        report.total_ddl.to_string().bold(),
        format_duration(report.total_ms),
    );
    println!();
}

fn format_duration(ms: u128) -> String {
    if ms >= 1_000 {
        format!("{:.1}s", ms as f64 / 1_000.0).yellow().to_string()
    } else if ms >= 100 {
        ms.to_string().yellow().to_string()
    } else {
        ms.to_string().green().to_string()
    }
}
