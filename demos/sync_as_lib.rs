//! # tablesync: library usage example
//!
//! Three common patterns for consuming tablesync as a Rust library:
//!
//! 1. **From a config file**: simplest, mirrors the CLI
//! 2. **Specs built in code**: what an ORM layer does at model registration
//! 3. **Inspect the report**: walk the diff and step outcomes for custom logic
//!
//! Run with a config file:
//!   cargo run --example sync_as_lib -- tablesync.toml
//!
//! Run with the built-in specs (needs a local MySQL):
//!   cargo run --example sync_as_lib

use anyhow::Result;
use serde_json::json;
use tablesync::{
    presentation::writers::{all_writers, write_to_file, writer_for},
    raw_column, AppConfig, DbConfig, Drift, RawTableSpec, StepStatus, SyncReport,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some(path) => from_config_file(path).await,
        None => specs_in_code().await,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pattern 1: load config from a TOML file (same as the CLI does internally)
// ─────────────────────────────────────────────────────────────────────────────
async fn from_config_file(path: &str) -> Result<()> {
    println!("=== Pattern 1: from config file ({path}) ===\n");

    let cfg = AppConfig::load(path)?;
    let reports = tablesync::run(&cfg, cfg.sync.dry_run).await?;

    for writer in all_writers() {
        let written = write_to_file(&*writer, &reports, cfg.sync.output_dir.as_ref())?;
        println!("Written: {}", written.display());
    }

    print_summary(&reports);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Pattern 2: build the specs in code and hand over a session.
// The session is yours; tablesync only borrows it for the call.
// ─────────────────────────────────────────────────────────────────────────────
async fn specs_in_code() -> Result<()> {
    println!("=== Pattern 2: specs built in code ===\n");

    let db = DbConfig {
        driver: "mysql".into(),
        host: std::env::var("DB_HOST").unwrap_or_else(|_| "localhost".into()),
        port: 3306,
        dbname: "shop".into(),
        user: "shop".into(),
        password: "shop".into(),
    };
    let session = tablesync::connect(&db).await?;

    let mut customers = RawTableSpec {
        name: "customers".into(),
        ..Default::default()
    };
    customers
        .columns
        .insert("name".into(), raw_column("varchar(100)", false, None));
    customers
        .columns
        .insert("email".into(), raw_column("varchar(200)", true, None));
    if let Some(email) = customers.columns.get_mut("email") {
        email.db.unique = Some(true);
    }

    // the same shape an ORM would hand over as JSON
    let orders: RawTableSpec = serde_json::from_value(json!({
        "name": "orders",
        "columns": {
            "status": { "db": { "type": "varchar(20)", "null": false, "default": "new" } },
            "customer_id": { "db": { "type": "int", "foreign": { "table": "customers", "column": "ID" } } }
        }
    }))?;

    // Preview first, then apply
    for report in tablesync::plan_all(&session, &[customers.clone(), orders.clone()]).await? {
        for sql in report.statements() {
            println!("would run: {sql}");
        }
    }
    let reports = tablesync::sync_all(&session, &[customers, orders]).await?;

    let sql_writer = writer_for("sql").ok_or_else(|| anyhow::anyhow!("sql writer missing"))?;
    let written = write_to_file(&*sql_writer, &reports, "./output".as_ref())?;
    println!("SQL written: {}\n", written.display());

    // Hand off to pattern 3
    inspect_reports(&reports);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Pattern 3: inspect the reports directly.
// A SyncReport is plain serialisable Rust data: no magic, no callbacks.
// ─────────────────────────────────────────────────────────────────────────────
fn inspect_reports(reports: &[SyncReport]) {
    println!("=== Pattern 3: inspecting the reports ===\n");

    for report in reports {
        println!("━━ {} ({}) ━━", report.table, report.report_id);

        match &report.diff {
            tablesync::DiffResult::Missing { .. } => println!("  table was missing"),
            tablesync::DiffResult::Present { columns, .. } => match columns {
                Drift::InSync => println!("  columns in sync"),
                Drift::Drifted(c) => {
                    for name in &c.added {
                        println!("  + column {name}");
                    }
                    for r in &c.renamed {
                        println!("  ~ column {} → {}", r.from, r.to);
                    }
                    for name in &c.removed {
                        println!("  - column {name}");
                    }
                }
            },
        }

        for outcome in &report.steps {
            match &outcome.status {
                StepStatus::Failed { error } => println!("  ✗ {}: {error}", outcome.step),
                StepStatus::Skipped { reason } => println!("  … {}: {reason}", outcome.step),
                _ => println!("  ✓ {}", outcome.step),
            }
        }
        println!();
    }

    print_summary(reports);
}

fn print_summary(reports: &[SyncReport]) {
    println!("\n── summary ──────────────────────");
    for r in reports {
        println!(
            "  {:<12} applied {}  skipped {}  failed {}",
            r.table, r.summary.applied, r.summary.skipped, r.summary.failed
        );
    }
}
