use crate::domain::{ports::OutputWriter, sync_report::SyncReport};
use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

use self::{json::JsonWriter, sql::SqlWriter};

pub mod json;
pub mod sql;

/// Register available writers - OCP: add new ones without touching main.rs
pub fn all_writers() -> Vec<Box<dyn OutputWriter>> {
    vec![Box::new(JsonWriter), Box::new(SqlWriter)]
}

pub fn writer_for(format: &str) -> Option<Box<dyn OutputWriter>> {
    match format {
        "json" => Some(Box::new(JsonWriter)),
        "sql" => Some(Box::new(SqlWriter)),
        _ => None,
    }
}

/// Writes the reports to `<dir>/<timestamp>_tablesync.<ext>` via the chosen
/// writer and returns the path.
pub fn write_to_file(writer: &dyn OutputWriter, reports: &[SyncReport], dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let content = writer.format(reports)?;
    let path = dir.join(format!(
        "{}_tablesync.{}",
        Local::now().format("%Y%m%d_%H%M%S"),
        writer.extension()
    ));
    fs::write(&path, &content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
