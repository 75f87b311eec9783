use anyhow::Result;

use crate::domain::{ports::OutputWriter, sync_report::SyncReport};

/// Pretty-printed array of reports, one per table.
pub struct JsonWriter;

impl OutputWriter for JsonWriter {
    fn format(&self, reports: &[SyncReport]) -> Result<String> {
        Ok(serde_json::to_string_pretty(reports)?)
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
