use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::ddl::DdlStep;
use crate::domain::diff_result::DiffResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Diff and plan only; nothing is sent to the database besides metadata reads.
    Check,
    Sync,
}

/// Where a single table's sync ended up.
///
/// `Unchecked → Checked → Created → Done` for a missing table,
/// `Unchecked → Checked → ColumnsApplied → IndexesApplied →
/// ForeignKeysApplied → Done` otherwise. There is no rollback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Unchecked,
    Checked { table_exists: bool },
    Created,
    ColumnsApplied,
    IndexesApplied,
    ForeignKeysApplied,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticLevel {
    Notice,
    Warning,
    Error,
}

/// A non-fatal finding produced while diffing or applying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub table: String,
    pub message: String,
}

impl Diagnostic {
    pub fn notice(table: &str, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Notice, table, message)
    }

    pub fn warning(table: &str, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warning, table, message)
    }

    pub fn error(table: &str, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, table, message)
    }

    fn new(level: DiagnosticLevel, table: &str, message: impl Into<String>) -> Self {
        Self {
            level,
            table: table.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    /// Not sent (check mode).
    Planned,
    Applied { rows_affected: u64 },
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: DdlStep,
    /// Rendered statement. For a guarded drop this is the `DROP COLUMN` that
    /// runs only when the guard passes.
    pub sql: String,
    #[serde(flatten)]
    pub status: StepStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub planned: usize,
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// What a `check`/`sync` call looked at and what it attempted.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub report_id: String,
    pub table: String,
    pub mode: SyncMode,
    pub created_at: String,
    pub diff: DiffResult,
    pub steps: Vec<StepOutcome>,
    pub diagnostics: Vec<Diagnostic>,
    pub state: SyncState,
    pub summary: SyncSummary,
}

impl SyncReport {
    pub fn new(
        mode: SyncMode,
        diff: DiffResult,
        steps: Vec<StepOutcome>,
        mut diagnostics: Vec<Diagnostic>,
        state: SyncState,
    ) -> Self {
        let mut all = diff.diagnostics().to_vec();
        all.append(&mut diagnostics);

        let summary = SyncSummary {
            planned: steps.len(),
            applied: count(&steps, |s| matches!(s, StepStatus::Applied { .. })),
            skipped: count(&steps, |s| matches!(s, StepStatus::Skipped { .. })),
            failed: count(&steps, |s| matches!(s, StepStatus::Failed { .. })),
        };

        SyncReport {
            report_id: format!(
                "sync_{}_{}",
                Utc::now().format("%Y%m%d_%H%M%S"),
                Uuid::new_v4().simple()
            ),
            table: diff.table().to_string(),
            mode,
            created_at: Utc::now().to_rfc3339(),
            diff,
            steps,
            diagnostics: all,
            state,
            summary,
        }
    }

    /// `true` when nothing needed to change.
    pub fn is_in_sync(&self) -> bool {
        self.diff.is_in_sync()
    }

    /// Rendered statements in apply order.
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.sql.as_str())
    }
}

fn count(steps: &[StepOutcome], pred: impl Fn(&StepStatus) -> bool) -> usize {
    steps.iter().filter(|s| pred(&s.status)).count()
}
