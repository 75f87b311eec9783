use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument, warn};

use crate::application::differ::SchemaDiffer;
use crate::application::planner::plan_steps;
use crate::domain::{
    ddl::{DdlStep, StepPhase},
    diff_result::DiffResult,
    ports::{SchemaIntrospector, Session},
    spec::TableSpec,
    sync_report::{Diagnostic, StepOutcome, StepStatus, SyncMode, SyncReport, SyncState},
};
use crate::infrastructure::db::{
    dialect::{from_driver, Dialect},
    introspect::MysqlIntrospector,
    sql_utils::render_step,
};

// ─── Sync Executor ───

/// Applies the DDL that brings one table in line with its spec.
///
/// The session is borrowed for the duration of the call; every statement is
/// awaited before the next one is sent. A failing statement is recorded and
/// the remaining steps still run. There is no rollback.
pub struct SyncExecutor<'a> {
    session: &'a dyn Session,
    dialect: Box<dyn Dialect>,
}

impl<'a> SyncExecutor<'a> {
    pub fn new(session: &'a dyn Session) -> Self {
        Self {
            session,
            dialect: from_driver(session.driver()),
        }
    }

    fn introspector(&self) -> MysqlIntrospector<'_> {
        MysqlIntrospector::new(self.session, self.dialect.as_ref())
    }

    /// Compare `spec` with the live table. Metadata reads only.
    pub async fn check(&self, spec: &TableSpec) -> Result<DiffResult> {
        let introspector = self.introspector();
        SchemaDiffer::new(&introspector).check(spec).await
    }

    /// Check, then render the steps a sync would run without sending any.
    #[instrument(name = "plan", skip(self, spec), fields(db.table = %spec.name), level = "info")]
    pub async fn plan(&self, spec: &TableSpec) -> Result<SyncReport> {
        let diff = self.check(spec).await?;
        let state = SyncState::Checked {
            table_exists: diff.table_exists(),
        };
        let outcomes: Vec<StepOutcome> = plan_steps(spec, &diff)
            .into_iter()
            .map(|step| StepOutcome {
                sql: render_step(&step, self.dialect.as_ref()),
                step,
                status: StepStatus::Planned,
            })
            .collect();
        info!(table = %spec.name, steps = outcomes.len(), "plan completed");
        Ok(SyncReport::new(SyncMode::Check, diff, outcomes, Vec::new(), state))
    }

    /// Check, then apply every planned step in the order [`plan`](Self::plan)
    /// reports it. The state advances each time a later phase starts.
    ///
    /// Returns `Err` only when the live schema could not be read. DDL
    /// failures end up in the report's diagnostics.
    #[instrument(name = "sync", skip(self, spec), fields(db.table = %spec.name), level = "info")]
    pub async fn sync(&self, spec: &TableSpec) -> Result<SyncReport> {
        let table = spec.name.as_str();
        let diff = self.check(spec).await?;

        let mut state = transition(
            table,
            SyncState::Unchecked,
            SyncState::Checked {
                table_exists: diff.table_exists(),
            },
        );

        let steps = plan_steps(spec, &diff);
        let phases: &[(StepPhase, SyncState)] = if diff.table_exists() {
            &[
                (StepPhase::Columns, SyncState::ColumnsApplied),
                (StepPhase::Indexes, SyncState::IndexesApplied),
                (StepPhase::ForeignKeys, SyncState::ForeignKeysApplied),
            ]
        } else {
            &[(StepPhase::Create, SyncState::Created)]
        };

        // removed index name -> the column it sits on
        let removed_indexes: BTreeMap<&str, &str> = match &diff {
            DiffResult::Present { indexes, .. } => indexes
                .drifted()
                .map(|idx| {
                    idx.removed
                        .iter()
                        .map(|i| (i.name.as_str(), i.column.as_str()))
                        .collect()
                })
                .unwrap_or_default(),
            DiffResult::Missing { .. } => BTreeMap::new(),
        };

        let introspector = self.introspector();
        let mut outcomes = Vec::with_capacity(steps.len());
        let mut diagnostics = Vec::new();
        let mut dropped_columns: BTreeSet<String> = BTreeSet::new();
        let mut pending = phases.iter().peekable();
        for step in steps {
            while let Some(&&(phase, reached)) = pending.peek() {
                if step.phase() <= phase {
                    break;
                }
                state = transition(table, state, reached);
                pending.next();
            }

            if let DdlStep::DropIndex { name, .. } = &step {
                if let Some(column) = removed_indexes
                    .get(name.as_str())
                    .filter(|c| dropped_columns.contains(**c))
                {
                    debug!(table, index = %name, column, "index went away with its column");
                    outcomes.push(StepOutcome {
                        sql: render_step(&step, self.dialect.as_ref()),
                        status: StepStatus::Skipped {
                            reason: format!("Index '{}' was dropped along with column '{}'", name, column),
                        },
                        step,
                    });
                    continue;
                }
            }

            let outcome = self.apply(&introspector, step, &mut diagnostics).await;
            if let (DdlStep::DropColumnIfEmpty { column, .. }, StepStatus::Applied { .. }) =
                (&outcome.step, &outcome.status)
            {
                dropped_columns.insert(column.clone());
            }
            outcomes.push(outcome);
        }
        for &(_, reached) in pending {
            state = transition(table, state, reached);
        }
        state = transition(table, state, SyncState::Done);

        let report = SyncReport::new(SyncMode::Sync, diff, outcomes, diagnostics, state);
        info!(
            table,
            applied = report.summary.applied,
            skipped = report.summary.skipped,
            failed = report.summary.failed,
            "sync completed"
        );
        Ok(report)
    }

    async fn apply(
        &self,
        introspector: &dyn SchemaIntrospector,
        step: DdlStep,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> StepOutcome {
        let sql = render_step(&step, self.dialect.as_ref());
        let table = step.table().to_string();

        if let DdlStep::DropColumnIfEmpty { column, .. } = &step {
            let reason = match introspector.count_non_null(&table, column).await {
                Ok(0) => None,
                Ok(n) => Some(format!(
                    "Column '{}.{}' was not dropped because {} row(s) still hold a value",
                    table, column, n
                )),
                Err(e) => Some(format!(
                    "Column '{}.{}' was not dropped because its contents could not be checked: {:#}",
                    table, column, e
                )),
            };
            if let Some(reason) = reason {
                warn!("{}", reason);
                diagnostics.push(Diagnostic::warning(&table, reason.clone()));
                return StepOutcome {
                    step,
                    sql,
                    status: StepStatus::Skipped { reason },
                };
            }
        }

        debug!("Executing: {}", sql);
        let status = match self.session.execute(&sql).await {
            Ok(outcome) => {
                info!(table = %table, "{}", step);
                StepStatus::Applied {
                    rows_affected: outcome.rows_affected,
                }
            }
            Err(e) => {
                let mut message = format!("Failed to {}: {:#}", step, e);
                if let Some(hint) = failure_hint(&step) {
                    message.push_str(". ");
                    message.push_str(hint);
                }
                warn!("{}", message);
                diagnostics.push(Diagnostic::error(&table, message));
                StepStatus::Failed {
                    error: format!("{:#}", e),
                }
            }
        };
        StepOutcome { step, sql, status }
    }
}

fn transition(table: &str, from: SyncState, to: SyncState) -> SyncState {
    debug!(table, ?from, ?to, "sync state");
    to
}

/// Likely cause of a failed statement, when a common one exists.
fn failure_hint(step: &DdlStep) -> Option<&'static str> {
    match step {
        DdlStep::AddIndex { index, .. } if index.unique => Some("Maybe you already have duplicates?"),
        DdlStep::AddForeignKey { .. } => Some(
            "Check that both columns have the same type and that the referenced column has a unique index",
        ),
        _ => None,
    }
}
