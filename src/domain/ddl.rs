use serde::Serialize;
use std::fmt;

use crate::domain::spec::{ColumnSpec, ForeignKeyRef, IndexSpec};

/// One schema change, in the order it must be applied.
///
/// A sync is a `Vec<DdlStep>` executed front to back, each statement awaited
/// before the next one is sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DdlStep {
    CreateTable {
        table: String,
        columns: Vec<ColumnSpec>,
        indexes: Vec<IndexSpec>,
    },
    RenameColumn {
        table: String,
        from: String,
        column: ColumnSpec,
    },
    AddColumn {
        table: String,
        column: ColumnSpec,
        /// Column the new one is placed after (the primary key when first).
        after: String,
    },
    ModifyColumn {
        table: String,
        column: ColumnSpec,
    },
    /// Drop a column only if it holds no non-null value at apply time.
    DropColumnIfEmpty {
        table: String,
        column: String,
    },
    AddIndex {
        table: String,
        index: IndexSpec,
    },
    DropIndex {
        table: String,
        name: String,
    },
    DropForeignKey {
        table: String,
        column: String,
        constraint: String,
    },
    AddForeignKey {
        table: String,
        constraint: String,
        reference: ForeignKeyRef,
    },
}

/// Coarse grouping of steps, used to drive the sync state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPhase {
    Create,
    Columns,
    Indexes,
    ForeignKeys,
}

impl DdlStep {
    pub fn table(&self) -> &str {
        match self {
            DdlStep::CreateTable { table, .. }
            | DdlStep::RenameColumn { table, .. }
            | DdlStep::AddColumn { table, .. }
            | DdlStep::ModifyColumn { table, .. }
            | DdlStep::DropColumnIfEmpty { table, .. }
            | DdlStep::AddIndex { table, .. }
            | DdlStep::DropIndex { table, .. }
            | DdlStep::DropForeignKey { table, .. }
            | DdlStep::AddForeignKey { table, .. } => table,
        }
    }

    pub fn phase(&self) -> StepPhase {
        match self {
            DdlStep::CreateTable { .. } => StepPhase::Create,
            DdlStep::RenameColumn { .. }
            | DdlStep::AddColumn { .. }
            | DdlStep::ModifyColumn { .. }
            | DdlStep::DropColumnIfEmpty { .. } => StepPhase::Columns,
            DdlStep::AddIndex { .. } | DdlStep::DropIndex { .. } => StepPhase::Indexes,
            DdlStep::DropForeignKey { .. } | DdlStep::AddForeignKey { .. } => {
                StepPhase::ForeignKeys
            }
        }
    }

    pub fn is_destructive(&self) -> bool {
        matches!(self, DdlStep::DropColumnIfEmpty { .. })
    }
}

impl fmt::Display for DdlStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DdlStep::CreateTable { table, columns, .. } => {
                write!(f, "create table '{}' ({} columns)", table, columns.len())
            }
            DdlStep::RenameColumn { table, from, column } => {
                write!(f, "rename column '{table}.{from}' to '{table}.{}'", column.name)
            }
            DdlStep::AddColumn { table, column, after } => {
                write!(f, "add column '{table}.{}' after '{after}'", column.name)
            }
            DdlStep::ModifyColumn { table, column } => {
                write!(f, "update column '{table}.{}'", column.name)
            }
            DdlStep::DropColumnIfEmpty { table, column } => {
                write!(f, "drop column '{table}.{column}' if empty")
            }
            DdlStep::AddIndex { table, index } => write!(
                f,
                "add {}index '{}' on '{table}.{}'",
                if index.unique { "unique " } else { "" },
                index.name,
                index.column
            ),
            DdlStep::DropIndex { table, name } => write!(f, "drop index '{name}' from '{table}'"),
            DdlStep::DropForeignKey {
                table,
                column,
                constraint,
            } => write!(f, "drop foreign key '{constraint}' on '{table}.{column}'"),
            DdlStep::AddForeignKey {
                table,
                constraint,
                reference,
            } => write!(
                f,
                "add foreign key '{constraint}' on '{table}.{}' referencing '{}.{}'",
                reference.column, reference.table, reference.referenced_column
            ),
        }
    }
}
