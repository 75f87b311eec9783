use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::domain::live::{LiveForeignKey, LiveIndex};
use crate::domain::spec::ForeignKeyRef;
use crate::domain::sync_report::Diagnostic;

/// Outcome of comparing one table spec against the live schema.
///
/// `Missing` is never an empty diff: the table has to be created.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiffResult {
    Missing {
        table: String,
    },
    Present {
        table: String,
        columns: Drift<ColumnsDiff>,
        indexes: Drift<IndexesDiff>,
        foreign_keys: Drift<ForeignKeysDiff>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        diagnostics: Vec<Diagnostic>,
    },
}

impl DiffResult {
    pub fn table(&self) -> &str {
        match self {
            DiffResult::Missing { table } | DiffResult::Present { table, .. } => table,
        }
    }

    pub fn table_exists(&self) -> bool {
        matches!(self, DiffResult::Present { .. })
    }

    /// `true` only for an existing table whose every sub-diff is in sync.
    pub fn is_in_sync(&self) -> bool {
        match self {
            DiffResult::Missing { .. } => false,
            DiffResult::Present {
                columns,
                indexes,
                foreign_keys,
                ..
            } => columns.is_in_sync() && indexes.is_in_sync() && foreign_keys.is_in_sync(),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            DiffResult::Missing { .. } => &[],
            DiffResult::Present { diagnostics, .. } => diagnostics,
        }
    }
}

/// Either "no differences" or the list of differences for one category.
///
/// `InSync` serialises as the literal `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drift<T> {
    InSync,
    Drifted(T),
}

impl<T> Drift<T> {
    pub fn is_in_sync(&self) -> bool {
        matches!(self, Drift::InSync)
    }

    pub fn drifted(&self) -> Option<&T> {
        match self {
            Drift::InSync => None,
            Drift::Drifted(t) => Some(t),
        }
    }
}

impl<T: IsEmpty> Drift<T> {
    /// Wrap `diff`, collapsing an empty one into `InSync`.
    pub fn from_diff(diff: T) -> Self {
        if diff.is_empty() {
            Drift::InSync
        } else {
            Drift::Drifted(diff)
        }
    }
}

impl<T: Serialize> Serialize for Drift<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Drift::InSync => serializer.serialize_bool(true),
            Drift::Drifted(t) => t.serialize(serializer),
        }
    }
}

pub trait IsEmpty {
    fn is_empty(&self) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnsDiff {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub renamed: Vec<Rename>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changed: Vec<String>,
}

impl IsEmpty for ColumnsDiff {
    fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.renamed.is_empty()
            && self.changed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

/// Index differences, by index name. Removed indexes keep their live shape so
/// the column they sit on is known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexesDiff {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<LiveIndex>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changed: Vec<String>,
}

impl IsEmpty for IndexesDiff {
    fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Foreign-key differences, keyed by owning column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ForeignKeysDiff {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub added: BTreeMap<String, ForeignKeyRef>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub removed: BTreeMap<String, LiveForeignKey>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub changed: BTreeMap<String, ForeignKeyChange>,
}

impl IsEmpty for ForeignKeysDiff {
    fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// A live constraint that must be replaced by a different reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyChange {
    pub live: LiveForeignKey,
    pub spec: ForeignKeyRef,
}
