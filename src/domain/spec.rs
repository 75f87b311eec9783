use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ─── Raw (caller-supplied) spec ──────────────────────────────────────────────

/// A table spec as the surrounding ORM (or a config file) declares it.
///
/// Column order is significant: it drives `AFTER` placement and rename
/// detection, hence the `IndexMap`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTableSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub columns: IndexMap<String, RawColumnSpec>,
    /// Explicit secondary indexes keyed by index name.
    #[serde(default)]
    pub indexes: IndexMap<String, RawIndexSpec>,
    /// When absent (and no column declares `db.foreign`), foreign keys are
    /// left alone entirely.
    #[serde(default)]
    pub constraints: Option<RawConstraints>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawColumnSpec {
    #[serde(default)]
    pub db: RawDbSpec,
    /// Legacy spelling of `db.type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDbSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub db_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign: Option<RawForeignKey>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawIndexSpec {
    pub column: String,
    #[serde(default)]
    pub unique: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawConstraints {
    /// Owning column → referenced table/column.
    #[serde(default)]
    pub foreign_keys: IndexMap<String, RawForeignKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawForeignKey {
    pub table: String,
    pub column: String,
}

// ─── Normalized spec ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSpec {
    pub name: String,
    pub db_type: String,
    pub nullable: bool,
    pub default: Option<Value>,
    pub unique: bool,
    pub foreign_key: Option<ForeignKeyRef>,
}

impl ColumnSpec {
    /// A column with every attribute at its default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db_type: super::value_objects::DEFAULT_COLUMN_TYPE.to_string(),
            nullable: true,
            default: None,
            unique: false,
            foreign_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    pub name: String,
    pub column: String,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyRef {
    /// Owning column on the synced table.
    pub column: String,
    pub table: String,
    pub referenced_column: String,
}

/// Canonical, validated spec for one table. Immutable for the duration of a
/// check or sync call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    pub indexes: Vec<IndexSpec>,
    /// `None` means the spec does not manage foreign keys at all.
    pub foreign_keys: Option<BTreeMap<String, ForeignKeyRef>>,
}

impl TableSpec {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn index(&self, name: &str) -> Option<&IndexSpec> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Name of the column preceding `name` in spec order, or `None` when it
    /// is the first column (i.e. it sits right after the primary key).
    pub fn predecessor(&self, name: &str) -> Option<&str> {
        let pos = self.columns.iter().position(|c| c.name == name)?;
        if pos == 0 {
            None
        } else {
            Some(self.columns[pos - 1].name.as_str())
        }
    }
}
