use serde::Serialize;

/// A column as reported by `SHOW FIELDS`, primary key excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveColumn {
    pub name: String,
    pub column_type: String,
    /// Engine text, `YES` or `NO`.
    pub nullable: String,
    pub default: Option<String>,
    /// Position among the non-primary-key columns, starting at 0.
    pub index: usize,
}

impl LiveColumn {
    pub fn is_nullable(&self) -> bool {
        self.nullable.eq_ignore_ascii_case("yes")
    }
}

/// A non-primary index. Multi-column indexes are reduced to their leading column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveIndex {
    pub name: String,
    pub column: String,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveForeignKey {
    pub column: String,
    pub table: String,
    pub referenced_column: String,
    pub constraint_name: String,
    /// Non-unique index backing the constraint, when there is one.
    pub index_name: Option<String>,
}
