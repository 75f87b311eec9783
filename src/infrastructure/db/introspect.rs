use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::domain::live::{LiveColumn, LiveForeignKey, LiveIndex};
use crate::domain::ports::{SchemaIntrospector, Session};
use crate::domain::value_objects::{RowMap, PRIMARY_KEY_COLUMN};
use crate::infrastructure::db::dialect::QueryDialect;
use crate::infrastructure::db::sql_utils::{
    build_columns_query, build_count_non_null_query, build_foreign_keys_query,
    build_indexes_query, build_table_exists_query,
};

/// Reads live schema metadata through a borrowed [`Session`].
pub struct MysqlIntrospector<'a> {
    session: &'a dyn Session,
    dialect: &'a dyn QueryDialect,
}

impl<'a> MysqlIntrospector<'a> {
    pub fn new(session: &'a dyn Session, dialect: &'a dyn QueryDialect) -> Self {
        Self { session, dialect }
    }

    async fn query(&self, sql: &str) -> Result<Vec<RowMap>> {
        debug!("Executing: {}", sql);
        self.session.query(sql).await
    }
}

/// Column lookup that tolerates the driver's casing (`Key_name`, `KEY_NAME`).
fn field<'r>(row: &'r RowMap, name: &str) -> Option<&'r Value> {
    row.get(name).or_else(|| {
        row.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    })
}

fn text(row: &RowMap, name: &str) -> Option<String> {
    match field(row, name)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn required_text(row: &RowMap, name: &str, source: &str) -> Result<String> {
    text(row, name).ok_or_else(|| anyhow!("{} row is missing '{}'", source, name))
}

fn number(row: &RowMap, name: &str) -> Option<u64> {
    match field(row, name)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(u64::from(*b)),
        _ => None,
    }
}

#[async_trait]
impl SchemaIntrospector for MysqlIntrospector<'_> {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        let rows = self.query(&build_table_exists_query(table)).await?;
        // LIKE is case-insensitive on most collations; match the name itself.
        Ok(rows.iter().any(|row| {
            row.values()
                .any(|v| v.as_str().is_some_and(|s| s.eq_ignore_ascii_case(table)))
        }))
    }

    async fn live_columns(&self, table: &str) -> Result<Vec<LiveColumn>> {
        let rows = self.query(&build_columns_query(table, self.dialect)).await?;
        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let name = required_text(row, "Field", "SHOW FIELDS")?;
            if name.eq_ignore_ascii_case(PRIMARY_KEY_COLUMN) {
                continue;
            }
            columns.push(LiveColumn {
                column_type: required_text(row, "Type", "SHOW FIELDS")
                    .with_context(|| format!("column {}.{}", table, name))?,
                nullable: text(row, "Null").unwrap_or_else(|| "YES".to_string()),
                default: self.dialect.normalize_live_default(text(row, "Default")),
                index: columns.len(),
                name,
            });
        }
        Ok(columns)
    }

    async fn live_indexes(&self, table: &str) -> Result<Vec<LiveIndex>> {
        let rows = self.query(&build_indexes_query(table, self.dialect)).await?;
        let mut indexes = Vec::new();
        for row in &rows {
            // multi-column indexes are reduced to their leading column
            if number(row, "Seq_in_index").unwrap_or(1) != 1 {
                continue;
            }
            indexes.push(LiveIndex {
                name: required_text(row, "Key_name", "SHOW INDEXES")?,
                column: required_text(row, "Column_name", "SHOW INDEXES")?,
                unique: number(row, "Non_unique").unwrap_or(1) == 0,
            });
        }
        Ok(indexes)
    }

    async fn live_foreign_keys(
        &self,
        table: &str,
        indexes: &[LiveIndex],
    ) -> Result<Vec<LiveForeignKey>> {
        let rows = self
            .query(&build_foreign_keys_query(table, self.dialect))
            .await?;
        let mut fks = Vec::with_capacity(rows.len());
        for row in &rows {
            let column = required_text(row, "column_name", "KEY_COLUMN_USAGE")?;
            let index_name = indexes
                .iter()
                .find(|i| i.column == column && !i.unique)
                .map(|i| i.name.clone());
            fks.push(LiveForeignKey {
                table: required_text(row, "referenced_table", "KEY_COLUMN_USAGE")?,
                referenced_column: required_text(row, "referenced_column", "KEY_COLUMN_USAGE")?,
                constraint_name: required_text(row, "constraint_name", "KEY_COLUMN_USAGE")?,
                index_name,
                column,
            });
        }
        Ok(fks)
    }

    async fn count_non_null(&self, table: &str, column: &str) -> Result<u64> {
        let rows = self
            .query(&build_count_non_null_query(table, column, self.dialect))
            .await?;
        rows.first()
            .and_then(|row| number(row, "non_null"))
            .ok_or_else(|| anyhow!("No row count returned for {}.{}", table, column))
    }
}
