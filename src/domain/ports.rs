use crate::domain::{
    live::{LiveColumn, LiveForeignKey, LiveIndex},
    sync_report::SyncReport,
    value_objects::{ExecOutcome, RowMap},
};
use anyhow::Result;
use async_trait::async_trait;

/// Port: the caller's database session (implemented by SqlxSession).
///
/// Statements arrive as finished text; nothing is parameterised.
#[async_trait]
pub trait Session: Send + Sync {
    /// Driver name, "mysql" or "mariadb". Selects the SQL dialect.
    fn driver(&self) -> &'static str {
        "mysql"
    }

    /// Run a statement that returns rows.
    async fn query(&self, sql: &str) -> Result<Vec<RowMap>>;

    /// Run a statement that does not return rows.
    async fn execute(&self, sql: &str) -> Result<ExecOutcome>;
}

/// Port: live schema metadata reads (implemented by MysqlIntrospector)
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    async fn table_exists(&self, table: &str) -> Result<bool>;

    /// Columns in table order, implicit primary key excluded.
    async fn live_columns(&self, table: &str) -> Result<Vec<LiveColumn>>;

    /// All non-primary indexes.
    async fn live_indexes(&self, table: &str) -> Result<Vec<LiveIndex>>;

    /// Foreign keys, joined against `indexes` to find each backing index.
    async fn live_foreign_keys(
        &self,
        table: &str,
        indexes: &[LiveIndex],
    ) -> Result<Vec<LiveForeignKey>>;

    /// Number of rows holding a non-null value in `column`.
    async fn count_non_null(&self, table: &str, column: &str) -> Result<u64>;
}

/// Port: output formatting (implemented by JsonWriter, SqlWriter)
pub trait OutputWriter: Send + Sync {
    /// Serializes the reports to a string (JSON, SQL, etc.)
    fn format(&self, reports: &[SyncReport]) -> Result<String>;
    /// Extension of the produced file (e.g. "json", "sql")
    fn extension(&self) -> &'static str;
}
