//! In-memory `Session` that answers MySQL metadata statements from a scripted
//! schema and records everything it is sent.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::domain::ports::Session;
use crate::domain::value_objects::{ExecOutcome, RowMap};

#[derive(Default)]
struct FakeTable {
    fields: Vec<RowMap>,
    indexes: Vec<RowMap>,
    foreign_keys: Vec<RowMap>,
}

pub struct FakeSession {
    driver: &'static str,
    tables: BTreeMap<String, FakeTable>,
    non_null: BTreeMap<(String, String), u64>,
    fail_on: Vec<String>,
    queries: Mutex<Vec<String>>,
    executed: Mutex<Vec<String>>,
}

fn row(pairs: &[(&str, Value)]) -> RowMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Identifiers quoted with backticks, in order of appearance.
fn backticked(sql: &str) -> Vec<&str> {
    sql.split('`').skip(1).step_by(2).collect()
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            driver: "mysql",
            tables: BTreeMap::new(),
            non_null: BTreeMap::new(),
            fail_on: Vec::new(),
            queries: Mutex::new(Vec::new()),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn mariadb(mut self) -> Self {
        self.driver = "mariadb";
        self
    }

    /// Declare a table holding only the implicit primary key.
    pub fn table(mut self, name: &str) -> Self {
        let mut t = FakeTable::default();
        t.fields.push(row(&[
            ("Field", json!("ID")),
            ("Type", json!("int(11)")),
            ("Null", json!("NO")),
            ("Key", json!("PRI")),
            ("Default", Value::Null),
            ("Extra", json!("auto_increment")),
        ]));
        self.tables.insert(name.to_string(), t);
        self
    }

    pub fn field(
        mut self,
        table: &str,
        name: &str,
        column_type: &str,
        nullable: bool,
        default: Option<&str>,
    ) -> Self {
        self.tables.entry(table.to_string()).or_default().fields.push(row(&[
            ("Field", json!(name)),
            ("Type", json!(column_type)),
            ("Null", json!(if nullable { "YES" } else { "NO" })),
            ("Key", json!("")),
            ("Default", default.map_or(Value::Null, |d| json!(d))),
            ("Extra", json!("")),
        ]));
        self
    }

    pub fn index(mut self, table: &str, name: &str, columns: &[&str], unique: bool) -> Self {
        let t = self.tables.entry(table.to_string()).or_default();
        for (seq, column) in columns.iter().enumerate() {
            t.indexes.push(row(&[
                ("Table", json!(table)),
                ("Non_unique", json!(if unique { 0 } else { 1 })),
                ("Key_name", json!(name)),
                ("Seq_in_index", json!(seq + 1)),
                ("Column_name", json!(column)),
            ]));
        }
        self
    }

    pub fn foreign_key(
        mut self,
        table: &str,
        column: &str,
        referenced_table: &str,
        referenced_column: &str,
        constraint: &str,
    ) -> Self {
        self.tables
            .entry(table.to_string())
            .or_default()
            .foreign_keys
            .push(row(&[
                ("column_name", json!(column)),
                ("referenced_table", json!(referenced_table)),
                ("referenced_column", json!(referenced_column)),
                ("constraint_name", json!(constraint)),
            ]));
        self
    }

    /// Rows holding a non-null value in `table.column` (0 when unset).
    pub fn non_null(mut self, table: &str, column: &str, count: u64) -> Self {
        self.non_null
            .insert((table.to_string(), column.to_string()), count);
        self
    }

    /// Fail every statement containing `needle`.
    pub fn fail_on(mut self, needle: &str) -> Self {
        self.fail_on.push(needle.to_string());
        self
    }

    /// Statements sent through `execute`, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Statements sent through `query`, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|v| v.clone()).unwrap_or_default()
    }

    fn check_failure(&self, sql: &str) -> Result<()> {
        match self.fail_on.iter().find(|n| sql.contains(n.as_str())) {
            Some(n) => bail!("simulated failure on '{}'", n),
            None => Ok(()),
        }
    }

    fn lookup(&self, name: &str) -> Result<&FakeTable> {
        self.tables
            .get(name)
            .ok_or_else(|| anyhow!("Table '{}' doesn't exist", name))
    }

    fn answer(&self, sql: &str) -> Result<Vec<RowMap>> {
        if let Some(rest) = sql.strip_prefix("SHOW TABLES LIKE '") {
            let pattern = rest.trim_end_matches('\'').replace("\\_", "_").replace("\\%", "%");
            return Ok(self
                .tables
                .keys()
                .filter(|t| t.eq_ignore_ascii_case(&pattern))
                .map(|t| row(&[(format!("Tables_in_app ({})", pattern).as_str(), json!(t))]))
                .collect());
        }
        if sql.starts_with("SHOW FIELDS FROM") {
            let name = backticked(sql).first().copied().unwrap_or_default();
            return Ok(self.lookup(name)?.fields.clone());
        }
        if sql.starts_with("SHOW INDEXES FROM") {
            let name = backticked(sql).first().copied().unwrap_or_default();
            return Ok(self.lookup(name)?.indexes.clone());
        }
        if sql.contains("KEY_COLUMN_USAGE") {
            let name = sql
                .split("TABLE_NAME = '")
                .nth(1)
                .and_then(|r| r.split('\'').next())
                .unwrap_or_default();
            return Ok(self
                .tables
                .get(name)
                .map(|t| t.foreign_keys.clone())
                .unwrap_or_default());
        }
        if sql.starts_with("SELECT COUNT(*)") {
            let idents = backticked(sql);
            let key = (
                idents.first().copied().unwrap_or_default().to_string(),
                idents.get(1).copied().unwrap_or_default().to_string(),
            );
            let count = self.non_null.get(&key).copied().unwrap_or(0);
            return Ok(vec![row(&[("non_null", json!(count))])]);
        }
        bail!("unexpected query: {}", sql)
    }
}

#[async_trait]
impl Session for FakeSession {
    fn driver(&self) -> &'static str {
        self.driver
    }

    async fn query(&self, sql: &str) -> Result<Vec<RowMap>> {
        if let Ok(mut q) = self.queries.lock() {
            q.push(sql.to_string());
        }
        self.check_failure(sql)?;
        self.answer(sql)
    }

    async fn execute(&self, sql: &str) -> Result<ExecOutcome> {
        if let Ok(mut e) = self.executed.lock() {
            e.push(sql.to_string());
        }
        self.check_failure(sql)?;
        Ok(ExecOutcome::default())
    }
}
