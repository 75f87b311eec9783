use anyhow::Result;
use serde_json::{json, Value};
use sqlx::any::AnyRow;
use sqlx::{Column, Row, TypeInfo};

// ─────────────────────────────────────────────────────────────────────────────
// Traits
// ─────────────────────────────────────────────────────────────────────────────

/// SQL dialect: identifier quoting and literal formatting.
///
/// Pure string manipulation with no sqlx dependency, so both the DDL renderer
/// and the presentation SQL writer can use it.
pub trait QueryDialect: Send + Sync {
    /// Driver name ("mysql", "mariadb"). Used for output metadata only.
    fn name(&self) -> &'static str;

    /// Quote an identifier with backticks: `` `col` ``.
    fn quote_ident(&self, s: &str) -> String {
        format!("`{}`", s.replace('`', "``"))
    }

    /// Format a JSON `Value` as an SQL literal.
    /// - NULL          → `NULL`
    /// - Bool          → `TRUE` / `FALSE`
    /// - Number        → bare number
    /// - String        → `'escaped'` (quotes doubled, backslashes escaped)
    /// - Object/Array  → serialised JSON as a string literal
    fn sql_literal(&self, val: &Value) -> String {
        match val {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => quote_string(s),
            Value::Array(_) | Value::Object(_) => {
                quote_string(&serde_json::to_string(val).unwrap_or_default())
            }
        }
    }

    /// Normalise the `Default` reported by `SHOW FIELDS` so it compares
    /// against a declared default. `None` means "no default".
    fn normalize_live_default(&self, raw: Option<String>) -> Option<String> {
        raw
    }
}

/// Row decoder: read a single `AnyRow` column into a `serde_json::Value`.
///
/// Lives in infrastructure only; callers outside this module receive
/// `Value`s, never raw `AnyRow`s.
pub trait RowDecoder: Send + Sync {
    fn decode_column(&self, row: &AnyRow, idx: usize) -> Result<Value>;
}

fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
}

// ─────────────────────────────────────────────────────────────────────────────
// MySQL
// ─────────────────────────────────────────────────────────────────────────────

pub struct MysqlDialect;

impl QueryDialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }
}

impl RowDecoder for MysqlDialect {
    fn decode_column(&self, row: &AnyRow, idx: usize) -> Result<Value> {
        // Metadata statements (SHOW FIELDS, information_schema) hand several
        // text columns back as BLOB; read raw bytes in that case.
        let type_name = row.column(idx).type_info().name();
        if type_name == "BLOB" {
            blob_to_json(row, idx)
        } else {
            col_to_json(row, idx, type_name)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MariaDB
// ─────────────────────────────────────────────────────────────────────────────

/// Same wire protocol as MySQL. Since 10.2.7 MariaDB reports string defaults
/// quoted (`'new'`) and a missing default as the text `NULL`.
pub struct MariadbDialect;

impl QueryDialect for MariadbDialect {
    fn name(&self) -> &'static str {
        "mariadb"
    }

    fn normalize_live_default(&self, raw: Option<String>) -> Option<String> {
        let raw = raw?;
        if raw.eq_ignore_ascii_case("null") {
            return None;
        }
        match raw
            .strip_prefix('\'')
            .and_then(|r| r.strip_suffix('\''))
        {
            Some(inner) => Some(inner.replace("''", "'")),
            None => Some(raw),
        }
    }
}

impl RowDecoder for MariadbDialect {
    fn decode_column(&self, row: &AnyRow, idx: usize) -> Result<Value> {
        MysqlDialect.decode_column(row, idx)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Factory
// ─────────────────────────────────────────────────────────────────────────────

/// Resolve the dialect from a driver name string. Anything that is not
/// `mariadb` is treated as MySQL.
pub fn from_driver(driver: &str) -> Box<dyn Dialect> {
    match driver {
        "mariadb" => Box::new(MariadbDialect),
        _ => Box::new(MysqlDialect),
    }
}

/// Combined supertrait so callers only store one object.
pub trait Dialect: QueryDialect + RowDecoder {}
impl Dialect for MysqlDialect {}
impl Dialect for MariadbDialect {}

// ─────────────────────────────────────────────────────────────────────────────
// Shared decoding helpers (private to this module)
// ─────────────────────────────────────────────────────────────────────────────

fn blob_to_json(row: &AnyRow, idx: usize) -> Result<Value> {
    let bytes: Option<Vec<u8>> = row.try_get(idx)?;
    Ok(bytes.map_or(Value::Null, |b| {
        Value::String(String::from_utf8_lossy(&b).into_owned())
    }))
}

/// Decode a column using the `AnyRow` type name.
fn col_to_json(row: &AnyRow, idx: usize, type_name: &str) -> Result<Value> {
    let v = match type_name.to_uppercase().as_str() {
        "NULL" => Value::Null,

        "BOOL" | "BOOLEAN" => row
            .try_get::<Option<bool>, _>(idx)?
            .map_or(Value::Null, Value::Bool),

        "SMALLINT" => row
            .try_get::<Option<i16>, _>(idx)?
            .map_or(Value::Null, |v| json!(v)),

        "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(idx)?
            .map_or(Value::Null, |v| json!(v)),

        "BIGINT" => row
            .try_get::<Option<i64>, _>(idx)?
            .map_or(Value::Null, |v| json!(v)),

        "REAL" | "FLOAT" => row
            .try_get::<Option<f32>, _>(idx)?
            .map_or(Value::Null, |v| json!(v as f64)),

        "DOUBLE" => row
            .try_get::<Option<f64>, _>(idx)?
            .map_or(Value::Null, |v| json!(v)),

        _ => row
            .try_get::<Option<String>, _>(idx)?
            .map_or(Value::Null, Value::String),
    };
    Ok(v)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
