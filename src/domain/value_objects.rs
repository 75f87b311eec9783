use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Type alias for a result row represented as a sorted map of column name → JSON value.
pub type RowMap = BTreeMap<String, Value>;

/// Name of the implicit auto-increment primary key every synced table carries.
pub const PRIMARY_KEY_COLUMN: &str = "ID";

/// Type used for columns that do not declare one.
pub const DEFAULT_COLUMN_TYPE: &str = "varchar(200)";

/// MySQL's hard limit on identifier length.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// What a write statement reported back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    pub last_insert_id: Option<u64>,
}

/// Returns `true` if `s` may be interpolated into DDL as an identifier.
///
/// Identifiers are never bound as parameters, so anything outside
/// `[A-Za-z0-9_$]` is refused outright rather than escaped.
pub fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_IDENTIFIER_LEN
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Index name used for a single-column unique constraint.
pub fn unique_index_name(column: &str) -> String {
    format!("unique_{}", column)
}

/// Constraint name used for a spec-declared foreign key.
pub fn foreign_key_name(table: &str, column: &str) -> String {
    format!("fk_{}_{}", table, column)
}

/// Canonical form of a time-function default such as `CURRENT_TIMESTAMP`,
/// `current_timestamp(3)` or `NOW()`, or `None` for an ordinary literal.
///
/// These are rendered unquoted. `NOW` and the `LOCAL*` synonyms fold into
/// `CURRENT_TIMESTAMP`, which is how the engine reports them back.
pub fn default_expression(s: &str) -> Option<String> {
    let upper = s.trim().to_ascii_uppercase();
    let (name, precision) = match upper.split_once('(') {
        Some((name, rest)) => (name.trim_end(), Some(rest.strip_suffix(')')?.trim())),
        None => (upper.as_str(), None),
    };
    if precision.is_some_and(|p| !p.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }
    match (name, precision) {
        ("NOW", None) => return None,
        ("CURRENT_TIMESTAMP" | "NOW" | "LOCALTIMESTAMP" | "LOCALTIME", _) => {}
        _ => return None,
    }
    Some(match precision {
        Some(p) if !p.is_empty() && p != "0" => format!("CURRENT_TIMESTAMP({})", p),
        _ => "CURRENT_TIMESTAMP".to_string(),
    })
}
