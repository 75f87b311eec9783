use anyhow::{Context, Result};
use sqlx::any::AnyRow;
use sqlx::{Column, Row};
use std::collections::BTreeMap;

use crate::domain::value_objects::RowMap;
use crate::infrastructure::db::dialect::RowDecoder;

/// Convert a sqlx `AnyRow` into a `RowMap`.
///
/// `decoder` is the dialect-specific `RowDecoder` that turns an AnyRow column
/// index into the matching `serde_json::Value`.
pub fn row_to_map(row: &AnyRow, decoder: &dyn RowDecoder) -> Result<RowMap> {
    let mut map = BTreeMap::new();
    for col in row.columns() {
        let name = col.name().to_string();
        let value = decoder
            .decode_column(row, col.ordinal())
            .with_context(|| format!("Failed to decode column '{}'", name))?;
        map.insert(name, value);
    }
    Ok(map)
}
