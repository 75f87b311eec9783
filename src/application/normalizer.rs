use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::error::SpecError;
use crate::domain::spec::{
    ColumnSpec, ForeignKeyRef, IndexSpec, RawColumnSpec, RawDbSpec, RawForeignKey, RawTableSpec,
    TableSpec,
};
use crate::domain::value_objects::{
    is_valid_identifier, unique_index_name, DEFAULT_COLUMN_TYPE, PRIMARY_KEY_COLUMN,
};

/// Turn a caller-supplied spec into a canonical [`TableSpec`].
///
/// Fills defaults (`varchar(200)`, nullable, no default, not unique), folds
/// the legacy top-level `db_type` into `db.type`, derives a `unique_<column>`
/// index for every unique column and collects foreign keys from both the
/// columns and the `constraints` section.
///
/// Type strings are passed through untouched; a bad one only fails when the
/// DDL reaches the database.
pub fn normalize(raw: &RawTableSpec) -> Result<TableSpec, SpecError> {
    if raw.name.is_empty() {
        return Err(SpecError::MissingName);
    }
    check_identifier("table", &raw.name)?;
    if raw.columns.is_empty() {
        return Err(SpecError::NoColumns(raw.name.clone()));
    }

    let mut columns = Vec::with_capacity(raw.columns.len());
    for (name, col) in &raw.columns {
        check_identifier("column", name)?;
        if name.eq_ignore_ascii_case(PRIMARY_KEY_COLUMN) {
            return Err(SpecError::ReservedColumn {
                table: raw.name.clone(),
                column: name.clone(),
            });
        }
        columns.push(normalize_column(name, col)?);
    }

    let mut indexes: Vec<IndexSpec> = Vec::new();
    for (name, idx) in &raw.indexes {
        check_identifier("index", name)?;
        check_identifier("column", &idx.column)?;
        indexes.push(IndexSpec {
            name: name.clone(),
            column: idx.column.clone(),
            unique: idx.unique,
        });
    }
    for col in columns.iter().filter(|c| c.unique) {
        let name = unique_index_name(&col.name);
        check_identifier("index", &name)?;
        // an explicit index of the same name wins
        if !indexes.iter().any(|i| i.name == name) {
            indexes.push(IndexSpec {
                name,
                column: col.name.clone(),
                unique: true,
            });
        }
    }

    let mut foreign_keys: BTreeMap<String, ForeignKeyRef> = columns
        .iter()
        .filter_map(|c| c.foreign_key.clone().map(|fk| (c.name.clone(), fk)))
        .collect();
    if let Some(constraints) = &raw.constraints {
        for (column, fk) in &constraints.foreign_keys {
            check_identifier("column", column)?;
            foreign_keys.insert(column.clone(), foreign_key_ref(column, fk)?);
        }
    }
    for col in columns.iter_mut() {
        col.foreign_key = foreign_keys.get(&col.name).cloned();
    }
    let manages_foreign_keys = raw.constraints.is_some() || !foreign_keys.is_empty();

    Ok(TableSpec {
        name: raw.name.clone(),
        columns,
        indexes,
        foreign_keys: manages_foreign_keys.then_some(foreign_keys),
    })
}

fn normalize_column(name: &str, raw: &RawColumnSpec) -> Result<ColumnSpec, SpecError> {
    let db_type = raw
        .db_type
        .clone()
        .or_else(|| raw.db.db_type.clone())
        .unwrap_or_else(|| DEFAULT_COLUMN_TYPE.to_string());

    let foreign_key = match &raw.db.foreign {
        Some(fk) => Some(foreign_key_ref(name, fk)?),
        None => None,
    };

    Ok(ColumnSpec {
        name: name.to_string(),
        db_type,
        nullable: raw.db.null.unwrap_or(true),
        default: raw.db.default.clone().filter(|v| !v.is_null()),
        unique: raw.db.unique.unwrap_or(false),
        foreign_key,
    })
}

fn foreign_key_ref(column: &str, raw: &RawForeignKey) -> Result<ForeignKeyRef, SpecError> {
    check_identifier("referenced table", &raw.table)?;
    check_identifier("referenced column", &raw.column)?;
    Ok(ForeignKeyRef {
        column: column.to_string(),
        table: raw.table.clone(),
        referenced_column: raw.column.clone(),
    })
}

fn check_identifier(kind: &'static str, value: &str) -> Result<(), SpecError> {
    if is_valid_identifier(value) {
        Ok(())
    } else {
        Err(SpecError::InvalidIdentifier {
            kind,
            value: value.to_string(),
        })
    }
}

/// Convenience for building raw specs in code.
pub fn raw_column(db_type: &str, nullable: bool, default: Option<Value>) -> RawColumnSpec {
    RawColumnSpec {
        db: RawDbSpec {
            db_type: Some(db_type.to_string()),
            null: Some(nullable),
            default,
            unique: None,
            foreign: None,
        },
        db_type: None,
    }
}
