use crate::domain::{
    ddl::DdlStep,
    diff_result::DiffResult,
    spec::{ColumnSpec, TableSpec},
    value_objects::{foreign_key_name, PRIMARY_KEY_COLUMN},
};

/// Turn a diff into the ordered list of DDL steps that resolves it.
///
/// Order within a table: columns, then indexes, then foreign keys. Columns go
/// renamed → added → changed → removed so that every `AFTER` anchor already
/// exists when it is used. A foreign key is always dropped before anything
/// replaces it, and its backing index only after the constraint is gone.
///
/// A missing table is one `CREATE TABLE` followed by one step per foreign
/// key, so a reference that cannot be created yet never blocks the table.
pub fn plan_steps(spec: &TableSpec, diff: &DiffResult) -> Vec<DdlStep> {
    let table = spec.name.clone();

    let (columns, indexes, foreign_keys) = match diff {
        DiffResult::Missing { .. } => {
            let create = DdlStep::CreateTable {
                table: table.clone(),
                columns: spec.columns.clone(),
                indexes: spec
                    .indexes
                    .iter()
                    .filter(|i| spec.has_column(&i.column))
                    .cloned()
                    .collect(),
            };
            let references = spec
                .foreign_keys
                .iter()
                .flat_map(|fks| fks.iter())
                .filter(|(column, _)| spec.has_column(column))
                .map(|(column, reference)| DdlStep::AddForeignKey {
                    table: table.clone(),
                    constraint: foreign_key_name(&table, column),
                    reference: reference.clone(),
                });
            return std::iter::once(create).chain(references).collect();
        }
        DiffResult::Present {
            columns,
            indexes,
            foreign_keys,
            ..
        } => (columns, indexes, foreign_keys),
    };

    let mut steps = Vec::new();

    if let Some(cols) = columns.drifted() {
        for rename in &cols.renamed {
            if let Some(column) = spec.column(&rename.to) {
                steps.push(DdlStep::RenameColumn {
                    table: table.clone(),
                    from: rename.from.clone(),
                    column: column.clone(),
                });
            }
        }
        for column in spec.columns.iter().filter(|c| cols.added.contains(&c.name)) {
            steps.push(DdlStep::AddColumn {
                table: table.clone(),
                column: column.clone(),
                after: spec
                    .predecessor(&column.name)
                    .unwrap_or(PRIMARY_KEY_COLUMN)
                    .to_string(),
            });
        }
        for column in changed_columns(spec, &cols.changed) {
            steps.push(DdlStep::ModifyColumn {
                table: table.clone(),
                column: column.clone(),
            });
        }
        for column in &cols.removed {
            steps.push(DdlStep::DropColumnIfEmpty {
                table: table.clone(),
                column: column.clone(),
            });
        }
    }

    if let Some(idx) = indexes.drifted() {
        for name in &idx.added {
            if let Some(index) = spec.index(name) {
                steps.push(DdlStep::AddIndex {
                    table: table.clone(),
                    index: index.clone(),
                });
            }
        }
        for index in &idx.removed {
            steps.push(DdlStep::DropIndex {
                table: table.clone(),
                name: index.name.clone(),
            });
        }
        for name in &idx.changed {
            if let Some(index) = spec.index(name) {
                steps.push(DdlStep::DropIndex {
                    table: table.clone(),
                    name: name.clone(),
                });
                steps.push(DdlStep::AddIndex {
                    table: table.clone(),
                    index: index.clone(),
                });
            }
        }
    }

    if let Some(fks) = foreign_keys.drifted() {
        for (column, live) in &fks.removed {
            steps.push(DdlStep::DropForeignKey {
                table: table.clone(),
                column: column.clone(),
                constraint: live.constraint_name.clone(),
            });
            if let Some(step) = drop_backing_index(spec, live.index_name.as_deref()) {
                steps.push(step);
            }
        }
        for (column, reference) in &fks.added {
            steps.push(DdlStep::AddForeignKey {
                table: table.clone(),
                constraint: foreign_key_name(&table, column),
                reference: reference.clone(),
            });
        }
        for (column, change) in &fks.changed {
            steps.push(DdlStep::DropForeignKey {
                table: table.clone(),
                column: column.clone(),
                constraint: change.live.constraint_name.clone(),
            });
            if let Some(step) = drop_backing_index(spec, change.live.index_name.as_deref()) {
                steps.push(step);
            }
            steps.push(DdlStep::AddForeignKey {
                table: table.clone(),
                constraint: foreign_key_name(&table, column),
                reference: change.spec.clone(),
            });
        }
    }

    steps
}

/// Drop the index that backed a dropped constraint, unless the spec declares
/// that index in its own right.
fn drop_backing_index(spec: &TableSpec, index: Option<&str>) -> Option<DdlStep> {
    let name = index?;
    if spec.index(name).is_some() {
        return None;
    }
    Some(DdlStep::DropIndex {
        table: spec.name.clone(),
        name: name.to_string(),
    })
}

/// Changed columns in spec order.
fn changed_columns<'a>(
    spec: &'a TableSpec,
    changed: &'a [String],
) -> impl Iterator<Item = &'a ColumnSpec> {
    spec.columns.iter().filter(move |c| changed.contains(&c.name))
}
