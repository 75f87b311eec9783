use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument, warn};

use crate::domain::{
    diff_result::{
        ColumnsDiff, DiffResult, Drift, ForeignKeyChange, ForeignKeysDiff, IndexesDiff, Rename,
    },
    live::{LiveColumn, LiveForeignKey, LiveIndex},
    ports::SchemaIntrospector,
    spec::{ColumnSpec, ForeignKeyRef, IndexSpec, TableSpec},
    sync_report::Diagnostic,
    value_objects::{default_expression, PRIMARY_KEY_COLUMN},
};

// ─── Schema Differ ───

/// Compares a [`TableSpec`] with what the database currently holds.
///
/// Read-only: issues metadata queries (existence, columns, indexes, foreign
/// keys) one after the other and never mutates the schema.
pub struct SchemaDiffer<'a> {
    introspector: &'a dyn SchemaIntrospector,
}

impl<'a> SchemaDiffer<'a> {
    pub fn new(introspector: &'a dyn SchemaIntrospector) -> Self {
        Self { introspector }
    }

    #[instrument(name = "check", skip(self, spec), fields(db.table = %spec.name), level = "info")]
    pub async fn check(&self, spec: &TableSpec) -> Result<DiffResult> {
        let table = spec.name.as_str();

        let exists = self
            .introspector
            .table_exists(table)
            .await
            .with_context(|| format!("Failed to check whether table {} exists", table))?;
        if !exists {
            info!(table, "table does not exist");
            return Ok(DiffResult::Missing {
                table: table.to_string(),
            });
        }

        let live_columns = self
            .introspector
            .live_columns(table)
            .await
            .with_context(|| format!("Failed to read columns of {}", table))?;
        let live_indexes = self
            .introspector
            .live_indexes(table)
            .await
            .with_context(|| format!("Failed to read indexes of {}", table))?;
        let live_fks = self
            .introspector
            .live_foreign_keys(table, &live_indexes)
            .await
            .with_context(|| format!("Failed to read foreign keys of {}", table))?;

        debug!(
            table,
            columns = live_columns.len(),
            indexes = live_indexes.len(),
            foreign_keys = live_fks.len(),
            "live schema read"
        );

        let mut diagnostics = Vec::new();

        let columns = Drift::from_diff(diff_columns(spec, &live_columns));

        let spec_indexes: Vec<&IndexSpec> = spec
            .indexes
            .iter()
            .filter(|idx| {
                let known = spec.has_column(&idx.column);
                if !known {
                    let msg = format!(
                        "Attempting to add index '{}' to non-existent column '{}.{}'",
                        idx.name, table, idx.column
                    );
                    warn!("{}", msg);
                    diagnostics.push(Diagnostic::warning(table, msg));
                }
                known
            })
            .collect();
        let indexes = Drift::from_diff(diff_indexes(&spec_indexes, &live_indexes, &live_fks));

        let foreign_keys = match &spec.foreign_keys {
            None => Drift::InSync,
            Some(declared) => {
                let declared: BTreeMap<&str, &ForeignKeyRef> = declared
                    .iter()
                    .filter(|(column, fk)| {
                        let known = spec.has_column(column);
                        if !known {
                            let msg = format!(
                                "Foreign key on non-existent column '{}.{}' referencing '{}.{}' was skipped",
                                table, column, fk.table, fk.referenced_column
                            );
                            warn!("{}", msg);
                            diagnostics.push(Diagnostic::warning(table, msg));
                        }
                        known
                    })
                    .map(|(column, fk)| (column.as_str(), fk))
                    .collect();
                Drift::from_diff(diff_foreign_keys(&declared, &live_fks))
            }
        };

        let result = DiffResult::Present {
            table: table.to_string(),
            columns,
            indexes,
            foreign_keys,
            diagnostics,
        };
        info!(table, in_sync = result.is_in_sync(), "check completed");
        Ok(result)
    }
}

// ─── Columns ───

/// A column together with its neighbours, used to pair removed and added
/// columns into renames.
#[derive(Debug)]
struct Placement<'a> {
    name: &'a str,
    column_type: &'a str,
    index: usize,
    before: &'a str,
    after: Option<&'a str>,
}

impl Placement<'_> {
    /// Best-effort: two neighbouring renames, or adjacent columns of the same
    /// type, can pair the wrong way round.
    fn looks_like_rename_of(&self, removed: &Placement<'_>) -> bool {
        let same_type = types_match(self.column_type, removed.column_type);
        let same_neighbours = self.before == removed.before && self.after == removed.after;
        same_type && (same_neighbours || self.index == removed.index)
    }
}

fn live_placement(live: &[LiveColumn], pos: usize) -> Placement<'_> {
    let col = &live[pos];
    Placement {
        name: &col.name,
        column_type: &col.column_type,
        index: col.index,
        before: if pos > 0 {
            &live[pos - 1].name
        } else {
            PRIMARY_KEY_COLUMN
        },
        after: live.get(pos + 1).map(|c| c.name.as_str()),
    }
}

fn spec_placement(spec: &TableSpec, pos: usize) -> Placement<'_> {
    let col = &spec.columns[pos];
    Placement {
        name: &col.name,
        column_type: &col.db_type,
        index: pos,
        before: if pos > 0 {
            &spec.columns[pos - 1].name
        } else {
            PRIMARY_KEY_COLUMN
        },
        after: spec.columns.get(pos + 1).map(|c| c.name.as_str()),
    }
}

/// Partition spec and live columns into added / removed / renamed / changed.
pub fn diff_columns(spec: &TableSpec, live: &[LiveColumn]) -> ColumnsDiff {
    let live_by_name: BTreeMap<&str, &LiveColumn> =
        live.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut removed: Vec<usize> = (0..live.len())
        .filter(|&i| !spec.has_column(&live[i].name))
        .collect();
    let mut added: Vec<usize> = (0..spec.columns.len())
        .filter(|&i| !live_by_name.contains_key(spec.columns[i].name.as_str()))
        .collect();

    let changed: Vec<String> = spec
        .columns
        .iter()
        .filter(|c| {
            live_by_name
                .get(c.name.as_str())
                .is_some_and(|l| column_changed(c, l))
        })
        .map(|c| c.name.clone())
        .collect();

    let mut renamed = Vec::new();
    if !removed.is_empty() && !added.is_empty() {
        let mut candidates: Vec<Placement<'_>> =
            removed.iter().map(|&i| live_placement(live, i)).collect();

        // Greedy, in spec order: first structural match wins and is consumed.
        added.retain(|&i| {
            let to = spec_placement(spec, i);
            match candidates.iter().position(|from| to.looks_like_rename_of(from)) {
                Some(pos) => {
                    let from = candidates.remove(pos);
                    debug!(from = from.name, to = to.name, "column looks renamed");
                    renamed.push(Rename {
                        from: from.name.to_string(),
                        to: to.name.to_string(),
                    });
                    false
                }
                None => true,
            }
        });

        let still_removed: BTreeSet<&str> = candidates.iter().map(|c| c.name).collect();
        removed.retain(|&i| still_removed.contains(live[i].name.as_str()));
    }

    ColumnsDiff {
        added: added.iter().map(|&i| spec.columns[i].name.clone()).collect(),
        removed: removed.iter().map(|&i| live[i].name.clone()).collect(),
        renamed,
        changed,
    }
}

/// Does the live column differ from its spec in type, nullability or default?
pub fn column_changed(spec: &ColumnSpec, live: &LiveColumn) -> bool {
    !types_match(&spec.db_type, &live.column_type)
        || spec.nullable != live.is_nullable()
        || !defaults_match(spec.default.as_ref(), live.default.as_deref())
}

const INTEGER_TYPES: [&str; 6] = ["tinyint", "smallint", "mediumint", "int", "integer", "bigint"];

/// Compare a declared type with an engine-reported one.
///
/// Case and whitespace are ignored, and so are integer display widths
/// (`int` vs `int(11)`), which MySQL adds or drops depending on version.
pub fn types_match(declared: &str, live: &str) -> bool {
    canonical_type(declared) == canonical_type(live)
}

fn canonical_type(t: &str) -> String {
    let t = t.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase();
    let (base, rest) = match t.find('(') {
        Some(open) => (t[..open].trim_end(), &t[open..]),
        None => match t.find(' ') {
            Some(sp) => (&t[..sp], &t[sp..]),
            None => (t.as_str(), ""),
        },
    };
    let base = match base {
        "integer" => "int",
        "bool" | "boolean" => "tinyint",
        other => other,
    };
    if !INTEGER_TYPES.contains(&base) {
        return t;
    }
    let rest = match rest.strip_prefix('(').and_then(|r| r.split_once(')')) {
        Some((width, tail)) if width.chars().all(|c| c.is_ascii_digit()) => tail,
        _ => rest,
    };
    format!("{}{}", base, rest.trim_end())
}

/// Compare a declared default with the engine's textual one. Numbers are
/// compared numerically, booleans against `1`/`0` or `true`/`false`, time
/// functions by their canonical spelling.
pub fn defaults_match(declared: Option<&Value>, live: Option<&str>) -> bool {
    match (declared, live) {
        (None, None) => true,
        (Some(Value::Number(n)), Some(l)) => match (n.as_f64(), l.trim().parse::<f64>()) {
            (Some(a), Ok(b)) => a == b,
            _ => false,
        },
        (Some(Value::String(s)), Some(l)) => match (default_expression(s), default_expression(l)) {
            (Some(a), Some(b)) => a == b,
            _ => s == l,
        },
        (Some(Value::Bool(b)), Some(l)) => {
            let l = l.trim().to_ascii_lowercase();
            if *b {
                l == "1" || l == "true"
            } else {
                l == "0" || l == "false"
            }
        }
        _ => false,
    }
}

// ─── Indexes ───

/// Compare declared indexes with live ones, by name.
///
/// Indexes that back a live foreign key belong to the foreign-key diff and
/// are left out here.
pub fn diff_indexes(
    spec: &[&IndexSpec],
    live: &[LiveIndex],
    live_fks: &[LiveForeignKey],
) -> IndexesDiff {
    let backing: BTreeSet<&str> = live_fks
        .iter()
        .filter_map(|fk| fk.index_name.as_deref())
        .collect();
    let declared: BTreeSet<&str> = spec.iter().map(|i| i.name.as_str()).collect();
    let live: Vec<&LiveIndex> = live
        .iter()
        .filter(|i| !backing.contains(i.name.as_str()) || declared.contains(i.name.as_str()))
        .collect();

    let mut diff = IndexesDiff::default();
    for idx in spec {
        match live.iter().find(|l| l.name == idx.name) {
            None => diff.added.push(idx.name.clone()),
            Some(l) if l.column != idx.column || l.unique != idx.unique => {
                diff.changed.push(idx.name.clone())
            }
            Some(_) => {}
        }
    }
    for l in &live {
        if !declared.contains(l.name.as_str()) && !diff.removed.iter().any(|r| r.name == l.name) {
            diff.removed.push((*l).clone());
        }
    }
    diff
}

// ─── Foreign keys ───

/// Compare declared foreign keys with live ones, per owning column.
pub fn diff_foreign_keys(
    declared: &BTreeMap<&str, &ForeignKeyRef>,
    live: &[LiveForeignKey],
) -> ForeignKeysDiff {
    let mut live_by_column: BTreeMap<&str, &LiveForeignKey> = BTreeMap::new();
    for fk in live {
        live_by_column.entry(fk.column.as_str()).or_insert(fk);
    }

    let mut diff = ForeignKeysDiff::default();
    for (&column, &fk) in declared {
        match live_by_column.remove(column) {
            None => {
                diff.added.insert(column.to_string(), fk.clone());
            }
            Some(l) if l.table != fk.table || l.referenced_column != fk.referenced_column => {
                diff.changed.insert(
                    column.to_string(),
                    ForeignKeyChange {
                        live: l.clone(),
                        spec: fk.clone(),
                    },
                );
            }
            Some(_) => {}
        }
    }
    for (column, l) in live_by_column {
        diff.removed.insert(column.to_string(), l.clone());
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::normalizer::normalize;
    use crate::domain::spec::RawTableSpec;
    use async_trait::async_trait;
    use serde_json::json;

    fn spec(v: Value) -> TableSpec {
        let raw: RawTableSpec = serde_json::from_value(v).unwrap();
        normalize(&raw).unwrap()
    }

    fn live(cols: &[(&str, &str)]) -> Vec<LiveColumn> {
        cols.iter()
            .enumerate()
            .map(|(i, (name, ty))| LiveColumn {
                name: name.to_string(),
                column_type: ty.to_string(),
                nullable: "YES".into(),
                default: None,
                index: i,
            })
            .collect()
    }

    fn live_fk(column: &str, table: &str, referenced: &str) -> LiveForeignKey {
        LiveForeignKey {
            column: column.into(),
            table: table.into(),
            referenced_column: referenced.into(),
            constraint_name: format!("fk_orders_{}", column),
            index_name: Some(format!("fk_orders_{}", column)),
        }
    }

    // ── columns ──

    #[test]
    fn identical_columns_produce_empty_diff() {
        let s = spec(json!({ "name": "t", "columns": {
            "a": { "db": { "type": "int" } },
            "b": {}
        }}));
        let d = diff_columns(&s, &live(&[("a", "int"), ("b", "varchar(200)")]));
        assert_eq!(d, ColumnsDiff::default());
    }

    #[test]
    fn detects_rename_from_neighbours() {
        let s = spec(json!({ "name": "t", "columns": { "A": {}, "B2": {}, "C": {} } }));
        let l = live(&[("A", "varchar(200)"), ("B", "varchar(200)"), ("C", "varchar(200)")]);
        let d = diff_columns(&s, &l);
        assert_eq!(
            d.renamed,
            vec![Rename {
                from: "B".into(),
                to: "B2".into()
            }]
        );
        assert!(d.added.is_empty());
        assert!(d.removed.is_empty());
    }

    #[test]
    fn detects_rename_from_position_when_neighbours_differ() {
        // B → B2 at index 1 while C is new, so the neighbours no longer match
        let s = spec(json!({ "name": "t", "columns": { "A": {}, "B2": {}, "C": {} } }));
        let l = live(&[("A", "varchar(200)"), ("B", "varchar(200)")]);
        let d = diff_columns(&s, &l);
        assert_eq!(d.renamed.len(), 1);
        assert_eq!(d.renamed[0].from, "B");
        assert_eq!(d.added, vec!["C".to_string()]);
        assert!(d.removed.is_empty());
    }

    #[test]
    fn type_mismatch_prevents_rename() {
        let s = spec(json!({ "name": "t", "columns": {
            "A": {}, "B2": { "db": { "type": "int" } }, "C": {}
        }}));
        let l = live(&[("A", "varchar(200)"), ("B", "varchar(200)"), ("C", "varchar(200)")]);
        let d = diff_columns(&s, &l);
        assert!(d.renamed.is_empty());
        assert_eq!(d.added, vec!["B2".to_string()]);
        assert_eq!(d.removed, vec!["B".to_string()]);
    }

    #[test]
    fn first_column_uses_primary_key_as_before() {
        let s = spec(json!({ "name": "t", "columns": { "first2": {}, "x": { "db": { "type": "int" } } } }));
        let l = live(&[("first", "varchar(200)"), ("x", "int")]);
        let d = diff_columns(&s, &l);
        assert_eq!(d.renamed[0].from, "first");
        assert_eq!(d.renamed[0].to, "first2");
    }

    #[test]
    fn rename_pairing_is_greedy_in_spec_order() {
        // two same-typed adjacent renames: each pairs by position
        let s = spec(json!({ "name": "t", "columns": { "p": {}, "q": {} } }));
        let l = live(&[("x", "varchar(200)"), ("y", "varchar(200)")]);
        let d = diff_columns(&s, &l);
        assert_eq!(
            d.renamed,
            vec![
                Rename { from: "x".into(), to: "p".into() },
                Rename { from: "y".into(), to: "q".into() },
            ]
        );
    }

    #[test]
    fn unpaired_columns_stay_added_and_removed() {
        let s = spec(json!({ "name": "t", "columns": { "a": {}, "n": { "db": { "type": "int" } } } }));
        let l = live(&[("a", "varchar(200)"), ("b", "varchar(200)"), ("old", "text")]);
        let d = diff_columns(&s, &l);
        assert!(d.renamed.is_empty());
        assert_eq!(d.added, vec!["n".to_string()]);
        assert_eq!(d.removed, vec!["b".to_string(), "old".to_string()]);
    }

    #[test]
    fn nullability_compares_against_yes_no_case_insensitively() {
        let s = spec(json!({ "name": "t", "columns": { "a": { "db": { "null": false } } } }));
        let mut l = live(&[("a", "varchar(200)")]);
        l[0].nullable = "no".into();
        assert!(diff_columns(&s, &l).changed.is_empty());
        l[0].nullable = "YES".into();
        assert_eq!(diff_columns(&s, &l).changed, vec!["a".to_string()]);
    }

    #[test]
    fn type_change_is_detected_once() {
        let s = spec(json!({ "name": "t", "columns": { "a": { "db": { "type": "text", "null": false } } } }));
        let l = live(&[("a", "varchar(200)")]);
        assert_eq!(diff_columns(&s, &l).changed, vec!["a".to_string()]);
    }

    #[test]
    fn defaults_compare_numerically() {
        assert!(defaults_match(Some(&json!(0)), Some("0")));
        assert!(defaults_match(Some(&json!(1.5)), Some("1.50")));
        assert!(!defaults_match(Some(&json!(2)), Some("3")));
        assert!(defaults_match(Some(&json!("new")), Some("new")));
        assert!(!defaults_match(Some(&json!("new")), None));
        assert!(!defaults_match(None, Some("x")));
        assert!(defaults_match(None, None));
        assert!(defaults_match(Some(&json!(true)), Some("1")));
        assert!(defaults_match(Some(&json!(false)), Some("0")));
        assert!(!defaults_match(Some(&json!(false)), Some("1")));
    }

    #[test]
    fn time_function_defaults_match_either_spelling() {
        assert!(defaults_match(Some(&json!("CURRENT_TIMESTAMP")), Some("CURRENT_TIMESTAMP")));
        assert!(defaults_match(Some(&json!("CURRENT_TIMESTAMP")), Some("current_timestamp()")));
        assert!(defaults_match(Some(&json!("NOW()")), Some("CURRENT_TIMESTAMP")));
        assert!(!defaults_match(Some(&json!("CURRENT_TIMESTAMP(3)")), Some("CURRENT_TIMESTAMP")));
        assert!(!defaults_match(Some(&json!("CURRENT_TIMESTAMP")), Some("new")));
    }

    #[test]
    fn types_ignore_case_whitespace_and_int_width() {
        assert!(types_match("VARCHAR(20)", "varchar(20)"));
        assert!(types_match("int", "int(11)"));
        assert!(types_match("int unsigned", "int(10) unsigned"));
        assert!(types_match("integer", "int"));
        assert!(types_match("boolean", "tinyint(1)"));
        assert!(types_match("decimal(10, 2)", "decimal(10, 2)"));
        assert!(!types_match("varchar(20)", "varchar(30)"));
        assert!(!types_match("int", "bigint(20)"));
        assert!(!types_match("int unsigned", "int(11)"));
    }

    // ── indexes ──

    fn live_index(name: &str, column: &str, unique: bool) -> LiveIndex {
        LiveIndex {
            name: name.into(),
            column: column.into(),
            unique,
        }
    }

    #[test]
    fn index_added_removed_changed() {
        let a = IndexSpec { name: "unique_email".into(), column: "email".into(), unique: true };
        let b = IndexSpec { name: "idx_city".into(), column: "city".into(), unique: false };
        let live = vec![
            live_index("idx_city", "city", true),
            live_index("unique_old", "old", true),
        ];
        let d = diff_indexes(&[&a, &b], &live, &[]);
        assert_eq!(d.added, vec!["unique_email".to_string()]);
        assert_eq!(d.changed, vec!["idx_city".to_string()]);
        assert_eq!(d.removed, vec![live_index("unique_old", "old", true)]);
    }

    #[test]
    fn foreign_key_backing_indexes_are_not_index_drift() {
        let live = vec![live_index("fk_orders_customer_id", "customer_id", false)];
        let fks = vec![live_fk("customer_id", "customers", "ID")];
        assert_eq!(diff_indexes(&[], &live, &fks), IndexesDiff::default());
        // but a plain non-unique index with no constraint is
        assert_eq!(diff_indexes(&[], &live, &[]).removed.len(), 1);
    }

    // ── foreign keys ──

    fn fk_ref(column: &str, table: &str) -> ForeignKeyRef {
        ForeignKeyRef {
            column: column.into(),
            table: table.into(),
            referenced_column: "ID".into(),
        }
    }

    #[test]
    fn foreign_keys_added_removed_changed() {
        let customer = fk_ref("customer_id", "customers");
        let product = fk_ref("product_id", "products");
        let declared: BTreeMap<&str, &ForeignKeyRef> =
            [("customer_id", &customer), ("product_id", &product)].into_iter().collect();
        let live = vec![
            live_fk("customer_id", "clients", "ID"),
            live_fk("store_id", "stores", "ID"),
        ];
        let d = diff_foreign_keys(&declared, &live);
        assert_eq!(d.added.keys().collect::<Vec<_>>(), ["product_id"]);
        assert_eq!(d.removed.keys().collect::<Vec<_>>(), ["store_id"]);
        let change = &d.changed["customer_id"];
        assert_eq!(change.live.table, "clients");
        assert_eq!(change.spec.table, "customers");
    }

    #[test]
    fn referenced_column_change_counts_as_changed() {
        let mut r = fk_ref("customer_id", "customers");
        r.referenced_column = "code".into();
        let declared: BTreeMap<&str, &ForeignKeyRef> = [("customer_id", &r)].into_iter().collect();
        let d = diff_foreign_keys(&declared, &[live_fk("customer_id", "customers", "ID")]);
        assert!(d.changed.contains_key("customer_id"));
    }

    // ── SchemaDiffer ──

    #[derive(Default)]
    struct StaticIntrospector {
        exists: bool,
        columns: Vec<LiveColumn>,
        indexes: Vec<LiveIndex>,
        fks: Vec<LiveForeignKey>,
        fail_columns: bool,
    }

    #[async_trait]
    impl SchemaIntrospector for StaticIntrospector {
        async fn table_exists(&self, _table: &str) -> Result<bool> {
            Ok(self.exists)
        }
        async fn live_columns(&self, _table: &str) -> Result<Vec<LiveColumn>> {
            if self.fail_columns {
                anyhow::bail!("connection lost");
            }
            Ok(self.columns.clone())
        }
        async fn live_indexes(&self, _table: &str) -> Result<Vec<LiveIndex>> {
            Ok(self.indexes.clone())
        }
        async fn live_foreign_keys(
            &self,
            _table: &str,
            _indexes: &[LiveIndex],
        ) -> Result<Vec<LiveForeignKey>> {
            Ok(self.fks.clone())
        }
        async fn count_non_null(&self, _table: &str, _column: &str) -> Result<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn check_reports_missing_table() {
        let intro = StaticIntrospector::default();
        let s = spec(json!({ "name": "orders", "columns": { "status": {} } }));
        let d = SchemaDiffer::new(&intro).check(&s).await.unwrap();
        assert!(!d.table_exists());
        assert!(!d.is_in_sync());
    }

    #[tokio::test]
    async fn check_in_sync_table() {
        let intro = StaticIntrospector {
            exists: true,
            columns: live(&[("status", "varchar(200)")]),
            ..Default::default()
        };
        let s = spec(json!({ "name": "orders", "columns": { "status": {} } }));
        let d = SchemaDiffer::new(&intro).check(&s).await.unwrap();
        assert!(d.is_in_sync());
    }

    #[tokio::test]
    async fn check_skips_index_on_unknown_column_with_diagnostic() {
        let intro = StaticIntrospector {
            exists: true,
            columns: live(&[("status", "varchar(200)")]),
            ..Default::default()
        };
        let s = spec(json!({
            "name": "orders",
            "columns": { "status": {} },
            "indexes": { "idx_ghost": { "column": "ghost" } }
        }));
        let d = SchemaDiffer::new(&intro).check(&s).await.unwrap();
        assert!(d.is_in_sync());
        assert_eq!(d.diagnostics().len(), 1);
        assert!(d.diagnostics()[0].message.contains("idx_ghost"));
    }

    #[tokio::test]
    async fn check_leaves_foreign_keys_alone_without_constraints() {
        let intro = StaticIntrospector {
            exists: true,
            columns: live(&[("customer_id", "varchar(200)")]),
            indexes: vec![live_index("fk_orders_customer_id", "customer_id", false)],
            fks: vec![live_fk("customer_id", "customers", "ID")],
            ..Default::default()
        };
        let s = spec(json!({ "name": "orders", "columns": { "customer_id": {} } }));
        let d = SchemaDiffer::new(&intro).check(&s).await.unwrap();
        assert!(d.is_in_sync(), "{:?}", d);
    }

    #[tokio::test]
    async fn check_propagates_metadata_failures() {
        let intro = StaticIntrospector {
            exists: true,
            fail_columns: true,
            ..Default::default()
        };
        let s = spec(json!({ "name": "orders", "columns": { "status": {} } }));
        let err = SchemaDiffer::new(&intro).check(&s).await.unwrap_err();
        assert!(format!("{:#}", err).contains("connection lost"));
    }
}
