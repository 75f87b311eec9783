use crate::domain::ddl::DdlStep;
use crate::domain::spec::{ColumnSpec, ForeignKeyRef, IndexSpec};
use crate::domain::value_objects::{default_expression, PRIMARY_KEY_COLUMN};
use crate::infrastructure::db::dialect::QueryDialect;
use serde_json::Value;

// ─────────────────────────────────────────────────────────────────────────────
// Metadata query builders
// ─────────────────────────────────────────────────────────────────────────────

/// `SHOW TABLES LIKE '<table>'`, with the LIKE wildcards escaped. The caller
/// still has to match the returned names exactly.
pub fn build_table_exists_query(table: &str) -> String {
    let pattern = table.replace('_', "\\_").replace('%', "\\%");
    format!("SHOW TABLES LIKE '{}'", pattern)
}

pub fn build_columns_query(table: &str, dialect: &dyn QueryDialect) -> String {
    format!("SHOW FIELDS FROM {}", dialect.quote_ident(table))
}

pub fn build_indexes_query(table: &str, dialect: &dyn QueryDialect) -> String {
    format!(
        "SHOW INDEXES FROM {} WHERE Key_name <> 'PRIMARY'",
        dialect.quote_ident(table)
    )
}

/// Foreign keys of `table` in the current database, one row per owning column.
pub fn build_foreign_keys_query(table: &str, dialect: &dyn QueryDialect) -> String {
    format!(
        "SELECT COLUMN_NAME AS column_name, \
         REFERENCED_TABLE_NAME AS referenced_table, \
         REFERENCED_COLUMN_NAME AS referenced_column, \
         CONSTRAINT_NAME AS constraint_name \
         FROM information_schema.KEY_COLUMN_USAGE \
         WHERE TABLE_SCHEMA = DATABASE() \
         AND TABLE_NAME = {} \
         AND REFERENCED_TABLE_NAME IS NOT NULL \
         ORDER BY ORDINAL_POSITION",
        dialect.sql_literal(&Value::String(table.to_string()))
    )
}

pub fn build_count_non_null_query(table: &str, column: &str, dialect: &dyn QueryDialect) -> String {
    format!(
        "SELECT COUNT(*) AS non_null FROM {} WHERE {} IS NOT NULL",
        dialect.quote_ident(table),
        dialect.quote_ident(column)
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// DDL rendering
// ─────────────────────────────────────────────────────────────────────────────

/// `` `name` type NULL|NOT NULL [DEFAULT lit] ``. The type is passed through
/// verbatim; the engine rejects a bad one. Time-function defaults go out
/// unquoted, everything else as a literal.
pub fn column_definition(column: &ColumnSpec, dialect: &dyn QueryDialect) -> String {
    let mut def = format!(
        "{} {} {}",
        dialect.quote_ident(&column.name),
        column.db_type,
        if column.nullable { "NULL" } else { "NOT NULL" }
    );
    if let Some(default) = &column.default {
        let rendered = match default {
            Value::String(s) => default_expression(s),
            _ => None,
        };
        def.push_str(" DEFAULT ");
        def.push_str(&rendered.unwrap_or_else(|| dialect.sql_literal(default)));
    }
    def
}

fn index_clause(index: &IndexSpec, dialect: &dyn QueryDialect) -> String {
    format!(
        "{}KEY {} ({})",
        if index.unique { "UNIQUE " } else { "" },
        dialect.quote_ident(&index.name),
        dialect.quote_ident(&index.column)
    )
}

fn foreign_key_clause(constraint: &str, fk: &ForeignKeyRef, dialect: &dyn QueryDialect) -> String {
    format!(
        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
        dialect.quote_ident(constraint),
        dialect.quote_ident(&fk.column),
        dialect.quote_ident(&fk.table),
        dialect.quote_ident(&fk.referenced_column)
    )
}

/// Render one step as a single MySQL statement.
///
/// `DropColumnIfEmpty` renders the bare `DROP COLUMN`; the non-null guard is
/// the executor's job.
pub fn render_step(step: &DdlStep, dialect: &dyn QueryDialect) -> String {
    let q = |s: &str| dialect.quote_ident(s);
    match step {
        DdlStep::CreateTable {
            table,
            columns,
            indexes,
        } => {
            let mut lines = vec![format!(
                "{} int NOT NULL AUTO_INCREMENT PRIMARY KEY",
                q(PRIMARY_KEY_COLUMN)
            )];
            lines.extend(columns.iter().map(|c| column_definition(c, dialect)));
            lines.extend(indexes.iter().map(|i| index_clause(i, dialect)));
            format!(
                "CREATE TABLE {} (\n  {}\n) ENGINE=InnoDB",
                q(table),
                lines.join(",\n  ")
            )
        }
        DdlStep::RenameColumn {
            table,
            from,
            column,
        } => format!(
            "ALTER TABLE {} CHANGE {} {}",
            q(table),
            q(from),
            column_definition(column, dialect)
        ),
        DdlStep::AddColumn {
            table,
            column,
            after,
        } => format!(
            "ALTER TABLE {} ADD COLUMN {} AFTER {}",
            q(table),
            column_definition(column, dialect),
            q(after)
        ),
        DdlStep::ModifyColumn { table, column } => format!(
            "ALTER TABLE {} MODIFY COLUMN {}",
            q(table),
            column_definition(column, dialect)
        ),
        DdlStep::DropColumnIfEmpty { table, column } => {
            format!("ALTER TABLE {} DROP COLUMN {}", q(table), q(column))
        }
        DdlStep::AddIndex { table, index } => format!(
            "ALTER TABLE {} ADD {}INDEX {} ({})",
            q(table),
            if index.unique { "UNIQUE " } else { "" },
            q(&index.name),
            q(&index.column)
        ),
        DdlStep::DropIndex { table, name } => {
            format!("ALTER TABLE {} DROP INDEX {}", q(table), q(name))
        }
        DdlStep::DropForeignKey {
            table, constraint, ..
        } => format!("ALTER TABLE {} DROP FOREIGN KEY {}", q(table), q(constraint)),
        DdlStep::AddForeignKey {
            table,
            constraint,
            reference,
        } => format!(
            "ALTER TABLE {} ADD {}",
            q(table),
            foreign_key_clause(constraint, reference, dialect)
        ),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::dialect::MysqlDialect;
    use serde_json::json;

    fn my() -> MysqlDialect {
        MysqlDialect
    }

    fn status() -> ColumnSpec {
        let mut c = ColumnSpec::new("status");
        c.db_type = "varchar(20)".into();
        c.nullable = false;
        c
    }

    fn customer_fk() -> ForeignKeyRef {
        ForeignKeyRef {
            column: "customer_id".into(),
            table: "customers".into(),
            referenced_column: "ID".into(),
        }
    }

    #[test]
    fn test_table_exists_query_escapes_like_wildcards() {
        assert_eq!(
            build_table_exists_query("order_items"),
            r"SHOW TABLES LIKE 'order\_items'"
        );
    }

    #[test]
    fn test_metadata_queries() {
        assert_eq!(build_columns_query("orders", &my()), "SHOW FIELDS FROM `orders`");
        assert_eq!(
            build_indexes_query("orders", &my()),
            "SHOW INDEXES FROM `orders` WHERE Key_name <> 'PRIMARY'"
        );
        let fk = build_foreign_keys_query("orders", &my());
        assert!(fk.contains("information_schema.KEY_COLUMN_USAGE"));
        assert!(fk.contains("TABLE_NAME = 'orders'"));
        assert!(fk.contains("REFERENCED_TABLE_NAME IS NOT NULL"));
        assert_eq!(
            build_count_non_null_query("orders", "legacy", &my()),
            "SELECT COUNT(*) AS non_null FROM `orders` WHERE `legacy` IS NOT NULL"
        );
    }

    #[test]
    fn test_column_definition() {
        assert_eq!(column_definition(&status(), &my()), "`status` varchar(20) NOT NULL");

        let mut qty = ColumnSpec::new("qty");
        qty.db_type = "int".into();
        qty.default = Some(json!(0));
        assert_eq!(column_definition(&qty, &my()), "`qty` int NULL DEFAULT 0");

        let mut label = ColumnSpec::new("label");
        label.default = Some(json!("it's"));
        assert_eq!(
            column_definition(&label, &my()),
            "`label` varchar(200) NULL DEFAULT 'it''s'"
        );
    }

    #[test]
    fn test_time_function_default_is_not_quoted() {
        let mut created = ColumnSpec::new("created");
        created.db_type = "timestamp".into();
        created.nullable = false;
        created.default = Some(json!("CURRENT_TIMESTAMP"));
        assert_eq!(
            column_definition(&created, &my()),
            "`created` timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP"
        );

        created.db_type = "datetime(3)".into();
        created.default = Some(json!("now(3)"));
        assert_eq!(
            column_definition(&created, &my()),
            "`created` datetime(3) NOT NULL DEFAULT CURRENT_TIMESTAMP(3)"
        );
    }

    #[test]
    fn test_render_create_table() {
        let mut email = ColumnSpec::new("email");
        email.unique = true;
        let mut customer = ColumnSpec::new("customer_id");
        customer.db_type = "int".into();
        let step = DdlStep::CreateTable {
            table: "orders".into(),
            columns: vec![status(), email, customer],
            indexes: vec![IndexSpec {
                name: "unique_email".into(),
                column: "email".into(),
                unique: true,
            }],
        };
        assert_eq!(
            render_step(&step, &my()),
            "CREATE TABLE `orders` (\n  \
             `ID` int NOT NULL AUTO_INCREMENT PRIMARY KEY,\n  \
             `status` varchar(20) NOT NULL,\n  \
             `email` varchar(200) NULL,\n  \
             `customer_id` int NULL,\n  \
             UNIQUE KEY `unique_email` (`email`)\n\
             ) ENGINE=InnoDB"
        );
    }

    #[test]
    fn test_render_column_steps() {
        let t = "orders".to_string();
        assert_eq!(
            render_step(
                &DdlStep::RenameColumn { table: t.clone(), from: "state".into(), column: status() },
                &my()
            ),
            "ALTER TABLE `orders` CHANGE `state` `status` varchar(20) NOT NULL"
        );
        assert_eq!(
            render_step(
                &DdlStep::AddColumn { table: t.clone(), column: status(), after: "ID".into() },
                &my()
            ),
            "ALTER TABLE `orders` ADD COLUMN `status` varchar(20) NOT NULL AFTER `ID`"
        );
        assert_eq!(
            render_step(&DdlStep::ModifyColumn { table: t.clone(), column: status() }, &my()),
            "ALTER TABLE `orders` MODIFY COLUMN `status` varchar(20) NOT NULL"
        );
        assert_eq!(
            render_step(&DdlStep::DropColumnIfEmpty { table: t, column: "legacy".into() }, &my()),
            "ALTER TABLE `orders` DROP COLUMN `legacy`"
        );
    }

    #[test]
    fn test_render_index_and_foreign_key_steps() {
        let t = "orders".to_string();
        let idx = IndexSpec { name: "idx_status".into(), column: "status".into(), unique: false };
        assert_eq!(
            render_step(&DdlStep::AddIndex { table: t.clone(), index: idx }, &my()),
            "ALTER TABLE `orders` ADD INDEX `idx_status` (`status`)"
        );
        let uniq = IndexSpec { name: "unique_code".into(), column: "code".into(), unique: true };
        assert_eq!(
            render_step(&DdlStep::AddIndex { table: t.clone(), index: uniq }, &my()),
            "ALTER TABLE `orders` ADD UNIQUE INDEX `unique_code` (`code`)"
        );
        assert_eq!(
            render_step(&DdlStep::DropIndex { table: t.clone(), name: "unique_code".into() }, &my()),
            "ALTER TABLE `orders` DROP INDEX `unique_code`"
        );
        assert_eq!(
            render_step(
                &DdlStep::DropForeignKey {
                    table: t.clone(),
                    column: "customer_id".into(),
                    constraint: "orders_ibfk_1".into()
                },
                &my()
            ),
            "ALTER TABLE `orders` DROP FOREIGN KEY `orders_ibfk_1`"
        );
        assert_eq!(
            render_step(
                &DdlStep::AddForeignKey {
                    table: t,
                    constraint: "fk_orders_customer_id".into(),
                    reference: customer_fk()
                },
                &my()
            ),
            "ALTER TABLE `orders` ADD CONSTRAINT `fk_orders_customer_id` FOREIGN KEY (`customer_id`) REFERENCES `customers` (`ID`)"
        );
    }
}
