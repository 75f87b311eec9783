use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use std::sync::Arc;
use tracing::debug;

use crate::domain::ports::Session;
use crate::domain::value_objects::{ExecOutcome, RowMap};
use crate::infrastructure::config::DbConfig;
use crate::infrastructure::db::dialect::{from_driver, Dialect};
use crate::infrastructure::db::row_mapper::row_to_map;

/// `Session` over a sqlx connection pool.
///
/// The pool is capped at one connection: DDL on MySQL is not transactional
/// and statements for a table must run in order on the same connection.
pub struct SqlxSession {
    pool: AnyPool,
    driver: &'static str,
    dialect: Arc<dyn Dialect>,
}

/// Connect to the database described in `cfg` and return a `SqlxSession`.
pub async fn connect(cfg: &DbConfig) -> Result<SqlxSession> {
    sqlx::any::install_default_drivers();

    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect(&cfg.url())
        .await
        .with_context(|| {
            format!(
                "Failed to connect to {} (driver: {})",
                cfg.dbname, cfg.driver
            )
        })?;

    debug!(
        "Connected to {}/{} via {} driver",
        cfg.host, cfg.dbname, cfg.driver
    );

    let dialect: Arc<dyn Dialect> = Arc::from(from_driver(&cfg.driver));
    Ok(SqlxSession {
        pool,
        driver: dialect.name(),
        dialect,
    })
}

impl SqlxSession {
    /// Wrap an existing pool, e.g. one the caller already owns.
    pub fn from_pool(pool: AnyPool, driver: &str) -> Self {
        let dialect: Arc<dyn Dialect> = Arc::from(from_driver(driver));
        Self {
            pool,
            driver: dialect.name(),
            dialect,
        }
    }
}

#[async_trait]
impl Session for SqlxSession {
    fn driver(&self) -> &'static str {
        self.driver
    }

    async fn query(&self, sql: &str) -> Result<Vec<RowMap>> {
        // raw_sql: metadata statements (SHOW ...) are not preparable on MySQL
        let rows = sqlx::raw_sql(sql)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Query failed: {}", sql))?;

        let mut result = Vec::with_capacity(rows.len());
        for row in &rows {
            result.push(row_to_map(row, self.dialect.as_ref())?);
        }
        Ok(result)
    }

    async fn execute(&self, sql: &str) -> Result<ExecOutcome> {
        let done = sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Statement failed: {}", sql))?;
        Ok(ExecOutcome {
            rows_affected: done.rows_affected(),
            last_insert_id: done
                .last_insert_id()
                .and_then(|id| u64::try_from(id).ok()),
        })
    }
}
