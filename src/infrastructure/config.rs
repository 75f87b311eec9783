use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::domain::spec::RawTableSpec;

/// Everything the `tablesync` binary needs: where to connect, how to run,
/// and the table specs to enforce.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub database: DbConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub tables: Vec<RawTableSpec>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    /// Database driver: "mysql" (default) or "mariadb".
    #[serde(default = "default_driver")]
    pub driver: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub dbname: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
}

fn default_driver() -> String {
    "mysql".to_string()
}

fn default_port() -> u16 {
    3306
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    /// Plan only; nothing but metadata reads is sent.
    #[serde(default)]
    pub dry_run: bool,
    /// Where reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "./output".to_string()
}

impl DbConfig {
    /// Build a sqlx-compatible connection URL from this config.
    /// MariaDB speaks the MySQL protocol, so both use the `mysql://` scheme.
    pub fn url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.dbname
        )
    }
}

impl AppConfig {
    /// Load `path` (TOML), then overlay `TABLESYNC__*` environment variables,
    /// e.g. `TABLESYNC__DATABASE__PASSWORD`.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::new(path, FileFormat::Toml))
            .add_source(
                Environment::with_prefix("TABLESYNC")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let cfg: AppConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to parse config TOML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        match self.database.driver.as_str() {
            "mysql" | "mariadb" => Ok(()),
            other => bail!(
                "Unsupported driver '{}': expected \"mysql\" or \"mariadb\"",
                other
            ),
        }
    }
}
