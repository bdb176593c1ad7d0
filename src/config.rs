//! Connection settings
//!
//! Credentials live in a JSON secrets file (by default in the platform config
//! directory) and can be overridden through `SALES_INSIGHTS_*` environment
//! variables. Database and schema are chosen per command on the command line.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "SALES_INSIGHTS_";
const DEFAULT_ACCOUNT: &str = "local";
const DEFAULT_WAREHOUSE: &str = "COMPUTE_WH";

/// Layout of the secrets file:
///
/// ```json
/// { "warehouse": { "user": "analyst", "password": "...", "account": "local" } }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct SecretsFile {
    #[serde(default)]
    pub warehouse: WarehouseSecrets,
}

#[derive(Debug, Default, Deserialize)]
pub struct WarehouseSecrets {
    pub user: Option<String>,
    pub password: Option<String>,
    pub account: Option<String>,
    pub warehouse: Option<String>,
    pub root: Option<PathBuf>,
}

/// Everything needed to open a warehouse session
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub user: String,
    pub password: String,
    pub account: String,
    pub warehouse: String,
    pub database: String,
    pub schema: String,
    /// Directory holding one subdirectory per account
    pub root: PathBuf,
}

impl ConnectionConfig {
    /// Resolve settings from the secrets file and the process environment
    pub fn load(config_path: Option<&Path>, database: &str, schema: &str) -> Result<Self> {
        let secrets = read_secrets(config_path)?;
        Self::resolve(secrets, database, schema, |key| std::env::var(key).ok())
    }

    /// Merge secrets with environment overrides. Environment wins.
    pub fn resolve(
        secrets: SecretsFile,
        database: &str,
        schema: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let var = |name: &str| env(&format!("{}{}", ENV_PREFIX, name)).filter(|v| !v.is_empty());
        let s = secrets.warehouse;

        let root = match var("ROOT").map(PathBuf::from).or(s.root) {
            Some(root) => root,
            None => default_root()?,
        };

        Ok(Self {
            user: var("USER").or(s.user).unwrap_or_default(),
            password: var("PASSWORD").or(s.password).unwrap_or_default(),
            account: var("ACCOUNT")
                .or(s.account)
                .unwrap_or_else(|| DEFAULT_ACCOUNT.to_string()),
            warehouse: var("WAREHOUSE")
                .or(s.warehouse)
                .unwrap_or_else(|| DEFAULT_WAREHOUSE.to_string()),
            database: database.to_string(),
            schema: schema.to_string(),
            root,
        })
    }

    /// Directory backing the configured account
    pub fn account_dir(&self) -> PathBuf {
        self.root.join(self.account.to_lowercase())
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "sales-insights").context("Could not determine home directory")
}

fn default_root() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Default secrets file location
pub fn default_secrets_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("secrets.json"))
}

/// Read the secrets file. An explicit path must exist; the default one may not.
pub fn read_secrets(path: Option<&Path>) -> Result<SecretsFile> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (default_secrets_path()?, false),
    };

    if !path.exists() {
        if required {
            anyhow::bail!("Secrets file not found: {:?}", path);
        }
        return Ok(SecretsFile::default());
    }

    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read secrets file {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse secrets file {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn secrets() -> SecretsFile {
        serde_json::from_str(
            r#"{"warehouse": {"user": "analyst", "password": "pw", "root": "/srv/wh"}}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_uses_secrets_and_defaults() {
        let config = ConnectionConfig::resolve(secrets(), "RETAIL_DB", "SALES", |_| None).unwrap();
        assert_eq!(config.user, "analyst");
        assert_eq!(config.account, "local");
        assert_eq!(config.warehouse, "COMPUTE_WH");
        assert_eq!(config.database, "RETAIL_DB");
        assert_eq!(config.account_dir(), PathBuf::from("/srv/wh/local"));
    }

    #[test]
    fn test_environment_overrides_secrets() {
        let env: HashMap<&str, &str> = [
            ("SALES_INSIGHTS_USER", "ops"),
            ("SALES_INSIGHTS_ACCOUNT", "Acme-01"),
            ("SALES_INSIGHTS_WAREHOUSE", ""),
        ]
        .into_iter()
        .collect();

        let config = ConnectionConfig::resolve(secrets(), "DEMO_DB", "PUBLIC", |k| {
            env.get(k).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.user, "ops");
        assert_eq!(config.password, "pw");
        // Empty values do not override
        assert_eq!(config.warehouse, "COMPUTE_WH");
        assert_eq!(config.account_dir(), PathBuf::from("/srv/wh/acme-01"));
    }

    #[test]
    fn test_explicit_missing_secrets_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(read_secrets(Some(&missing)).is_err());
    }

    #[test]
    fn test_read_secrets_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        fs::write(&path, r#"{"warehouse": {"user": "kim", "account": "demo"}}"#).unwrap();

        let secrets = read_secrets(Some(&path)).unwrap();
        assert_eq!(secrets.warehouse.user.as_deref(), Some("kim"));
        assert_eq!(secrets.warehouse.account.as_deref(), Some("demo"));
        assert!(secrets.warehouse.password.is_none());
    }
}
