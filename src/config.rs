//! Runtime configuration. Everything lives in one data directory under the
//! user's home (or `$BOOK_INVENTORY_HOME`). An optional `config.toml` there
//! can move the database/backup files and tune the low-stock threshold and
//! log filter.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;

use crate::db::DEFAULT_LOW_STOCK_THRESHOLD;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".book-inventory";
/// Overrides the data directory entirely when set.
const HOME_ENV: &str = "BOOK_INVENTORY_HOME";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "books.sqlite";
const BACKUP_FILE_NAME: &str = "books_backup.csv";
const LOG_FILE_NAME: &str = "book-inventory.log";
const DEFAULT_LOG_FILTER: &str = "info";

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    backup_path: Option<PathBuf>,
    low_stock_threshold: Option<i64>,
    log_filter: Option<String>,
}

/// Fully resolved settings. Paths are absolute whenever the data directory
/// is.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub backup_path: PathBuf,
    pub log_path: PathBuf,
    pub low_stock_threshold: i64,
    pub log_filter: String,
}

impl AppConfig {
    /// Resolve the data directory and load `config.toml` from it.
    pub fn load() -> Result<Self> {
        Self::load_from_dir(data_dir()?)
    }

    /// Load settings from `dir/config.toml`, falling back to defaults for
    /// anything missing. A missing file is not an error.
    pub fn load_from_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = dir.into();
        let config_path = data_dir.join(CONFIG_FILE_NAME);

        let file = if config_path.exists() {
            let raw = fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            toml::from_str::<ConfigFile>(&raw)
                .with_context(|| format!("failed to parse {}", config_path.display()))?
        } else {
            ConfigFile::default()
        };

        let low_stock_threshold = file
            .low_stock_threshold
            .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
        if low_stock_threshold < 1 {
            return Err(anyhow!(
                "low_stock_threshold must be positive, got {low_stock_threshold}"
            ));
        }

        Ok(Self {
            database_path: resolve(&data_dir, file.database_path, DB_FILE_NAME),
            backup_path: resolve(&data_dir, file.backup_path, BACKUP_FILE_NAME),
            log_path: data_dir.join(LOG_FILE_NAME),
            low_stock_threshold,
            log_filter: file
                .log_filter
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            data_dir,
        })
    }
}

/// Relative paths in the config file are anchored at the data directory.
fn resolve(data_dir: &Path, configured: Option<PathBuf>, default_name: &str) -> PathBuf {
    match configured {
        Some(path) if path.is_absolute() => path,
        Some(path) => data_dir.join(path),
        None => data_dir.join(default_name),
    }
}

fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os(HOME_ENV) {
        return Ok(PathBuf::from(dir));
    }
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}
