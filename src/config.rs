use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "config.json";
const DB_FILE: &str = "sharedledger.db";
pub(crate) const DB_ENV: &str = "SHAREDLEDGER_DB";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) db_path: Option<PathBuf>,
    pub(crate) expand_lock_timeout_ms: u64,
    pub(crate) mutation_lock_timeout_ms: u64,
    /// Offset used to decide the current month, in minutes east of UTC.
    pub(crate) utc_offset_minutes: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            expand_lock_timeout_ms: 3000,
            mutation_lock_timeout_ms: 5000,
            utc_offset_minutes: 9 * 60,
        }
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "sharedledger", "SharedLedger")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
}

impl Config {
    /// Read `config.json` from the platform config directory, or defaults.
    pub(crate) fn load() -> Result<Self> {
        let dirs = project_dirs()?;
        Self::load_from(&dirs.config_dir().join(CONFIG_FILE))
    }

    pub(crate) fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Database location: `$SHAREDLEDGER_DB`, then `db_path`, then the
    /// platform data directory (created if needed).
    pub(crate) fn resolve_db_path(&self) -> Result<PathBuf> {
        let from_env = std::env::var_os(DB_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        if let Some(path) = from_env.or_else(|| self.db_path.clone()) {
            return Ok(path);
        }
        let dirs = project_dirs()?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        Ok(data_dir.join(DB_FILE))
    }

    pub(crate) fn expand_timeout(&self) -> Duration {
        Duration::from_millis(self.expand_lock_timeout_ms)
    }

    pub(crate) fn mutation_timeout(&self) -> Duration {
        Duration::from_millis(self.mutation_lock_timeout_ms)
    }

    pub(crate) fn utc_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .ok_or_else(|| {
                anyhow::anyhow!("utc_offset_minutes out of range: {}", self.utc_offset_minutes)
            })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.expand_timeout(), Duration::from_secs(3));
        assert_eq!(config.mutation_timeout(), Duration::from_secs(5));
        assert_eq!(config.utc_offset().unwrap().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"db_path": "/tmp/x.db", "utc_offset_minutes": 0}}"#).unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(config.utc_offset_minutes, 0);
        assert_eq!(config.expand_lock_timeout_ms, 3000);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn test_offset_out_of_range() {
        let config = Config {
            utc_offset_minutes: 24 * 60,
            ..Config::default()
        };
        assert!(config.utc_offset().is_err());
    }
}
