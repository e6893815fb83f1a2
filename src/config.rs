//! Configuration management for the backup daemon.
//!
//! Loads configuration from a TOML file; every field has a default so a
//! partial file (or no file at all) works out of the box.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub backup: BackupConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// File being protected; read-only from the daemon's perspective
    #[serde(default = "default_source_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Directory holding backup artifacts (created on first use)
    #[serde(default = "default_backup_dir")]
    pub dir: PathBuf,

    /// Maximum number of artifacts kept; oldest evicted first
    #[serde(default = "default_retention")]
    pub retention: usize,

    /// Seconds between backup passes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Filename prefix for artifacts
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Filename extension for artifacts (without the dot)
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Hex characters of the fingerprint embedded in filenames
    #[serde(default = "default_fingerprint_len")]
    pub fingerprint_len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_source_path() -> PathBuf {
    PathBuf::from("inventory.db")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_retention() -> usize {
    10
}

fn default_interval_secs() -> u64 {
    300 // 5 minutes
}

fn default_file_prefix() -> String {
    "inventory_backup".to_string()
}

fn default_extension() -> String {
    "db".to_string()
}

fn default_fingerprint_len() -> usize {
    16
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source_path(),
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: default_backup_dir(),
            retention: default_retention(),
            interval_secs: default_interval_secs(),
            file_prefix: default_file_prefix(),
            extension: default_extension(),
            fingerprint_len: default_fingerprint_len(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject values the scheduler cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.backup.retention == 0 {
            anyhow::bail!("backup.retention must be at least 1");
        }
        if self.backup.interval_secs == 0 {
            anyhow::bail!("backup.interval_secs must be at least 1");
        }
        if self.backup.fingerprint_len < 8 || self.backup.fingerprint_len > 64 {
            anyhow::bail!("backup.fingerprint_len must be between 8 and 64 hex characters");
        }
        if self.backup.file_prefix.is_empty() {
            anyhow::bail!("backup.file_prefix must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.source.path, PathBuf::from("inventory.db"));
        assert_eq!(config.backup.dir, PathBuf::from("backups"));
        assert_eq!(config.backup.retention, 10);
        assert_eq!(config.backup.interval_secs, 300);
        assert_eq!(config.backup.fingerprint_len, 16);
        assert_eq!(config.log.level, "info");
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [backup]
            retention = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.backup.retention, 3);
        assert_eq!(config.backup.interval_secs, 300);
        assert_eq!(config.source.path, PathBuf::from("inventory.db"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.backup.retention = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.backup.interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.backup.fingerprint_len = 4;
        assert!(config.validate().is_err());
    }
}
