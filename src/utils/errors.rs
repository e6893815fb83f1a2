//! Custom error types for the backup daemon.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source file unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Backup directory unwritable: {0}")]
    DirectoryUnwritable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BackupError>;
