//! Backup Keeper Library
//!
//! Content-addressed, retention-bounded backups of a single mutable file.
//! A background scheduler periodically snapshots the source file,
//! deduplicates snapshots by SHA-256 content hash, and evicts the oldest
//! artifacts beyond a retention limit.

pub mod backup;
pub mod config;
pub mod utils;

// Re-export commonly used types
pub use backup::{BackupScheduler, PassOutcome};
pub use config::Config;
pub use utils::errors::BackupError;
pub type Result<T> = std::result::Result<T, BackupError>;
