//! Periodic content-addressed backup of a single mutable file.
//!
//! The scheduler owns the backup directory. Each pass reads the source file,
//! fingerprints its bytes, writes a new artifact only when that content is
//! not already captured, then prunes the oldest artifacts beyond the
//! retention limit. A failed pass is logged and retried on the next tick;
//! it never takes down the owning process.
//!
//! The scheduler assumes single-writer ownership of the backup directory.
//! Concurrent readers are fine (writes are rename-based, so a partially
//! written artifact is never visible under a convention-matching name), but
//! a second process writing convention-matching files into the same
//! directory would be counted by retention.

pub mod artifact;
pub mod fingerprint;

use crate::config::Config;
use crate::utils::errors::{BackupError, Result};
use artifact::{Artifact, NamingScheme};
use chrono::{Local, NaiveDateTime, SubsecRound};
use fingerprint::Fingerprint;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Result of a single backup pass.
#[derive(Debug)]
pub enum PassOutcome {
    /// A new artifact was written.
    Created(Artifact),
    /// The current source content was already captured; nothing written.
    Duplicate { fingerprint_prefix: String },
}

/// Owns the backup directory and runs the read, fingerprint,
/// conditional-write, prune sequence, either one-shot or on a fixed interval.
pub struct BackupScheduler {
    source_path: PathBuf,
    backup_dir: PathBuf,
    retention: usize,
    interval: Duration,
    scheme: NamingScheme,
}

impl BackupScheduler {
    pub fn new(config: &Config) -> Self {
        Self {
            source_path: config.source.path.clone(),
            backup_dir: config.backup.dir.clone(),
            retention: config.backup.retention,
            interval: Duration::from_secs(config.backup.interval_secs),
            scheme: NamingScheme {
                prefix: config.backup.file_prefix.clone(),
                extension: config.backup.extension.clone(),
                // Clamped to the digest size; a longer configured value
                // would embed a clamped prefix in filenames that the exact
                // length check in parsing then rejects.
                fingerprint_len: config.backup.fingerprint_len.min(Fingerprint::HEX_LEN),
            },
        }
    }

    /// Run one backup pass now.
    ///
    /// `SourceUnavailable` and `DirectoryUnwritable` are soft failures from
    /// the scheduler's point of view: the periodic loop logs them and
    /// retries on the next tick. They are returned (not swallowed) so a
    /// manual one-shot invocation can report them.
    pub fn run_pass(&self) -> Result<PassOutcome> {
        self.run_pass_at(Local::now().naive_local())
    }

    fn run_pass_at(&self, now: NaiveDateTime) -> Result<PassOutcome> {
        std::fs::create_dir_all(&self.backup_dir).map_err(|e| {
            BackupError::DirectoryUnwritable(format!("{}: {}", self.backup_dir.display(), e))
        })?;

        let bytes = std::fs::read(&self.source_path).map_err(|e| {
            BackupError::SourceUnavailable(format!("{}: {}", self.source_path.display(), e))
        })?;

        let fingerprint = Fingerprint::of_bytes(&bytes);
        let fp_prefix = fingerprint.prefix(self.scheme.fingerprint_len).to_string();

        let existing = artifact::list_artifacts(&self.backup_dir, &self.scheme)?;
        let outcome = if let Some(dup) = self.find_duplicate(&existing, &fingerprint) {
            info!(
                fingerprint = %fp_prefix,
                artifact = %dup.file_name,
                "Source unchanged, snapshot already captured"
            );
            PassOutcome::Duplicate { fingerprint_prefix: fp_prefix }
        } else {
            let artifact = self.write_artifact(now, &fingerprint, &bytes)?;
            info!(
                fingerprint = %fp_prefix,
                artifact = %artifact.file_name,
                bytes = bytes.len(),
                "Created backup artifact"
            );
            PassOutcome::Created(artifact)
        };

        // Runs whether or not anything was written: the retention limit may
        // have been lowered since the last write, and foreign matching files
        // count toward it too.
        self.prune()?;
        Ok(outcome)
    }

    /// Exact fingerprint-field comparison, confirmed against the full
    /// digest of the stored artifact's bytes. The filename only carries a
    /// truncated prefix, so a prefix match alone is not proof of equality;
    /// a prefix collision with different content falls through and a new
    /// artifact gets written.
    fn find_duplicate<'a>(
        &self,
        existing: &'a [Artifact],
        fingerprint: &Fingerprint,
    ) -> Option<&'a Artifact> {
        let fp_prefix = fingerprint.prefix(self.scheme.fingerprint_len);
        existing
            .iter()
            .filter(|a| a.fingerprint_prefix == fp_prefix)
            .find(|a| match std::fs::read(&a.path) {
                Ok(stored) => Fingerprint::of_bytes(&stored) == *fingerprint,
                // Unreadable candidate (e.g. deleted out from under us):
                // treat as no match and write a fresh artifact.
                Err(e) => {
                    warn!(artifact = %a.file_name, error = %e, "Could not verify candidate duplicate");
                    false
                }
            })
    }

    /// Write the snapshot to a temporary name in the backup directory and
    /// rename it into place. The temporary name does not match the artifact
    /// convention, so a crash mid-write never leaves a file that listing or
    /// pruning would consider valid.
    fn write_artifact(
        &self,
        now: NaiveDateTime,
        fingerprint: &Fingerprint,
        bytes: &[u8],
    ) -> Result<Artifact> {
        let file_name = self.scheme.file_name(now, fingerprint);
        let final_path = self.backup_dir.join(&file_name);
        let tmp_path = self.backup_dir.join(format!("{}.tmp", file_name));

        std::fs::write(&tmp_path, bytes).map_err(|e| {
            BackupError::DirectoryUnwritable(format!("{}: {}", tmp_path.display(), e))
        })?;
        std::fs::rename(&tmp_path, &final_path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp_path);
            BackupError::DirectoryUnwritable(format!("{}: {}", final_path.display(), e))
        })?;

        Ok(Artifact {
            file_name,
            path: final_path,
            // Truncated to match the second-resolution timestamp in the name
            created_at: now.trunc_subsecs(0),
            fingerprint_prefix: fingerprint.prefix(self.scheme.fingerprint_len).to_string(),
        })
    }

    /// Delete the oldest convention-matching artifacts until the count is
    /// within the retention limit. Individual deletion failures are logged
    /// and skipped; they never abort the rest of the prune.
    fn prune(&self) -> Result<()> {
        let artifacts = artifact::list_artifacts(&self.backup_dir, &self.scheme)?;
        let excess = artifacts.len().saturating_sub(self.retention);

        for old in artifacts.into_iter().take(excess) {
            match std::fs::remove_file(&old.path) {
                Ok(()) => info!(artifact = %old.file_name, "Pruned old backup artifact"),
                Err(e) => warn!(artifact = %old.file_name, error = %e, "Failed to prune artifact"),
            }
        }
        Ok(())
    }

    /// List retained artifacts, oldest to newest. Read-only.
    pub fn list_artifacts(&self) -> Result<Vec<Artifact>> {
        Ok(artifact::list_artifacts(&self.backup_dir, &self.scheme)?)
    }

    /// Number of retained artifacts.
    pub fn artifact_count(&self) -> Result<usize> {
        Ok(self.list_artifacts()?.len())
    }

    /// Run one pass synchronously, then tick at the configured interval
    /// until `cancel` fires.
    ///
    /// The startup pass completes before the timer is armed, so a fresh
    /// artifact exists even if the process dies before the first tick.
    /// Passes run on one task and each tick awaits the previous pass, so
    /// two passes can never overlap; a tick that fires mid-pass is delayed,
    /// not dropped. Cancellation stops the timer but lets an in-flight pass
    /// finish, preserving the rename-based write guarantee.
    pub fn start(self: Arc<Self>, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        log_pass(self.run_pass());

        let scheduler = self;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(scheduler.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; the startup pass already ran.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let s = scheduler.clone();
                        match tokio::task::spawn_blocking(move || s.run_pass()).await {
                            Ok(result) => log_pass(result),
                            Err(e) => error!(error = %e, "Backup pass task panicked"),
                        }
                    }
                }
            }
            info!("Backup scheduler stopped");
        })
    }
}

/// Absorb a pass result into the log. Success cases already logged their
/// detail inside the pass; failures are soft and retried on the next tick.
fn log_pass(result: Result<PassOutcome>) {
    match result {
        Ok(_) => {}
        Err(e @ BackupError::SourceUnavailable(_)) => {
            warn!(error = %e, "Backup pass skipped, will retry on next tick")
        }
        Err(e) => error!(error = %e, "Backup pass failed, will retry on next tick"),
    }
}
