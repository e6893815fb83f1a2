//! Backup artifact naming and directory listing.
//!
//! Artifacts are named `<prefix>_<YYYYMMDD_HHMMSS>_<fingerprint-prefix>.<ext>`.
//! The timestamp component is fixed-width and zero-padded, so sorting
//! filenames lexicographically is equivalent to sorting by creation time.
//! Anything in the backup directory that does not match the convention is
//! ignored by listing and pruning.

use crate::backup::fingerprint::Fingerprint;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TIMESTAMP_WIDTH: usize = 15; // YYYYMMDD_HHMMSS

/// One immutable stored backup snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    /// Filename within the backup directory.
    pub file_name: String,
    /// Full path to the artifact.
    pub path: PathBuf,
    /// Creation timestamp parsed from the filename (second resolution).
    pub created_at: NaiveDateTime,
    /// Truncated fingerprint parsed from the filename.
    pub fingerprint_prefix: String,
}

/// Filename convention for artifacts in a backup directory.
#[derive(Debug, Clone)]
pub struct NamingScheme {
    pub prefix: String,
    pub extension: String,
    pub fingerprint_len: usize,
}

impl NamingScheme {
    /// Build the artifact filename for a snapshot taken at `at`.
    pub fn file_name(&self, at: NaiveDateTime, fingerprint: &Fingerprint) -> String {
        format!(
            "{}_{}_{}.{}",
            self.prefix,
            at.format(TIMESTAMP_FORMAT),
            fingerprint.prefix(self.fingerprint_len),
            self.extension
        )
    }

    /// Parse a filename against the convention.
    ///
    /// Returns `None` for anything that is not a well-formed artifact name:
    /// wrong prefix or extension, malformed or missing timestamp, or a
    /// fingerprint field of the wrong length or alphabet.
    pub fn parse(&self, file_name: &str) -> Option<(NaiveDateTime, String)> {
        let rest = file_name.strip_prefix(&self.prefix)?.strip_prefix('_')?;
        let rest = rest.strip_suffix(&self.extension)?.strip_suffix('.')?;

        if rest.len() != TIMESTAMP_WIDTH + 1 + self.fingerprint_len {
            return None;
        }
        let (stamp, fp) = rest.split_at(TIMESTAMP_WIDTH);
        let fp = fp.strip_prefix('_')?;

        if fp.len() != self.fingerprint_len
            || !fp.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
        {
            return None;
        }

        let created_at = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
        Some((created_at, fp.to_string()))
    }
}

/// List convention-matching artifacts in `dir`, oldest to newest.
///
/// A missing directory is treated as empty rather than an error, so callers
/// can inspect a backup directory that has not been created yet.
pub fn list_artifacts(dir: &Path, scheme: &NamingScheme) -> std::io::Result<Vec<Artifact>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut artifacts: Vec<Artifact> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let file_name = e.file_name().to_string_lossy().into_owned();
            let (created_at, fingerprint_prefix) = scheme.parse(&file_name)?;
            Some(Artifact {
                path: e.path(),
                file_name,
                created_at,
                fingerprint_prefix,
            })
        })
        .collect();

    // Lexicographic == chronological thanks to the fixed-width timestamp
    artifacts.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn scheme() -> NamingScheme {
        NamingScheme {
            prefix: "inventory_backup".to_string(),
            extension: "db".to_string(),
            fingerprint_len: 16,
        }
    }

    fn stamp(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_file_name_round_trip() {
        let scheme = scheme();
        let fp = Fingerprint::of_bytes(b"round trip");
        let at = stamp(2026, 8, 29, 14, 30, 5);

        let name = scheme.file_name(at, &fp);
        assert_eq!(
            name,
            format!("inventory_backup_20260829_143005_{}.db", fp.prefix(16))
        );

        let (parsed_at, parsed_fp) = scheme.parse(&name).unwrap();
        assert_eq!(parsed_at, at);
        assert_eq!(parsed_fp, fp.prefix(16));
    }

    #[test]
    fn test_parse_rejects_non_matching_names() {
        let scheme = scheme();
        // Wrong prefix
        assert!(scheme.parse("other_20260829_143005_0123456789abcdef.db").is_none());
        // Wrong extension
        assert!(scheme.parse("inventory_backup_20260829_143005_0123456789abcdef.tmp").is_none());
        // Malformed timestamp
        assert!(scheme.parse("inventory_backup_2026_143005_0123456789abcdef.db").is_none());
        assert!(scheme.parse("inventory_backup_20269999_143005_0123456789abcdef.db").is_none());
        // Fingerprint too short / wrong alphabet
        assert!(scheme.parse("inventory_backup_20260829_143005_0123.db").is_none());
        assert!(scheme.parse("inventory_backup_20260829_143005_0123456789ABCDEF.db").is_none());
        assert!(scheme.parse("inventory_backup_20260829_143005_0123456789ghijkl.db").is_none());
        // Unrelated files
        assert!(scheme.parse("notes.txt").is_none());
        assert!(scheme.parse("inventory_backup").is_none());
    }

    #[test]
    fn test_listing_sorted_oldest_first() -> std::io::Result<()> {
        let temp = TempDir::new()?;
        let scheme = scheme();
        let fp = Fingerprint::of_bytes(b"x");

        // Written out of chronological order on purpose
        for (y, d) in [(2026, 3), (2025, 1), (2026, 1)] {
            let name = scheme.file_name(stamp(y, 1, d, 0, 0, 0), &fp);
            fs::write(temp.path().join(name), b"x")?;
        }
        fs::write(temp.path().join("notes.txt"), b"ignored")?;

        let artifacts = list_artifacts(temp.path(), &scheme)?;
        assert_eq!(artifacts.len(), 3);
        assert_eq!(artifacts[0].created_at, stamp(2025, 1, 1, 0, 0, 0));
        assert_eq!(artifacts[2].created_at, stamp(2026, 1, 3, 0, 0, 0));
        Ok(())
    }

    #[test]
    fn test_listing_missing_directory_is_empty() -> std::io::Result<()> {
        let temp = TempDir::new()?;
        let artifacts = list_artifacts(&temp.path().join("nope"), &scheme())?;
        assert!(artifacts.is_empty());
        Ok(())
    }
}
