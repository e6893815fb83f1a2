//! Content fingerprinting for backup deduplication.
//!
//! A fingerprint is the SHA-256 digest of a file's bytes. The full 64-char
//! hex digest is the authoritative equality test; a truncated prefix is
//! embedded in artifact filenames as a display/index key only, so a short
//! prefix match is never enough on its own to declare two snapshots equal.

use sha2::{Digest, Sha256};

/// SHA-256 fingerprint of a byte sequence.
///
/// Same bytes always produce the same fingerprint; no hidden state, no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    hex: String,
}

impl Fingerprint {
    /// Length of the full hex digest.
    pub const HEX_LEN: usize = 64;

    /// Compute the fingerprint of the given bytes.
    ///
    /// Empty input is valid and yields the SHA-256 digest of the empty
    /// byte sequence.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hex = format!("{:x}", hasher.finalize());
        Self { hex }
    }

    /// Full 64-character hex digest.
    pub fn full_hex(&self) -> &str {
        &self.hex
    }

    /// Truncated hex prefix used in artifact filenames.
    ///
    /// `len` is clamped to the digest length, so asking for more than 64
    /// characters returns the full digest.
    pub fn prefix(&self, len: usize) -> &str {
        &self.hex[..len.min(self.hex.len())]
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = Fingerprint::of_bytes(b"inventory contents");
        let b = Fingerprint::of_bytes(b"inventory contents");
        assert_eq!(a, b);
        assert_eq!(a.full_hex(), b.full_hex());
    }

    #[test]
    fn test_distinct_inputs_differ() {
        let a = Fingerprint::of_bytes(b"A");
        let b = Fingerprint::of_bytes(b"B");
        assert_ne!(a.full_hex(), b.full_hex());
    }

    #[test]
    fn test_known_vector() {
        // SHA-256("abc")
        let fp = Fingerprint::of_bytes(b"abc");
        assert_eq!(
            fp.full_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_empty_input_is_well_defined() {
        let fp = Fingerprint::of_bytes(b"");
        assert_eq!(
            fp.full_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_prefix_length() {
        let fp = Fingerprint::of_bytes(b"abc");
        assert_eq!(fp.prefix(16).len(), 16);
        assert!(fp.full_hex().starts_with(fp.prefix(16)));
        // Over-long requests clamp to the full digest
        assert_eq!(fp.prefix(200), fp.full_hex());
    }
}
