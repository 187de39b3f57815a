//! Hashing utilities for fingerprints and object names.

use sha2::{Digest, Sha256};

/// Compute SHA256 hash of a byte slice as a hex string.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute SHA256 hash of a string as a hex string.
pub fn sha256_str(s: &str) -> String {
    sha256_bytes(s.as_bytes())
}

/// Short (16 hex chars) hash of a string, for use in file names.
pub fn short_hash(s: &str) -> String {
    sha256_str(s)[..16].to_string()
}

/// 64-bit content fingerprint: the first 8 bytes of the SHA256 digest.
pub fn fingerprint_bytes(data: &[u8]) -> u64 {
    let digest = Sha256::digest(data);
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_str() {
        let hash = sha256_str("hello");
        assert_eq!(
            hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("hello"), "2cf24dba5fb0a30e");
    }

    #[test]
    fn test_fingerprint_bytes() {
        // little-endian view of 2c f2 4d ba 5f b0 a3 0e
        assert_eq!(fingerprint_bytes(b"hello"), 0x0ea3_b05f_ba4d_f22c);
        assert_ne!(fingerprint_bytes(b"hello"), fingerprint_bytes(b"hello!"));
    }
}
