//! Password digests
//!
//! Stored credentials are the lowercase hex SHA-256 of the password, the
//! format the existing beneficiary records already use. Comparison touches
//! every byte regardless of where the first mismatch is.

use sha2::{Digest, Sha256};

/// Minimum accepted length for a new password, in characters
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hash a password to lowercase hex SHA-256
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Verify a password against a stored digest
///
/// Returns true if the password hashes to `stored_hash`.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let computed = hash_password(password);
    constant_time_eq(
        computed.as_bytes(),
        stored_hash.trim().to_ascii_lowercase().as_bytes(),
    )
}

/// Compare two byte strings without short-circuiting on content
///
/// Length is not treated as secret.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password);

        assert_eq!(hash.len(), 64);
        assert!(verify_password(password, &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(hash_password("same-password"), hash_password("same-password"));
    }

    #[test]
    fn test_one_character_changes_digest() {
        let a = hash_password("secret1");
        let b = hash_password("secret2");
        assert_ne!(a, b);
        let differing = a.bytes().zip(b.bytes()).filter(|(x, y)| x != y).count();
        assert!(differing > 32, "only {differing} hex digits changed");
    }

    #[test]
    fn test_known_vector() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_uppercase_stored_digest() {
        let hash = hash_password("pass123").to_uppercase();
        assert!(verify_password("pass123", &hash));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
        assert!(constant_time_eq(b"", b""));
    }
}
