//! Content hashing for cache keys and cache file names

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the input
pub fn content_hash(input: &str) -> String {
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_stable_hex() {
        let hash = content_hash("https://example.com/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, content_hash("https://example.com/"));
    }

    #[test]
    fn test_content_hash_known_vector() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
