use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of an in-memory buffer. Used for content
/// deduplication within a collection.
pub fn content_hash(bytes: &[u8]) -> String {
    let result = Sha256::digest(bytes);
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_consistency() {
        let hash1 = content_hash(b"hello world");
        let hash2 = content_hash(b"hello world");
        assert_eq!(hash1, hash2);
        // Known SHA-256 of "hello world"
        assert_eq!(
            hash1,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_sha256_different_content() {
        assert_ne!(content_hash(b"content A"), content_hash(b"content B"));
    }

    #[test]
    fn test_sha256_empty_buffer() {
        // Known SHA-256 of empty string
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
