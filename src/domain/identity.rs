use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `input`. Always 64 lowercase hex characters.
pub fn hash_identifier(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint used for seen-tracking: `hash("{source_id}:{item_id}")`.
pub fn seen_fingerprint(source_id: &str, item_id: &str) -> String {
    hash_identifier(&format!("{}:{}", source_id, item_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let a = hash_identifier("https://example.com/a");
        let b = hash_identifier("https://example.com/a");
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let id = hash_identifier("anything");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash_identifier("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_seen_fingerprint_scoped_by_source() {
        let a = seen_fingerprint("source-a", "item-1");
        let b = seen_fingerprint("source-b", "item-1");
        assert_ne!(a, b);
        assert_eq!(a, hash_identifier("source-a:item-1"));
    }
}
