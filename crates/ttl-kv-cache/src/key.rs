//! Content-addressable cache keys

use sha2::{Digest, Sha256};

/// Derive a cache key from ordered parts.
///
/// The parts are hashed back to back with no delimiter, so `["ab", "c"]` and
/// `["a", "bc"]` produce the same key. Callers that need separation should put
/// it in the parts themselves. The result is a 64 character lowercase hex
/// SHA-256 digest; changing the algorithm invalidates every stored entry.
pub fn generate_key<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref().as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            generate_key(["test"]),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_empty_parts_hash_empty_input() {
        let empty: [&str; 0] = [];
        let key = generate_key(empty);
        assert_eq!(
            key,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(key, generate_key(Vec::<String>::new()));
    }

    #[test]
    fn test_parts_are_concatenated() {
        assert_eq!(
            generate_key(["repo", "owner/name"]),
            generate_key(["repoowner/name"])
        );
    }

    #[test]
    fn test_deterministic_hex_output() {
        let key1 = generate_key(["repo", "rust-lang/rust"]);
        let key2 = generate_key(["repo", "rust-lang/rust"]);
        let key3 = generate_key(["repo", "tokio-rs/tokio"]);

        assert_eq!(key1, key2);
        assert_ne!(key1, key3);
        assert_eq!(key1.len(), 64);
        assert!(key1
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
