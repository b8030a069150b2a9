//! Content fingerprinting
//!
//! SHA-256 over raw bytes, hex-encoded. Fingerprints verify reproducibility;
//! they are never identity except where a function below says so
//! (`stable_record_id`, `claim_id`).

use sha2::{Digest, Sha256};

/// Length of a derived record id in hex characters
const RECORD_ID_LEN: usize = 16;

/// Length of a short spec/input fingerprint in hex characters
const SHORT_FP_LEN: usize = 16;

/// Namespace prefix folded into derived record ids, keeping them distinct
/// from ids hashed by any upstream capture layer.
const ID_NAMESPACE: &str = "capture";

/// Full SHA-256 of raw bytes, lowercase hex
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Truncated fingerprint for spec/input provenance fields
pub fn short_fingerprint(bytes: &[u8]) -> String {
    sha256_hex(bytes)[..SHORT_FP_LEN].to_string()
}

/// Derived record identity: hash of {thread id, normalized text}.
///
/// Used only when the capture layer supplies no id. Two records with the
/// same thread and the same normalized text collide by construction, which
/// the normalizer reports as a fatal duplicate.
pub fn stable_record_id(thread_id: &str, text_normalized: &str) -> String {
    let joined = [ID_NAMESPACE, thread_id, text_normalized].join("|");
    sha256_hex(joined.as_bytes())[..RECORD_ID_LEN].to_string()
}

/// Claim identity: hash of (topic id, normalized claim text).
pub fn claim_id(topic_id: &str, normalized_text: &str) -> String {
    let raw = format!("{}\n{}", topic_id, normalized_text);
    sha256_hex(raw.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sha256_hex_known_value() {
        // sha256 of the empty string
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_stable_record_id_is_stable() {
        let a = stable_record_id("t1", "hello world");
        let b = stable_record_id("t1", "hello world");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_stable_record_id_varies_by_thread() {
        assert_ne!(
            stable_record_id("t1", "hello world"),
            stable_record_id("t2", "hello world")
        );
    }

    #[test]
    fn test_claim_id_varies_by_topic() {
        let a = claim_id("t1", "this is a fact not an opinion");
        let b = claim_id("t2", "this is a fact not an opinion");
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }
}
