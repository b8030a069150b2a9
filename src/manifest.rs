//! Run manifest construction
//!
//! Fingerprints every input and output artifact so a re-run over
//! byte-identical inputs can be verified to reproduce byte-identical
//! outputs. The run id derives from the primary input's hash prefix; the
//! generated-at timestamp is metadata only and feeds no hash.

use chrono::Utc;

use crate::fingerprint::sha256_hex;
use crate::types::{Manifest, ManifestInput, ManifestOutput, MANIFEST_SCHEMA};

/// Fixed run-id prefix ahead of the input hash prefix
pub const RUN_ID_PREFIX: &str = "derive_";

/// Hex characters of the primary input fingerprint kept in the run id
const RUN_ID_HASH_LEN: usize = 8;

/// Accumulates artifact fingerprints for one run
pub struct ManifestBuilder {
    input: ManifestInput,
    run_id: String,
    outputs: Vec<ManifestOutput>,
}

impl ManifestBuilder {
    /// Start a manifest from the primary input artifact.
    pub fn new(input_path: &str, input_bytes: &[u8], record_count: u64) -> Self {
        let sha = sha256_hex(input_bytes);
        let run_id = format!("{}{}", RUN_ID_PREFIX, &sha[..RUN_ID_HASH_LEN]);
        Self {
            input: ManifestInput {
                path: input_path.to_string(),
                sha256: sha,
                records: record_count,
            },
            run_id,
            outputs: Vec::new(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Record one output artifact by name and serialized bytes.
    pub fn add_output(&mut self, name: &str, bytes: &[u8]) {
        self.outputs.push(ManifestOutput {
            name: name.to_string(),
            sha256: sha256_hex(bytes),
        });
    }

    pub fn build(self) -> Manifest {
        Manifest {
            schema: MANIFEST_SCHEMA.to_string(),
            run_id: self.run_id,
            producer: crate::PRODUCER_NAME.to_string(),
            producer_version: crate::SIFT_VERSION.to_string(),
            generated_at_utc: Utc::now().to_rfc3339(),
            input: self.input,
            outputs: self.outputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_run_id_from_input_hash_prefix() {
        let builder = ManifestBuilder::new("records.jsonl", b"line one\n", 1);
        let run_id = builder.run_id().to_string();
        assert!(run_id.starts_with("derive_"));
        assert_eq!(run_id.len(), "derive_".len() + 8);

        // identical bytes reproduce the identical run id
        let again = ManifestBuilder::new("records.jsonl", b"line one\n", 1);
        assert_eq!(again.run_id(), run_id);

        // different bytes do not
        let other = ManifestBuilder::new("records.jsonl", b"line two\n", 1);
        assert_ne!(other.run_id(), run_id);
    }

    #[test]
    fn test_output_fingerprints_are_stable() {
        let mut a = ManifestBuilder::new("in.jsonl", b"x\n", 1);
        a.add_output("claims.json", b"{\"claims\":[]}");
        let mut b = ManifestBuilder::new("in.jsonl", b"x\n", 1);
        b.add_output("claims.json", b"{\"claims\":[]}");

        let (a, b) = (a.build(), b.build());
        assert_eq!(a.run_id, b.run_id);
        assert_eq!(a.input.sha256, b.input.sha256);
        assert_eq!(a.outputs, b.outputs);
    }
}
