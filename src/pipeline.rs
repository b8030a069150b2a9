//! End-to-end derivation pipeline
//!
//! Runs normalize, topic labeling, tone labeling, claim extraction,
//! behavior windows, and cross-reference linking over one JSONL input,
//! then renders every artifact and fingerprints it into the run manifest.
//! The whole run is all-or-nothing: any stage error means no artifacts.

use crate::claims::{extract_claims, DEFAULT_EVIDENCE_CAP};
use crate::engine::{classify_all, derive_tone};
use crate::error::DeriveError;
use crate::linker::link;
use crate::manifest::ManifestBuilder;
use crate::normalizer::parse_records;
use crate::schema::RuleSetSpec;
use crate::types::{
    ClaimsDocument, LabelDocument, LinksDocument, Manifest, Record, ToneDocument, WindowsDocument,
};
use crate::windows::derive_windows;

/// Artifact file names, fixed across runs
pub const NORMALIZED_ARTIFACT: &str = "normalized.jsonl";
pub const LABELS_ARTIFACT: &str = "topic_labels.json";
pub const TONE_ARTIFACT: &str = "tone.json";
pub const CLAIMS_ARTIFACT: &str = "claims.json";
pub const WINDOWS_ARTIFACT: &str = "behavior_windows.json";
pub const LINKS_ARTIFACT: &str = "claim_links.json";
pub const MANIFEST_ARTIFACT: &str = "manifest.json";

/// Configuration for one derivation run
pub struct DeriveConfig {
    /// Topic axis ruleset, always required
    pub topics: RuleSetSpec,
    /// Optional tone polarity ruleset
    pub polarity: Option<RuleSetSpec>,
    /// Optional tone intensity ruleset
    pub intensity: Option<RuleSetSpec>,
    /// Per-claim evidence cap
    pub evidence_cap: usize,
}

impl DeriveConfig {
    pub fn new(topics: RuleSetSpec) -> Self {
        Self {
            topics,
            polarity: None,
            intensity: None,
            evidence_cap: DEFAULT_EVIDENCE_CAP,
        }
    }
}

/// Everything one run produced: typed documents, rendered artifacts in
/// write order, and the manifest over them.
#[derive(Debug)]
pub struct RunOutput {
    pub records: Vec<Record>,
    pub labels: LabelDocument,
    pub tone: ToneDocument,
    pub claims: ClaimsDocument,
    pub windows: WindowsDocument,
    pub links: LinksDocument,
    /// (file name, rendered content) pairs, manifest excluded
    pub artifacts: Vec<(String, String)>,
    pub manifest: Manifest,
    pub run_id: String,
}

/// Run the full pipeline over one JSONL input.
///
/// `input_name` is recorded in the manifest; it does not affect the run id,
/// which derives solely from the input bytes.
pub fn run(input_name: &str, input: &str, config: &DeriveConfig) -> Result<RunOutput, DeriveError> {
    let records = parse_records(input)?;
    let labels = classify_all(&records, &config.topics)?;
    let tone = derive_tone(&records, config.polarity.as_ref(), config.intensity.as_ref())?;
    let claims = extract_claims(&records, &labels, config.evidence_cap)?;
    let windows = derive_windows(&records, &tone)?;
    let links = link(&claims, &windows);

    let mut artifacts: Vec<(String, String)> = Vec::new();
    artifacts.push((NORMALIZED_ARTIFACT.to_string(), render_jsonl(&records)?));
    artifacts.push((LABELS_ARTIFACT.to_string(), render_json(&labels)?));
    artifacts.push((TONE_ARTIFACT.to_string(), render_json(&tone)?));
    artifacts.push((CLAIMS_ARTIFACT.to_string(), render_json(&claims)?));
    artifacts.push((WINDOWS_ARTIFACT.to_string(), render_json(&windows)?));
    artifacts.push((LINKS_ARTIFACT.to_string(), render_json(&links)?));

    let mut builder = ManifestBuilder::new(input_name, input.as_bytes(), records.len() as u64);
    for (name, content) in &artifacts {
        builder.add_output(name, content.as_bytes());
    }
    let run_id = builder.run_id().to_string();
    let manifest = builder.build();

    Ok(RunOutput {
        records,
        labels,
        tone,
        claims,
        windows,
        links,
        artifacts,
        manifest,
        run_id,
    })
}

/// One compact JSON object per line, trailing newline included
fn render_jsonl(records: &[Record]) -> Result<String, DeriveError> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

fn render_json<T: serde::Serialize>(doc: &T) -> Result<String, DeriveError> {
    let mut out = serde_json::to_string_pretty(doc)?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CONFIDENCE_NA, UNCATEGORIZED, UNKNOWN_TONE};
    use pretty_assertions::assert_eq;

    fn topic_spec() -> RuleSetSpec {
        RuleSetSpec::from_json(
            "topics.json",
            r#"{
                "schema": "ruleset-1.0",
                "axis": "topic",
                "version": "1.0",
                "rules": [
                    {"rule_id": "r_fact", "kind": "contains_any", "label": "claims_of_fact",
                     "terms": ["fact", "fine"], "score": 5, "tags": ["assertive"]}
                ],
                "tie_break_precedence": ["claims_of_fact"],
                "confidence_bands": [
                    {"id": "low", "min_score": 1},
                    {"id": "high", "min_score": 10}
                ]
            }"#,
        )
        .unwrap()
    }

    fn polarity_spec() -> RuleSetSpec {
        RuleSetSpec::from_json(
            "polarity.json",
            r#"{
                "schema": "ruleset-1.0",
                "axis": "polarity",
                "version": "1.0",
                "rules": [
                    {"rule_id": "p_neg", "kind": "contains_any", "label": "negative",
                     "terms": ["opinion"], "score": 2, "tags": []}
                ],
                "tie_break_precedence": ["negative"],
                "confidence_bands": []
            }"#,
        )
        .unwrap()
    }

    fn sample_input() -> &'static str {
        concat!(
            r#"{"id":"a","author":"sam","text":"I think this is fine. Probably worth a look today.","thread_id":"t1"}"#,
            "\n",
            r#"{"id":"b","author":"sam","text":"This is a fact, not an opinion at all.","thread_id":"t1","is_reply":true}"#,
            "\n",
            r#"{"id":"c","author":"kim","text":"Quiet aside with no keywords here.","thread_id":"t2"}"#,
            "\n",
        )
    }

    #[test]
    fn test_full_run_shapes() {
        let mut config = DeriveConfig::new(topic_spec());
        config.polarity = Some(polarity_spec());
        let out = run("records.jsonl", sample_input(), &config).unwrap();

        assert_eq!(out.records.len(), 3);
        assert_eq!(out.labels.items[0].primary_label, "claims_of_fact");
        assert_eq!(out.labels.items[2].primary_label, UNCATEGORIZED);
        assert_eq!(out.labels.items[2].confidence, CONFIDENCE_NA);
        assert_eq!(out.labels.summary.sentinel_count, 1);

        // polarity spec fires on record b only; intensity spec was absent
        assert_eq!(out.tone.items[1].polarity, "negative");
        assert_eq!(out.tone.items[1].intensity, UNKNOWN_TONE);
        assert_eq!(out.tone.items[0].polarity, UNKNOWN_TONE);

        // the r_fact rule's "assertive" tag is a claim topic of its own,
        // alongside the primary label
        assert_eq!(out.claims.topics.len(), 2);
        assert!(out
            .claims
            .topics
            .iter()
            .any(|t| t.topic_id == "claims_of_fact"));
        assert!(out.claims.topics.iter().any(|t| t.topic_id == "assertive"));

        // record a has unknown polarity, so no transition; the two
        // thread-activity windows still anchor ordinal-window linking
        assert_eq!(out.windows.behavior_windows.len(), 2);
        assert_eq!(out.links.linking_mode, "ordinal_window");

        let names: Vec<&str> = out.artifacts.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "normalized.jsonl",
                "topic_labels.json",
                "tone.json",
                "claims.json",
                "behavior_windows.json",
                "claim_links.json"
            ]
        );
        assert_eq!(out.manifest.outputs.len(), 6);
        assert_eq!(out.manifest.input.records, 3);
    }

    #[test]
    fn test_byte_identical_reruns() {
        let config = DeriveConfig::new(topic_spec());
        let a = run("records.jsonl", sample_input(), &config).unwrap();
        let b = run("records.jsonl", sample_input(), &config).unwrap();

        assert_eq!(a.run_id, b.run_id);
        assert_eq!(a.artifacts, b.artifacts);
        assert_eq!(a.manifest.outputs, b.manifest.outputs);
        // only the generated-at stamp may differ between the manifests
        assert_eq!(a.manifest.run_id, b.manifest.run_id);
        assert_eq!(a.manifest.input, b.manifest.input);
    }

    #[test]
    fn test_stage_error_yields_no_artifacts() {
        let config = DeriveConfig::new(topic_spec());
        let input = concat!(
            r#"{"id":"a","author":"sam","text":"fine text here","thread_id":"t1"}"#,
            "\n",
            "\n",
        );
        let err = run("records.jsonl", input, &config).unwrap_err();
        assert_eq!(err.stage(), "normalize");
    }
}
