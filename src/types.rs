//! Core types for the Claimsift pipeline
//!
//! This module defines the data structures that flow through each stage:
//! canonical records, label assignments, tone labels, claims, behavior
//! windows, cross-reference links, and the run manifest.
//!
//! Every map that reaches serialized output is a `BTreeMap` so iteration
//! order is a documented key, never incidental hash order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel primary label on the topic axis when no rule fired
pub const UNCATEGORIZED: &str = "uncategorized";

/// Sentinel label on the tone axes (polarity, intensity) when no rule fired
/// or no tone spec was supplied
pub const UNKNOWN_TONE: &str = "unknown";

/// Confidence band sentinel when no band's threshold is met
pub const CONFIDENCE_NA: &str = "n_a";

/// Fixed relationship string for claim-to-window links. Strictly
/// co-occurrence; never causal.
pub const CO_OCCURS: &str = "co_occurs_within_window";

pub const NORMALIZED_SCHEMA: &str = "normalized_record-1.0";
pub const LABELS_SCHEMA: &str = "labels-1.0";
pub const TONE_SCHEMA: &str = "tone-1.0";
pub const CLAIMS_SCHEMA: &str = "claims-1.0";
pub const WINDOWS_SCHEMA: &str = "behavior_windows-1.0";
pub const LINKS_SCHEMA: &str = "claim_links-1.0";
pub const MANIFEST_SCHEMA: &str = "manifest-1.0";
pub const SIGNAL_REPORT_SCHEMA: &str = "signal_report-1.0";

/// Derived text features computed once during normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Derived {
    /// Lower-cased, whitespace-collapsed text used for rule matching
    pub text_normalized: String,
    /// Raw character count
    pub char_count: u64,
    /// Whitespace-token estimate, not a tokenizer
    pub token_count_est: u64,
    pub has_question_mark: bool,
    pub has_exclamation_mark: bool,
}

/// One canonical text unit. Immutable after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub schema: String,
    /// Stable identity: caller-supplied, or derived from
    /// {thread id, normalized text}. Unique per run; duplicates are fatal.
    pub id: String,
    /// Zero-based input line index. The sole ordering authority.
    pub input_ordinal: u64,
    pub thread_id: String,
    pub is_reply: bool,
    pub author: String,
    pub text: String,
    pub derived: Derived,
    /// Opaque capture-layer provenance, carried through untouched
    #[serde(default)]
    pub provenance: serde_json::Value,
}

/// Per-record label assignment produced by the rule engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelItem {
    pub id: String,
    pub input_ordinal: u64,
    pub primary_label: String,
    /// Sorted, deduplicated secondary tags merged from fired rules
    pub secondary_tags: Vec<String>,
    pub confidence: String,
    /// Sorted, deduplicated ids of rules that fired
    pub rules_fired: Vec<String>,
    /// Accumulated score of the primary label
    pub score_total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSummary {
    pub by_label: BTreeMap<String, u64>,
    /// Count of records that fell to the axis sentinel
    pub sentinel_count: u64,
}

/// Classification output for one axis, in input-ordinal order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelDocument {
    pub schema: String,
    pub axis: String,
    pub ruleset_version: String,
    pub items: Vec<LabelItem>,
    pub summary: LabelSummary,
}

/// Per-record tone, combined from the polarity and intensity axes.
/// `unknown` on either axis is an expected absence, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneItem {
    pub id: String,
    pub input_ordinal: u64,
    pub polarity: String,
    pub intensity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneDocument {
    pub schema: String,
    pub items: Vec<ToneItem>,
}

/// One supporting quote for a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub quote: String,
    pub id: String,
    pub thread_id: String,
    pub ordinal: u64,
}

/// Presence of rhetorical marker terms in the first retained quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerPresence {
    pub present: bool,
    /// Sorted, deduplicated matched terms
    pub examples: Vec<String>,
}

/// Posture movement between the first and last retained quotes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalShift {
    /// True iff posture moved hedged -> assertive
    pub detected: bool,
    pub from: String,
    pub to: String,
}

/// A recurring declarative statement, keyed by hash(topic, normalized text)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_id: String,
    pub normalized_text: String,
    pub first_ordinal: u64,
    pub last_ordinal: u64,
    pub occurrence_count: u64,
    pub certainty_markers: MarkerPresence,
    pub intensifiers: MarkerPresence,
    pub modal_shift: ModalShift,
    /// Capped; lowest-ordinal entries after sorting by
    /// (ordinal, thread id, record id)
    pub evidence: Vec<Evidence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicClaims {
    pub topic_id: String,
    pub topic_label: String,
    /// Sorted by (first ordinal, claim id)
    pub claims: Vec<Claim>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimsDocument {
    pub schema: String,
    pub ordering_policy: String,
    /// Topics sorted by id
    pub topics: Vec<TopicClaims>,
}

/// Derived ordinal interval marking a tone transition or thread activity
/// span. Windows may overlap one another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorWindow {
    pub behavior_key: String,
    pub start_ordinal: u64,
    pub end_ordinal: u64,
    pub thread_id: String,
    /// Exactly the two transition record ids; empty for thread_activity
    /// windows by design
    pub supporting_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowsDocument {
    pub schema: String,
    /// Sorted by (start, end, key, thread id, joined supporting ids)
    pub behavior_windows: Vec<BehaviorWindow>,
}

/// Ordinal interval spanned by a claim's retained evidence.
/// No evidence means no window and therefore no links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityWindow {
    pub start_ordinal: Option<u64>,
    pub end_ordinal: Option<u64>,
    pub evidence_ordinals: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorLink {
    pub behavior_key: String,
    pub relationship: String,
    pub claim_window: [u64; 2],
    pub behavior_window: [u64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedClaim {
    pub claim_id: String,
    pub normalized_text: String,
    pub occurrence_count: u64,
    pub first_ordinal: u64,
    pub last_ordinal: u64,
    pub activity_window: ActivityWindow,
    /// Empty when no window overlaps, or run-wide in fallback mode.
    /// Always present; absence of links is explicit, never an omission.
    pub behavior_links: Vec<BehaviorLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedTopic {
    pub topic_id: String,
    pub claims: Vec<LinkedClaim>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinksDocument {
    pub schema: String,
    /// "ordinal_window" when any behavior window exists, else
    /// "fallback_global"
    pub linking_mode: String,
    pub windows_count: u64,
    pub topics: Vec<LinkedTopic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestInput {
    pub path: String,
    pub sha256: String,
    pub records: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestOutput {
    pub name: String,
    pub sha256: String,
}

/// Reproducibility manifest. `generated_at_utc` is metadata only and is
/// excluded from every hashed content; re-running on byte-identical input
/// reproduces `run_id` and all fingerprints exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub schema: String,
    pub run_id: String,
    pub producer: String,
    pub producer_version: String,
    pub generated_at_utc: String,
    pub input: ManifestInput,
    pub outputs: Vec<ManifestOutput>,
}

/// One retained example for a signal report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalExample {
    pub id: String,
    pub ordinal: u64,
    pub thread_id: String,
    pub text: String,
    pub rule_hits: Vec<String>,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalFingerprints {
    pub input_fingerprint: String,
    pub spec_fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalScope {
    pub items_analyzed: u64,
}

/// Output of one signal-spec evaluation over the normalized corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReport {
    pub schema: String,
    pub signal_id: String,
    pub signal_version: String,
    pub dataset_scope: SignalScope,
    pub metrics: BTreeMap<String, serde_json::Value>,
    /// Capped, deterministically ordered per the spec's declared ordering
    pub examples: Vec<SignalExample>,
    pub fingerprints: SignalFingerprints,
}
