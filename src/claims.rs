//! Claim extraction and aggregation
//!
//! Splits record text into conservative declarative-sentence candidates,
//! collapses repeats into claims keyed by hash(topic, normalized text), and
//! accumulates cross-record evidence plus rhetorical-marker annotations.
//! No natural-language understanding happens here: candidates are surface
//! forms, markers are literal term lists.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::DeriveError;
use crate::fingerprint::claim_id;
use crate::types::{
    Claim, ClaimsDocument, Evidence, LabelDocument, MarkerPresence, ModalShift, Record,
    TopicClaims, CLAIMS_SCHEMA, UNCATEGORIZED,
};

/// Candidates shorter than this are dropped as fragments
const MIN_CANDIDATE_LEN: usize = 18;

/// Default cap on retained evidence entries per claim
pub const DEFAULT_EVIDENCE_CAP: usize = 25;

const CERTAINTY_MARKERS: [&str; 16] = [
    "always",
    "never",
    "everyone",
    "no one",
    "nobody",
    "everybody",
    "fact",
    "facts",
    "obviously",
    "clearly",
    "certainly",
    "definitely",
    "proven",
    "proof",
    "undeniable",
    "without a doubt",
];

const INTENSIFIERS: [&str; 10] = [
    "very",
    "extremely",
    "literally",
    "absolutely",
    "totally",
    "completely",
    "insanely",
    "unbelievably",
    "100%",
    "fully",
];

const HEDGES: [&str; 13] = [
    "i think",
    "i believe",
    "maybe",
    "probably",
    "possibly",
    "seems",
    "seem",
    "might",
    "could",
    "i guess",
    "in my opinion",
    "imo",
    "apparently",
];

fn strip_punct_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // keep apostrophes so contractions survive normalization
    RE.get_or_init(|| Regex::new(r"[^\w\s']+").expect("static regex"))
}

/// Split text into candidate sentences on `.`/`!` boundaries and line
/// breaks, then drop questions, short fragments, and pieces without an
/// ASCII letter.
pub fn candidate_sentences(text: &str) -> Vec<String> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\n' {
            parts.push(std::mem::take(&mut current));
            continue;
        }
        current.push(c);
        if (c == '.' || c == '!') && chars.peek().map_or(true, |n| n.is_whitespace()) {
            parts.push(std::mem::take(&mut current));
        }
    }
    parts.push(current);

    parts
        .into_iter()
        .map(|p| collapse_ws(&p))
        .filter(|s| !s.is_empty())
        .filter(|s| !s.contains('?'))
        .filter(|s| s.chars().count() >= MIN_CANDIDATE_LEN)
        .filter(|s| s.chars().any(|c| c.is_ascii_alphabetic()))
        .collect()
}

/// Normalize a candidate: lower-case, strip punctuation except internal
/// apostrophes, collapse whitespace.
pub fn normalize_claim_text(s: &str) -> String {
    let lowered = collapse_ws(&s.to_lowercase());
    let stripped = strip_punct_re().replace_all(&lowered, "");
    collapse_ws(&stripped)
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn marker_examples(text_lc: &str, markers: &[&str]) -> Vec<String> {
    let mut found: Vec<String> = markers
        .iter()
        .filter(|m| text_lc.contains(*m))
        .map(|m| m.to_string())
        .collect();
    found.sort();
    found.dedup();
    found
}

/// Posture bucket of a quote: hedged if any hedge phrase appears, else
/// assertive.
pub fn posture(quote: &str) -> &'static str {
    let low = quote.to_lowercase();
    if HEDGES.iter().any(|h| low.contains(h)) {
        "hedged"
    } else {
        "assertive"
    }
}

/// Sort evidence by (ordinal, thread id, record id) and truncate to the
/// cap: the lowest-ordinal entries survive, never "first seen".
fn retain_evidence(evidence: &mut Vec<Evidence>, cap: usize) {
    evidence.sort_by(|x, y| {
        x.ordinal
            .cmp(&y.ordinal)
            .then_with(|| x.thread_id.cmp(&y.thread_id))
            .then_with(|| x.id.cmp(&y.id))
    });
    evidence.truncate(cap);
}

struct ClaimAcc {
    normalized_text: String,
    first_ordinal: u64,
    last_ordinal: u64,
    occurrence_count: u64,
    evidence: Vec<Evidence>,
}

/// Extract topic-grouped claims from the canonical records and their label
/// assignments.
///
/// A record's claim topics are its primary label plus secondary tags,
/// excluding the uncategorized sentinel. A label item whose id or ordinal
/// does not match a known record is a cross-stage join failure and aborts
/// the run.
pub fn extract_claims(
    records: &[Record],
    labels: &LabelDocument,
    evidence_cap: usize,
) -> Result<ClaimsDocument, DeriveError> {
    let by_id: BTreeMap<&str, &Record> = records.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut topics_for: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for item in &labels.items {
        let record = by_id
            .get(item.id.as_str())
            .ok_or_else(|| DeriveError::UnknownLabelRecord {
                id: item.id.clone(),
            })?;
        if item.input_ordinal != record.input_ordinal {
            return Err(DeriveError::OrdinalMismatch {
                id: item.id.clone(),
                found: item.input_ordinal,
                expected: record.input_ordinal,
            });
        }

        let mut topics: Vec<String> = Vec::new();
        if item.primary_label != UNCATEGORIZED {
            topics.push(item.primary_label.clone());
        }
        topics.extend(item.secondary_tags.iter().cloned());
        topics.sort();
        topics.dedup();
        if !topics.is_empty() {
            topics_for.insert(item.id.as_str(), topics);
        }
    }

    // Accumulate per (topic, claim id), threading the accumulator rather
    // than any shared state.
    let mut acc: BTreeMap<(String, String), ClaimAcc> = BTreeMap::new();

    for record in records {
        let topics = match topics_for.get(record.id.as_str()) {
            Some(t) => t,
            None => continue,
        };
        let candidates = candidate_sentences(&record.text);
        if candidates.is_empty() {
            continue;
        }

        for topic in topics {
            for sentence in &candidates {
                let normalized = normalize_claim_text(sentence);
                if normalized.is_empty() {
                    continue;
                }
                let cid = claim_id(topic, &normalized);
                let entry = acc
                    .entry((topic.clone(), cid))
                    .or_insert_with(|| ClaimAcc {
                        normalized_text: normalized,
                        first_ordinal: record.input_ordinal,
                        last_ordinal: record.input_ordinal,
                        occurrence_count: 0,
                        evidence: Vec::new(),
                    });
                entry.occurrence_count += 1;
                entry.first_ordinal = entry.first_ordinal.min(record.input_ordinal);
                entry.last_ordinal = entry.last_ordinal.max(record.input_ordinal);
                entry.evidence.push(Evidence {
                    quote: sentence.clone(),
                    id: record.id.clone(),
                    thread_id: record.thread_id.clone(),
                    ordinal: record.input_ordinal,
                });
            }
        }
    }

    let mut by_topic: BTreeMap<String, Vec<Claim>> = BTreeMap::new();
    for ((topic, cid), mut a) in acc {
        retain_evidence(&mut a.evidence, evidence_cap);

        let first_quote = a
            .evidence
            .first()
            .map(|e| e.quote.to_lowercase())
            .unwrap_or_else(|| a.normalized_text.clone());
        let cert = marker_examples(&first_quote, &CERTAINTY_MARKERS);
        let intens = marker_examples(&first_quote, &INTENSIFIERS);

        let from = a.evidence.first().map(|e| posture(&e.quote)).unwrap_or("unknown");
        let to = a.evidence.last().map(|e| posture(&e.quote)).unwrap_or("unknown");

        by_topic.entry(topic).or_default().push(Claim {
            claim_id: cid,
            normalized_text: a.normalized_text,
            first_ordinal: a.first_ordinal,
            last_ordinal: a.last_ordinal,
            occurrence_count: a.occurrence_count,
            certainty_markers: MarkerPresence {
                present: !cert.is_empty(),
                examples: cert,
            },
            intensifiers: MarkerPresence {
                present: !intens.is_empty(),
                examples: intens,
            },
            modal_shift: ModalShift {
                detected: from == "hedged" && to == "assertive",
                from: from.to_string(),
                to: to.to_string(),
            },
            evidence: a.evidence,
        });
    }

    let topics = by_topic
        .into_iter()
        .map(|(topic_id, mut claims)| {
            claims.sort_by(|a, b| {
                a.first_ordinal
                    .cmp(&b.first_ordinal)
                    .then_with(|| a.claim_id.cmp(&b.claim_id))
            });
            TopicClaims {
                topic_label: topic_id.clone(),
                topic_id,
                claims,
            }
        })
        .collect();

    Ok(ClaimsDocument {
        schema: CLAIMS_SCHEMA.to_string(),
        ordering_policy: "input_ordinal".to_string(),
        topics,
    })
}
