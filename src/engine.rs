//! Label rule engine
//!
//! Evaluates an ordered rule set against each record's normalized text and
//! produces a scored multi-label assignment with exactly one deterministic
//! primary label. Rules run in declared order; ties resolve through the
//! externally supplied precedence list, then lexically.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::DeriveError;
use crate::ops::Op;
use crate::schema::ruleset::{ConfidenceBand, RuleSetSpec};
use crate::types::{
    LabelDocument, LabelItem, LabelSummary, Record, ToneDocument, ToneItem, CONFIDENCE_NA,
    LABELS_SCHEMA, TONE_SCHEMA, UNKNOWN_TONE,
};

/// Classify one record against a rule set.
pub fn classify(record: &Record, spec: &RuleSetSpec) -> Result<LabelItem, DeriveError> {
    let subject = Value::String(record.derived.text_normalized.clone());

    let mut score_by_label: BTreeMap<&str, i64> = BTreeMap::new();
    let mut fired: Vec<String> = Vec::new();
    let mut tags: Vec<String> = Vec::new();

    for rule in &spec.rules {
        let op = Op::parse(&rule.kind, &rule.rule_id)?;
        let target = Value::Array(
            rule.terms
                .iter()
                .map(|t| Value::String(t.clone()))
                .collect(),
        );
        if op.eval(&rule.rule_id, &subject, &target)? {
            *score_by_label.entry(rule.label.as_str()).or_insert(0) += rule.score;
            fired.push(rule.rule_id.clone());
            tags.extend(rule.tags.iter().cloned());
        }
    }

    if score_by_label.is_empty() {
        return Ok(LabelItem {
            id: record.id.clone(),
            input_ordinal: record.input_ordinal,
            primary_label: spec.sentinel().to_string(),
            secondary_tags: Vec::new(),
            confidence: CONFIDENCE_NA.to_string(),
            rules_fired: Vec::new(),
            score_total: 0,
        });
    }

    let primary = pick_primary(&score_by_label, &spec.tie_break_precedence);
    let score_total = score_by_label[primary.as_str()];

    fired.sort();
    fired.dedup();
    tags.sort();
    tags.dedup();

    Ok(LabelItem {
        id: record.id.clone(),
        input_ordinal: record.input_ordinal,
        primary_label: primary,
        secondary_tags: tags,
        confidence: confidence_band(score_total, &spec.confidence_bands),
        rules_fired: fired,
        score_total,
    })
}

/// Primary label selection: highest score, then earliest in the precedence
/// list, with unlisted labels ranking last and lexical order as the final
/// fallback.
fn pick_primary(scores: &BTreeMap<&str, i64>, precedence: &[String]) -> String {
    let rank = |label: &str| -> usize {
        precedence
            .iter()
            .position(|p| p == label)
            .unwrap_or(usize::MAX)
    };

    let mut entries: Vec<(&str, i64)> = scores.iter().map(|(k, v)| (*k, *v)).collect();
    entries.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| rank(a.0).cmp(&rank(b.0)))
            .then_with(|| a.0.cmp(b.0))
    });
    entries[0].0.to_string()
}

/// Band whose min threshold is the largest value at or below the score;
/// no qualifying band yields the "n_a" sentinel.
pub fn confidence_band(score: i64, bands: &[ConfidenceBand]) -> String {
    let mut best: Option<&ConfidenceBand> = None;
    for band in bands {
        if score >= band.min_score && best.map_or(true, |b| band.min_score > b.min_score) {
            best = Some(band);
        }
    }
    best.map(|b| b.id.clone())
        .unwrap_or_else(|| CONFIDENCE_NA.to_string())
}

/// Classify every record, threading an explicit per-label accumulator into
/// the document summary. Records arrive and leave in input-ordinal order.
pub fn classify_all(records: &[Record], spec: &RuleSetSpec) -> Result<LabelDocument, DeriveError> {
    let mut items = Vec::with_capacity(records.len());
    let mut by_label: BTreeMap<String, u64> = BTreeMap::new();
    let mut sentinel_count: u64 = 0;

    for record in records {
        let item = classify(record, spec)?;
        *by_label.entry(item.primary_label.clone()).or_insert(0) += 1;
        if item.primary_label == spec.sentinel() {
            sentinel_count += 1;
        }
        items.push(item);
    }

    Ok(LabelDocument {
        schema: LABELS_SCHEMA.to_string(),
        axis: spec.axis.clone(),
        ruleset_version: spec.version.clone(),
        items,
        summary: LabelSummary {
            by_label,
            sentinel_count,
        },
    })
}

/// Combine the optional polarity and intensity passes into one tone
/// document. A missing spec leaves every record at the "unknown" sentinel;
/// downstream window derivation treats that as an expected absence.
pub fn derive_tone(
    records: &[Record],
    polarity: Option<&RuleSetSpec>,
    intensity: Option<&RuleSetSpec>,
) -> Result<ToneDocument, DeriveError> {
    let polarity_items = match polarity {
        Some(spec) => Some(classify_all(records, spec)?),
        None => None,
    };
    let intensity_items = match intensity {
        Some(spec) => Some(classify_all(records, spec)?),
        None => None,
    };

    let pick = |doc: &Option<LabelDocument>, i: usize| -> String {
        doc.as_ref()
            .map(|d| d.items[i].primary_label.clone())
            .unwrap_or_else(|| UNKNOWN_TONE.to_string())
    };

    let items = records
        .iter()
        .enumerate()
        .map(|(i, r)| ToneItem {
            id: r.id.clone(),
            input_ordinal: r.input_ordinal,
            polarity: pick(&polarity_items, i),
            intensity: pick(&intensity_items, i),
        })
        .collect();

    Ok(ToneDocument {
        schema: TONE_SCHEMA.to_string(),
        items,
    })
}
