//! Generic signal runner
//!
//! Evaluates one versioned signal spec over the normalized corpus and
//! produces a self-describing report: declared metrics, a capped and
//! deterministically ordered example set, and fingerprints of both the
//! input and the spec so any report can be traced to exactly what
//! produced it.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::DeriveError;
use crate::fingerprint::short_fingerprint;
use crate::ops::Op;
use crate::schema::signal::{SignalRule, SignalSpec};
use crate::types::{
    Record, SignalExample, SignalFingerprints, SignalReport, SignalScope, SIGNAL_REPORT_SCHEMA,
};

/// Matched record retained for metric and example computation
struct Hit<'a> {
    record: &'a Record,
    rule_hits: Vec<String>,
    score: i64,
}

/// Run one signal spec over the corpus.
///
/// Inclusion rules are OR-composed at the top level: any matching
/// inclusion rule keeps the record. Any matching exclusion rule then
/// drops it, exclusion winning ties.
pub fn run_signal(spec: &SignalSpec, records: &[Record]) -> Result<SignalReport, DeriveError> {
    if records.is_empty() {
        return Err(DeriveError::EmptyInput);
    }

    let first = record_value(&records[0])?;
    let missing: Vec<String> = spec
        .required_input_fields
        .iter()
        .filter(|f| first.get(f.as_str()).is_none())
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(DeriveError::MissingInputFields(missing));
    }

    let mut hits: Vec<Hit> = Vec::new();
    for record in records {
        let value = record_value(record)?;

        let mut fired: Vec<String> = Vec::new();
        for rule in &spec.inclusion_rules {
            if rule_matches(rule, &value)? {
                fired.push(rule.rule_id.clone());
            }
        }
        if fired.is_empty() {
            continue;
        }

        let mut excluded = false;
        for rule in &spec.exclusion_rules {
            if rule_matches(rule, &value)? {
                excluded = true;
                break;
            }
        }
        if excluded {
            continue;
        }

        fired.sort();
        fired.dedup();
        let mut score = fired.len() as i64;
        if let Some(cap) = spec.outputs.score_cap {
            score = score.min(cap);
        }
        hits.push(Hit {
            record,
            rule_hits: fired,
            score,
        });
    }

    let metrics = compute_metrics(spec, records, &hits);
    let examples = select_examples(spec, hits);

    Ok(SignalReport {
        schema: SIGNAL_REPORT_SCHEMA.to_string(),
        signal_id: spec.signal_id.clone(),
        signal_version: spec.version.clone(),
        dataset_scope: SignalScope {
            items_analyzed: records.len() as u64,
        },
        metrics,
        examples,
        fingerprints: SignalFingerprints {
            input_fingerprint: short_fingerprint(serde_json::to_string(records)?.as_bytes()),
            spec_fingerprint: short_fingerprint(serde_json::to_string(spec)?.as_bytes()),
        },
    })
}

fn record_value(record: &Record) -> Result<Value, DeriveError> {
    Ok(serde_json::to_value(record)?)
}

/// Evaluate one rule against a record's shallow field values. A missing
/// field is a null value, which fails typed conditions.
fn rule_matches(rule: &SignalRule, value: &Value) -> Result<bool, DeriveError> {
    let mut matched = 0usize;
    for cond in &rule.conditions {
        let op = Op::parse(&cond.op, &rule.rule_id)?;
        let field_value = value.get(cond.field.as_str()).unwrap_or(&Value::Null);
        if op.eval(&rule.rule_id, field_value, &cond.value)? {
            matched += 1;
        } else if rule.logic == "all" {
            return Ok(false);
        }
    }
    match rule.logic.as_str() {
        "all" => Ok(!rule.conditions.is_empty() && matched == rule.conditions.len()),
        _ => Ok(matched > 0),
    }
}

/// Produce every declared metric. The metric id suffix selects the
/// computation; suffixes were validated at spec load.
fn compute_metrics(spec: &SignalSpec, records: &[Record], hits: &[Hit]) -> BTreeMap<String, Value> {
    let mut metrics = BTreeMap::new();
    for metric in &spec.outputs.metrics {
        let id = metric.metric_id.clone();
        let value = if id.ends_with("_count") {
            Value::from(hits.len() as u64)
        } else if id.ends_with("_rate_per_100") {
            let rate = hits.len() as f64 * 100.0 / records.len() as f64;
            // four decimal places, so serialization is reproducible
            Value::from((rate * 10_000.0).round() / 10_000.0)
        } else {
            let mut by_thread: BTreeMap<String, u64> = BTreeMap::new();
            for hit in hits {
                *by_thread.entry(hit.record.thread_id.clone()).or_insert(0) += 1;
            }
            serde_json::to_value(by_thread).unwrap_or(Value::Null)
        };
        metrics.insert(id, value);
    }
    metrics
}

/// Order hits by the spec's declared ordering and cap the retained set.
fn select_examples(spec: &SignalSpec, mut hits: Vec<Hit>) -> Vec<SignalExample> {
    match spec.outputs.example_selection.ordering.as_str() {
        "score_desc_then_ordinal" => hits.sort_by(|a, b| {
            (Reverse(a.score), a.record.input_ordinal, &a.record.id)
                .cmp(&(Reverse(b.score), b.record.input_ordinal, &b.record.id))
        }),
        _ => hits.sort_by(|a, b| {
            (a.record.input_ordinal, &a.record.id).cmp(&(b.record.input_ordinal, &b.record.id))
        }),
    }
    hits.truncate(spec.outputs.example_selection.max_examples);

    hits.into_iter()
        .map(|hit| SignalExample {
            id: hit.record.id.clone(),
            ordinal: hit.record.input_ordinal,
            thread_id: hit.record.thread_id.clone(),
            text: hit.record.text.clone(),
            rule_hits: hit.rule_hits,
            score: hit.score,
        })
        .collect()
}
