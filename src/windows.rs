//! Behavior window derivation
//!
//! Locates already-computed tone transitions and thread activity spans as
//! ordinal-indexed windows. No new interpretation happens here: the input
//! tone labels are taken as given, and a missing label simply produces no
//! transition across that gap.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::DeriveError;
use crate::types::{
    BehaviorWindow, Record, ToneDocument, WindowsDocument, UNKNOWN_TONE, WINDOWS_SCHEMA,
};

/// Derive transition and thread-activity windows from the canonical record
/// order and per-record tone labels.
///
/// A tone item referencing an unknown record id is a cross-stage join
/// failure and aborts the run.
pub fn derive_windows(
    records: &[Record],
    tone: &ToneDocument,
) -> Result<WindowsDocument, DeriveError> {
    let known: BTreeSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
    let mut tone_by_id: BTreeMap<&str, (&str, &str)> = BTreeMap::new();
    for item in &tone.items {
        if !known.contains(item.id.as_str()) {
            return Err(DeriveError::UnknownToneRecord {
                id: item.id.clone(),
            });
        }
        tone_by_id.insert(
            item.id.as_str(),
            (item.polarity.as_str(), item.intensity.as_str()),
        );
    }

    let labeled = |label: &str| -> bool { !label.is_empty() && label != UNKNOWN_TONE };

    let mut windows: Vec<BehaviorWindow> = Vec::new();

    // Transitions across adjacent records in canonical order. Pairs where
    // either side lacks a known label are skipped; transitions never span
    // a gap.
    for pair in records.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let (a_pol, a_int) = match tone_by_id.get(a.id.as_str()) {
            Some(t) => *t,
            None => continue,
        };
        let (b_pol, b_int) = match tone_by_id.get(b.id.as_str()) {
            Some(t) => *t,
            None => continue,
        };

        let thread_id = if !a.thread_id.is_empty() {
            a.thread_id.clone()
        } else {
            b.thread_id.clone()
        };

        let mut push_transition = |kind: &str| {
            windows.push(BehaviorWindow {
                behavior_key: format!("{}_transition", kind),
                start_ordinal: a.input_ordinal.min(b.input_ordinal),
                end_ordinal: a.input_ordinal.max(b.input_ordinal),
                thread_id: thread_id.clone(),
                supporting_ids: vec![a.id.clone(), b.id.clone()],
            });
        };

        if labeled(a_pol) && labeled(b_pol) && a_pol != b_pol {
            push_transition("polarity");
        }
        if labeled(a_int) && labeled(b_int) && a_int != b_int {
            push_transition("intensity");
        }
    }

    // One activity window per thread spanning its min/max ordinal.
    // Supporting ids stay empty; membership is the thread itself.
    let mut span_by_thread: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for record in records {
        if record.thread_id.is_empty() {
            continue;
        }
        span_by_thread
            .entry(record.thread_id.as_str())
            .and_modify(|(lo, hi)| {
                *lo = (*lo).min(record.input_ordinal);
                *hi = (*hi).max(record.input_ordinal);
            })
            .or_insert((record.input_ordinal, record.input_ordinal));
    }
    for (thread_id, (lo, hi)) in span_by_thread {
        windows.push(BehaviorWindow {
            behavior_key: "thread_activity".to_string(),
            start_ordinal: lo,
            end_ordinal: hi,
            thread_id: thread_id.to_string(),
            supporting_ids: Vec::new(),
        });
    }

    // Deduplicate on the full key, then apply the documented final order.
    let mut seen: BTreeSet<(String, u64, u64, String, String)> = BTreeSet::new();
    let mut unique: Vec<BehaviorWindow> = Vec::new();
    for w in windows {
        let key = (
            w.behavior_key.clone(),
            w.start_ordinal,
            w.end_ordinal,
            w.thread_id.clone(),
            supporting_ids_key(&w.supporting_ids),
        );
        if seen.insert(key) {
            unique.push(w);
        }
    }
    unique.sort_by(|a, b| {
        a.start_ordinal
            .cmp(&b.start_ordinal)
            .then_with(|| a.end_ordinal.cmp(&b.end_ordinal))
            .then_with(|| a.behavior_key.cmp(&b.behavior_key))
            .then_with(|| a.thread_id.cmp(&b.thread_id))
            .then_with(|| {
                supporting_ids_key(&a.supporting_ids).cmp(&supporting_ids_key(&b.supporting_ids))
            })
    });

    Ok(WindowsDocument {
        schema: WINDOWS_SCHEMA.to_string(),
        behavior_windows: unique,
    })
}

/// Supporting-id component of the dedup and sort key: sorted, then joined,
/// so the key never depends on emission order.
fn supporting_ids_key(ids: &[String]) -> String {
    let mut sorted = ids.to_vec();
    sorted.sort();
    sorted.join(",")
}
