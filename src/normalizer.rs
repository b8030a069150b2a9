//! Record normalization
//!
//! Parses strict line-delimited capture output into canonical records.
//! This is a pure transform with no recovery path: a blank line, a missing
//! required field, or a duplicate id aborts the whole run. Malformed source
//! data must be fixed upstream.

use serde_json::Value;
use std::collections::BTreeSet;

use crate::error::DeriveError;
use crate::fingerprint::stable_record_id;
use crate::types::{Derived, Record, NORMALIZED_SCHEMA};

/// Fields every raw record must carry
const REQUIRED_FIELDS: [&str; 3] = ["author", "text", "thread_id"];

/// Parse raw captured records, one JSON object per line.
///
/// The returned records are in input order; `input_ordinal` is the
/// zero-based line index and remains the sole ordering authority for every
/// downstream stage.
pub fn parse_records(input: &str) -> Result<Vec<Record>, DeriveError> {
    let mut records = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            return Err(DeriveError::BlankLine { line: line_no });
        }

        let value: Value = serde_json::from_str(line)
            .map_err(|source| DeriveError::MalformedLine {
                line: line_no,
                source,
            })?;
        let obj = value
            .as_object()
            .ok_or(DeriveError::NotAnObject { line: line_no })?;

        for field in REQUIRED_FIELDS {
            match obj.get(field) {
                None => {
                    return Err(DeriveError::MissingField {
                        field: field.to_string(),
                        line: line_no,
                    })
                }
                Some(v) if !v.is_string() => {
                    return Err(DeriveError::WrongFieldType {
                        field: field.to_string(),
                        line: line_no,
                    })
                }
                Some(_) => {}
            }
        }

        let author = obj["author"].as_str().unwrap_or_default().to_string();
        let text = obj["text"].as_str().unwrap_or_default().to_string();
        let thread_id = obj["thread_id"].as_str().unwrap_or_default().to_string();
        let text_normalized = normalize_text(&text);

        let id = match obj.get("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::String(_)) | None => stable_record_id(&thread_id, &text_normalized),
            Some(_) => {
                return Err(DeriveError::WrongFieldType {
                    field: "id".to_string(),
                    line: line_no,
                })
            }
        };

        if !seen.insert(id.clone()) {
            return Err(DeriveError::DuplicateId { id, line: line_no });
        }

        records.push(Record {
            schema: NORMALIZED_SCHEMA.to_string(),
            id,
            input_ordinal: idx as u64,
            thread_id,
            is_reply: obj
                .get("is_reply")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            author,
            derived: Derived {
                text_normalized,
                char_count: text.chars().count() as u64,
                token_count_est: token_estimate(&text),
                has_question_mark: text.contains('?'),
                has_exclamation_mark: text.contains('!'),
            },
            text,
            provenance: obj
                .get("provenance")
                .cloned()
                .unwrap_or(Value::Object(Default::default())),
        });
    }

    Ok(records)
}

/// Lower-case and collapse whitespace
pub fn normalize_text(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn token_estimate(s: &str) -> u64 {
    s.split_whitespace().count() as u64
}
