//! Error types for Claimsift
//!
//! Every failure is fatal for the whole run: the pipeline never degrades into
//! partial output. Each variant maps to the stage that raised it so callers
//! can emit a single stage-prefixed diagnostic line.

use thiserror::Error;

/// Errors that can occur during derivation
#[derive(Debug, Error)]
pub enum DeriveError {
    #[error("blank line at line {line} (strict jsonl)")]
    BlankLine { line: usize },

    #[error("invalid json at line {line}: {source}")]
    MalformedLine {
        line: usize,
        source: serde_json::Error,
    },

    #[error("record at line {line} must be a json object")]
    NotAnObject { line: usize },

    #[error("missing required field '{field}' at line {line}")]
    MissingField { field: String, line: usize },

    #[error("field '{field}' has wrong type at line {line}")]
    WrongFieldType { field: String, line: usize },

    #[error("duplicate record id '{id}' at line {line}")]
    DuplicateId { id: String, line: usize },

    #[error("failed to parse {name}: {source}")]
    SpecParse {
        name: String,
        source: serde_json::Error,
    },

    #[error("{name}: schema must be '{expected}', found '{found}'")]
    SchemaMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("{name}: unknown axis '{axis}' (expected topic, polarity or intensity)")]
    UnknownAxis { name: String, axis: String },

    #[error("unknown operator '{op}' in rule '{rule_id}'")]
    UnknownOperator { op: String, rule_id: String },

    #[error("unknown rule logic '{logic}' in rule '{rule_id}' (expected all or any)")]
    UnknownLogic { logic: String, rule_id: String },

    #[error("invalid regex pattern '{pattern}' in rule '{rule_id}'")]
    InvalidPattern { pattern: String, rule_id: String },

    #[error("unknown example ordering '{0}'")]
    UnknownOrdering(String),

    #[error("unknown metric id '{0}'")]
    UnknownMetric(String),

    #[error("input contains no records")]
    EmptyInput,

    #[error("record missing required input fields: {0:?}")]
    MissingInputFields(Vec<String>),

    #[error("label item references unknown record id '{id}'")]
    UnknownLabelRecord { id: String },

    #[error("label item for record '{id}' carries ordinal {found}, record has {expected}")]
    OrdinalMismatch {
        id: String,
        found: u64,
        expected: u64,
    },

    #[error("tone item references unknown record id '{id}'")]
    UnknownToneRecord { id: String },

    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

impl DeriveError {
    /// Name of the pipeline stage that raised this error, used as the
    /// diagnostic prefix when a run aborts.
    pub fn stage(&self) -> &'static str {
        match self {
            DeriveError::BlankLine { .. }
            | DeriveError::MalformedLine { .. }
            | DeriveError::NotAnObject { .. }
            | DeriveError::MissingField { .. }
            | DeriveError::WrongFieldType { .. }
            | DeriveError::DuplicateId { .. } => "normalize",

            DeriveError::SpecParse { .. }
            | DeriveError::SchemaMismatch { .. }
            | DeriveError::UnknownAxis { .. }
            | DeriveError::UnknownOperator { .. }
            | DeriveError::UnknownLogic { .. }
            | DeriveError::InvalidPattern { .. } => "schema",

            DeriveError::UnknownOrdering(_)
            | DeriveError::UnknownMetric(_)
            | DeriveError::EmptyInput
            | DeriveError::MissingInputFields(_) => "signal",

            DeriveError::UnknownLabelRecord { .. } | DeriveError::OrdinalMismatch { .. } => {
                "claims"
            }

            DeriveError::UnknownToneRecord { .. } => "windows",

            DeriveError::Encode(_) => "encode",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        let e = DeriveError::BlankLine { line: 3 };
        assert_eq!(e.stage(), "normalize");

        let e = DeriveError::UnknownOperator {
            op: "fuzzy".to_string(),
            rule_id: "r1".to_string(),
        };
        assert_eq!(e.stage(), "schema");

        let e = DeriveError::UnknownToneRecord {
            id: "x".to_string(),
        };
        assert_eq!(e.stage(), "windows");
    }

    #[test]
    fn test_display_names_the_offender() {
        let e = DeriveError::DuplicateId {
            id: "abc123".to_string(),
            line: 7,
        };
        let msg = e.to_string();
        assert!(msg.contains("abc123"));
        assert!(msg.contains('7'));
    }
}
