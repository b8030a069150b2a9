//! ruleset-1.0 schema definition
//!
//! An externally supplied, ordered rule set for one classification axis.
//! Evaluation order is declared order; rules are never re-sorted. The axis
//! determines the sentinel primary label used when no rule fires.

use serde::{Deserialize, Serialize};

use crate::error::DeriveError;
use crate::ops::Op;
use crate::types::{UNCATEGORIZED, UNKNOWN_TONE};

/// Current rule-set schema version
pub const RULESET_SCHEMA: &str = "ruleset-1.0";

/// One classification rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub rule_id: String,
    /// Operator name resolved through the shared table at load time
    pub kind: String,
    /// Target label this rule scores
    pub label: String,
    #[serde(default)]
    pub terms: Vec<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A named score bucket; the band whose `min_score` is the largest value
/// at or below the score is selected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub id: String,
    pub min_score: i64,
}

/// Versioned rule-set document for one axis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSetSpec {
    pub schema: String,
    /// "topic", "polarity" or "intensity"
    pub axis: String,
    #[serde(default)]
    pub version: String,
    pub rules: Vec<Rule>,
    /// External label ordering that resolves equal-score ties
    pub tie_break_precedence: Vec<String>,
    #[serde(default)]
    pub confidence_bands: Vec<ConfidenceBand>,
}

impl RuleSetSpec {
    /// Parse and validate a rule-set document. Schema mismatch, unknown
    /// axis, unknown operator, or an invalid regex term is fatal here,
    /// before any record is evaluated.
    pub fn from_json(name: &str, json: &str) -> Result<Self, DeriveError> {
        let spec: RuleSetSpec =
            serde_json::from_str(json).map_err(|source| DeriveError::SpecParse {
                name: name.to_string(),
                source,
            })?;
        spec.validate(name)?;
        Ok(spec)
    }

    pub fn validate(&self, name: &str) -> Result<(), DeriveError> {
        if self.schema != RULESET_SCHEMA {
            return Err(DeriveError::SchemaMismatch {
                name: name.to_string(),
                expected: RULESET_SCHEMA.to_string(),
                found: self.schema.clone(),
            });
        }
        if !matches!(self.axis.as_str(), "topic" | "polarity" | "intensity") {
            return Err(DeriveError::UnknownAxis {
                name: name.to_string(),
                axis: self.axis.clone(),
            });
        }
        for rule in &self.rules {
            let op = Op::parse(&rule.kind, &rule.rule_id)?;
            if op == Op::RegexAny {
                for term in &rule.terms {
                    regex::RegexBuilder::new(term)
                        .case_insensitive(true)
                        .build()
                        .map_err(|_| DeriveError::InvalidPattern {
                            pattern: term.clone(),
                            rule_id: rule.rule_id.clone(),
                        })?;
                }
            }
        }
        Ok(())
    }

    /// Sentinel primary label for this axis when no rule scores
    pub fn sentinel(&self) -> &'static str {
        match self.axis.as_str() {
            "topic" => UNCATEGORIZED,
            _ => UNKNOWN_TONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_spec_json() -> &'static str {
        r#"{
            "schema": "ruleset-1.0",
            "axis": "topic",
            "version": "topics-test",
            "rules": [
                {"rule_id": "r1", "kind": "contains_any", "label": "t1",
                 "terms": ["fact"], "score": 3, "tags": ["claims"]},
                {"rule_id": "r2", "kind": "contains_any", "label": "t2",
                 "terms": ["weather"], "score": 2}
            ],
            "tie_break_precedence": ["t1", "t2"],
            "confidence_bands": [
                {"id": "low", "min_score": 0},
                {"id": "med", "min_score": 5},
                {"id": "high", "min_score": 10}
            ]
        }"#
    }

    #[test]
    fn test_load_valid_spec() {
        let spec = RuleSetSpec::from_json("topics.json", sample_spec_json()).unwrap();
        assert_eq!(spec.rules.len(), 2);
        assert_eq!(spec.sentinel(), UNCATEGORIZED);
    }

    #[test]
    fn test_schema_mismatch_is_fatal() {
        let json = sample_spec_json().replace("ruleset-1.0", "ruleset-0.9");
        let err = RuleSetSpec::from_json("topics.json", &json).unwrap_err();
        assert!(err.to_string().contains("ruleset-1.0"));
        assert!(err.to_string().contains("ruleset-0.9"));
    }

    #[test]
    fn test_unknown_kind_is_fatal_at_load() {
        let json = sample_spec_json().replace("contains_any", "sounds_like");
        let err = RuleSetSpec::from_json("topics.json", &json).unwrap_err();
        assert!(err.to_string().contains("sounds_like"));
    }

    #[test]
    fn test_unknown_axis_is_fatal() {
        let json = sample_spec_json().replace("\"axis\": \"topic\"", "\"axis\": \"mood\"");
        let err = RuleSetSpec::from_json("topics.json", &json).unwrap_err();
        assert!(err.to_string().contains("mood"));
    }

    #[test]
    fn test_tone_axis_sentinel() {
        let json = sample_spec_json().replace("\"axis\": \"topic\"", "\"axis\": \"polarity\"");
        let spec = RuleSetSpec::from_json("polarity.json", &json).unwrap();
        assert_eq!(spec.sentinel(), UNKNOWN_TONE);
    }
}
