//! signal-1.0 schema definition
//!
//! A signal spec composes conditions from the shared operator table into
//! AND/OR inclusion and exclusion rules, plus a declared metric set and a
//! capped, deterministically ordered example selection. Everything a run
//! could trip over is validated here, at load time.

use serde::{Deserialize, Serialize};

use crate::error::DeriveError;
use crate::ops::Op;

/// Current signal spec schema version
pub const SIGNAL_SCHEMA: &str = "signal-1.0";

/// Metric-id suffixes the runner knows how to produce
const KNOWN_METRIC_SUFFIXES: [&str; 3] = ["_count", "_rate_per_100", "_over_thread"];

/// Example orderings the runner supports. Both are ordinal-anchored; there
/// is deliberately no wall-clock ordering.
const KNOWN_ORDERINGS: [&str; 2] = ["ordinal_asc", "score_desc_then_ordinal"];

/// One condition over a shallow record field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub op: String,
    pub value: serde_json::Value,
}

/// A group of conditions joined by "all" (AND) or "any" (OR)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRule {
    pub rule_id: String,
    pub logic: String,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSpec {
    pub metric_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleSelection {
    pub max_examples: usize,
    pub ordering: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalOutputs {
    pub metrics: Vec<MetricSpec>,
    /// Optional upper bound on the per-item score
    #[serde(default)]
    pub score_cap: Option<i64>,
    pub example_selection: ExampleSelection,
}

/// Versioned signal spec document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalSpec {
    pub schema: String,
    pub signal_id: String,
    pub version: String,
    #[serde(default)]
    pub required_input_fields: Vec<String>,
    pub inclusion_rules: Vec<SignalRule>,
    pub exclusion_rules: Vec<SignalRule>,
    pub outputs: SignalOutputs,
}

impl SignalSpec {
    pub fn from_json(name: &str, json: &str) -> Result<Self, DeriveError> {
        let spec: SignalSpec =
            serde_json::from_str(json).map_err(|source| DeriveError::SpecParse {
                name: name.to_string(),
                source,
            })?;
        spec.validate(name)?;
        Ok(spec)
    }

    pub fn validate(&self, name: &str) -> Result<(), DeriveError> {
        if self.schema != SIGNAL_SCHEMA {
            return Err(DeriveError::SchemaMismatch {
                name: name.to_string(),
                expected: SIGNAL_SCHEMA.to_string(),
                found: self.schema.clone(),
            });
        }
        for rule in self.inclusion_rules.iter().chain(&self.exclusion_rules) {
            if !matches!(rule.logic.as_str(), "all" | "any") {
                return Err(DeriveError::UnknownLogic {
                    logic: rule.logic.clone(),
                    rule_id: rule.rule_id.clone(),
                });
            }
            for cond in &rule.conditions {
                let op = Op::parse(&cond.op, &rule.rule_id)?;
                if op == Op::RegexAny {
                    for pattern in pattern_list(&cond.value) {
                        regex::RegexBuilder::new(&pattern)
                            .case_insensitive(true)
                            .build()
                            .map_err(|_| DeriveError::InvalidPattern {
                                pattern: pattern.clone(),
                                rule_id: rule.rule_id.clone(),
                            })?;
                    }
                }
            }
        }
        for metric in &self.outputs.metrics {
            if !KNOWN_METRIC_SUFFIXES
                .iter()
                .any(|s| metric.metric_id.ends_with(s))
            {
                return Err(DeriveError::UnknownMetric(metric.metric_id.clone()));
            }
        }
        let ordering = &self.outputs.example_selection.ordering;
        if !KNOWN_ORDERINGS.contains(&ordering.as_str()) {
            return Err(DeriveError::UnknownOrdering(ordering.clone()));
        }
        Ok(())
    }
}

fn pattern_list(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::String(s) => vec![s.clone()],
        serde_json::Value::Array(arr) => arr
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}
