//! Shared rule operator table
//!
//! One small open table used by both the label rule engine and the signal
//! engine. An operator name that is not in the table is a hard failure at
//! spec load time, never a silent skip.

use crate::error::DeriveError;
use regex::RegexBuilder;
use serde_json::Value;

/// Rule operators, evaluated against a shallow field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Equals,
    In,
    Gte,
    Lte,
    RegexAny,
    ContainsAny,
}

impl Op {
    /// Resolve an operator name. Unknown names are fatal.
    pub fn parse(op: &str, rule_id: &str) -> Result<Op, DeriveError> {
        match op {
            "equals" => Ok(Op::Equals),
            "in" => Ok(Op::In),
            "gte" => Ok(Op::Gte),
            "lte" => Ok(Op::Lte),
            "regex_any" => Ok(Op::RegexAny),
            "contains_any" => Ok(Op::ContainsAny),
            other => Err(DeriveError::UnknownOperator {
                op: other.to_string(),
                rule_id: rule_id.to_string(),
            }),
        }
    }

    /// Evaluate this operator against a field value and a configured target.
    ///
    /// A value of the wrong type fails the condition rather than the run;
    /// only malformed rule configuration (an invalid regex) is an error.
    pub fn eval(&self, rule_id: &str, value: &Value, target: &Value) -> Result<bool, DeriveError> {
        match self {
            Op::Equals => Ok(value == target),
            Op::In => Ok(target
                .as_array()
                .map(|arr| arr.contains(value))
                .unwrap_or(false)),
            Op::Gte => Ok(match (as_f64(value), as_f64(target)) {
                (Some(v), Some(t)) => v >= t,
                _ => false,
            }),
            Op::Lte => Ok(match (as_f64(value), as_f64(target)) {
                (Some(v), Some(t)) => v <= t,
                _ => false,
            }),
            Op::RegexAny => {
                let subject = match value.as_str() {
                    Some(s) => s,
                    None => return Ok(false),
                };
                for pattern in str_list(target) {
                    let re = RegexBuilder::new(&pattern)
                        .case_insensitive(true)
                        .build()
                        .map_err(|_| DeriveError::InvalidPattern {
                            pattern: pattern.clone(),
                            rule_id: rule_id.to_string(),
                        })?;
                    if re.is_match(subject) {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Op::ContainsAny => {
                let subject = match value.as_str() {
                    Some(s) => s,
                    None => return Ok(false),
                };
                Ok(contains_any(subject, &str_list(target)))
            }
        }
    }
}

/// Case-folded substring match against any needle
pub fn contains_any(haystack: &str, needles: &[String]) -> bool {
    let low = haystack.to_lowercase();
    needles
        .iter()
        .any(|n| !n.is_empty() && low.contains(&n.to_lowercase()))
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Accept a single string or a list of strings as the target
fn str_list(target: &Value) -> Vec<String> {
    match target {
        Value::String(s) => vec![s.clone()],
        Value::Array(arr) => arr
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_known_ops() {
        assert_eq!(Op::parse("contains_any", "r").unwrap(), Op::ContainsAny);
        assert_eq!(Op::parse("regex_any", "r").unwrap(), Op::RegexAny);
        assert_eq!(Op::parse("gte", "r").unwrap(), Op::Gte);
    }

    #[test]
    fn test_parse_unknown_op_is_fatal() {
        let err = Op::parse("fuzzy_match", "r9").unwrap_err();
        assert!(err.to_string().contains("fuzzy_match"));
        assert!(err.to_string().contains("r9"));
    }

    #[test]
    fn test_contains_any_case_folded() {
        let v = json!("This Is A FACT, not an opinion");
        let t = json!(["fact"]);
        assert!(Op::ContainsAny.eval("r", &v, &t).unwrap());

        let t = json!(["rumor"]);
        assert!(!Op::ContainsAny.eval("r", &v, &t).unwrap());
    }

    #[test]
    fn test_numeric_comparisons() {
        assert!(Op::Gte.eval("r", &json!(5), &json!(5)).unwrap());
        assert!(Op::Lte.eval("r", &json!(4), &json!(5)).unwrap());
        assert!(!Op::Gte.eval("r", &json!(4.5), &json!(5)).unwrap());
        // wrong type fails the condition, not the run
        assert!(!Op::Gte.eval("r", &json!("abc"), &json!(5)).unwrap());
    }

    #[test]
    fn test_in_membership() {
        assert!(Op::In.eval("r", &json!("a"), &json!(["a", "b"])).unwrap());
        assert!(!Op::In.eval("r", &json!("c"), &json!(["a", "b"])).unwrap());
        assert!(!Op::In.eval("r", &json!("a"), &json!("a")).unwrap());
    }

    #[test]
    fn test_regex_any() {
        let v = json!("Body Battery at 80%");
        assert!(Op::RegexAny.eval("r", &v, &json!([r"\d+%"])).unwrap());
        assert!(!Op::RegexAny.eval("r", &v, &json!([r"^\d+$"])).unwrap());
    }

    #[test]
    fn test_regex_invalid_pattern_is_fatal() {
        let err = Op::RegexAny
            .eval("r3", &json!("x"), &json!(["["]))
            .unwrap_err();
        assert!(err.to_string().contains("r3"));
    }

    #[test]
    fn test_equals() {
        assert!(Op::Equals.eval("r", &json!(true), &json!(true)).unwrap());
        assert!(!Op::Equals.eval("r", &json!(true), &json!(false)).unwrap());
    }
}
