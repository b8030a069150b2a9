//! Versioned external document schemas
//!
//! Claimsift accepts exactly one schema version per document; a mismatch is
//! fatal. There is deliberately no shape-sniffing of historical variants.

pub mod ruleset;
pub mod signal;

pub use ruleset::{ConfidenceBand, Rule, RuleSetSpec, RULESET_SCHEMA};
pub use signal::{Condition, SignalRule, SignalSpec, SIGNAL_SCHEMA};
