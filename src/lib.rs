//! Claimsift - Deterministic derivation of claims and behavior windows
//! from captured social-media text
//!
//! Claimsift transforms a JSONL capture of short text records into
//! auditable artifacts through a deterministic pipeline: normalization →
//! topic labeling → tone labeling → claim extraction → behavior windows →
//! cross-reference linking, plus a standalone signal runner over the
//! normalized corpus.
//!
//! ## Modules
//!
//! - **Derivation Pipeline**: Normalize records and derive labels, claims,
//!   windows, links, and the run manifest
//! - **Signal Runner**: Evaluate a versioned signal spec into a
//!   self-describing report

pub mod claims;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod linker;
pub mod manifest;
pub mod normalizer;
pub mod ops;
pub mod pipeline;
pub mod schema;
pub mod signals;
pub mod types;
pub mod windows;

pub use error::DeriveError;
pub use pipeline::{run, DeriveConfig, RunOutput};

// Schema exports
pub use schema::{RuleSetSpec, SignalSpec, RULESET_SCHEMA, SIGNAL_SCHEMA};

// Signal exports
pub use signals::run_signal;

/// Claimsift version embedded in run manifests
pub const SIFT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for derived artifacts
pub const PRODUCER_NAME: &str = "claimsift";
