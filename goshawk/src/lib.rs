//! Core library of the goshawk security analyzer.
//!
//! Given type-checked Go packages from an external frontend, the engine
//! walks every file, dispatches syntax nodes to pattern-matching rules,
//! honours in-source suppression directives, and runs SSA-based taint
//! analysis — producing issues tagged with rule id, CWE, severity, and
//! confidence.

// Intentional design trade-offs shared across the crate.
#![allow(
    clippy::type_complexity,
    clippy::too_many_arguments,
    clippy::similar_names,
    clippy::map_unwrap_or
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Arena-backed syntax tree for the analyzed language.
pub mod ast;
/// Process-wide memoisation cache.
pub mod cache;
/// Call-expression matching against qualified name sets.
pub mod calls;
/// Scan configuration store.
pub mod config;
/// Rule-id to CWE mapping.
pub mod cwe;
/// The scanning engine.
pub mod engine;
/// Entropy estimation for credential detection.
pub mod entropy;
/// Contract with the external type-checking frontend.
pub mod frontend;
/// Per-file import bookkeeping.
pub mod imports;
/// The issue model and builder.
pub mod issue;
/// Suppression directive parsing.
pub mod nosec;
/// Issue-stream serialisation contract.
pub mod reporter;
/// Constant folding and call-target resolution helpers.
pub mod resolve;
/// The rule framework and the shipped rule library.
pub mod rules;
/// SSA-based taint analysis.
pub mod taint;
/// Builders for tests.
pub mod testutil;

pub use engine::{Metrics, ScanEngine, ScanError};
pub use issue::{Confidence, Issue, Severity};
