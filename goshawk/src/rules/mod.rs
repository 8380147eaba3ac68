//! The rule framework: per-file [`Context`], the [`Rule`] contract, the
//! kind-indexed [`RuleSet`], and the registry of shipped rules.

use crate::ast::{Ast, NodeId, NodeKind};
use crate::config::ConfigStore;
use crate::frontend::{LangVersion, TypeInfo, TypedFile};
use crate::imports::ImportTracker;
use crate::issue::Issue;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use thiserror::Error;

/// Credential and secret heuristics.
pub mod credentials;
/// Weak cryptography rules.
pub mod crypto;
/// Unhandled-error rules.
pub mod errors;
/// Command and process execution rules.
pub mod exec;
/// File and directory permission rules.
pub mod filesystem;
/// Import blocklist rules.
pub mod imports;
/// SQL and template injection rules.
pub mod injection;
/// Miscellaneous rules (aliasing, conversions, decompression).
pub mod misc;
/// Network, TLS, and HTTP hardening rules.
pub mod network;
/// The rule registry.
pub mod registry;

/// Everything a rule may observe about the file being walked.
///
/// Created when the engine starts a file, dropped when the file ends,
/// never shared across threads.
pub struct Context<'a> {
    /// The package's node arena.
    pub ast: &'a Ast,
    /// Type-checker output for the package.
    pub info: &'a TypeInfo,
    /// The file being walked.
    pub file: &'a TypedFile,
    /// Canonical path of the enclosing package.
    pub pkg_path: &'a str,
    /// Name of the enclosing package.
    pub pkg_name: &'a str,
    /// Imports of this file.
    pub imports: ImportTracker,
    /// Scan configuration.
    pub config: &'a ConfigStore,
    /// Toolchain language version, for version-gated rules.
    pub lang_version: LangVersion,
    /// Scratch values threaded through the walk: seeded by the driver,
    /// read and written by rules that track state across statements.
    pub passed_values: FxHashMap<String, String>,
}

/// A recoverable failure inside a rule's `match`. Logged, never fatal.
#[derive(Debug, Error)]
#[error("rule {rule_id}: {message}")]
pub struct RuleError {
    /// The failing rule.
    pub rule_id: String,
    /// What went wrong.
    pub message: String,
}

impl RuleError {
    /// Creates a rule error.
    #[must_use]
    pub fn new(rule_id: &str, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_owned(),
            message: message.into(),
        }
    }
}

/// Outcome of matching one rule against one node.
pub type MatchResult = Result<Option<Issue>, RuleError>;

/// A single analysis rule.
///
/// A rule's node kinds never change after registration. `matches`
/// receives the context mutably only for `passed_values`; everything
/// else it observes without mutating. Rules may also keep private state
/// across nodes (`&mut self`).
pub trait Rule: Send {
    /// The rule's stable identifier (`G101`, ...).
    fn id(&self) -> &'static str;

    /// The node kinds this rule wants to see.
    fn node_kinds(&self) -> &[NodeKind];

    /// Inspects `node`, returning an issue, nothing, or an error.
    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult;
}

/// Rules indexed by the node kinds they registered for, plus the set of
/// externally suppressed rule ids.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
    by_kind: FxHashMap<NodeKind, SmallVec<[usize; 8]>>,
    suppressed: FxHashSet<String>,
}

impl RuleSet {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `rule` under every kind it declares. When `suppressed`
    /// is set the rule still runs but its issues carry external
    /// suppression metadata.
    pub fn register(&mut self, rule: Box<dyn Rule>, suppressed: bool) {
        if suppressed {
            self.suppressed.insert(rule.id().to_owned());
        }
        let idx = self.rules.len();
        for &kind in rule.node_kinds() {
            self.by_kind.entry(kind).or_default().push(idx);
        }
        self.rules.push(rule);
    }

    /// Indices of the rules registered for `kind`.
    #[must_use]
    pub fn registered_for(&self, kind: NodeKind) -> &[usize] {
        self.by_kind.get(&kind).map_or(&[], |v| v.as_slice())
    }

    /// Whether issues of `id` are externally suppressed.
    #[must_use]
    pub fn is_rule_suppressed(&self, id: &str) -> bool {
        self.suppressed.contains(id)
    }

    /// Mutable access to a registered rule, for dispatch.
    pub(crate) fn rule_mut(&mut self, idx: usize) -> &mut Box<dyn Rule> {
        &mut self.rules[idx]
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Ids of every registered rule.
    #[must_use]
    pub fn ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }
}
