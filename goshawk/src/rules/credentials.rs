//! Hardcoded-credential heuristics (G101).

use crate::ast::{BinOp, LitKind, Node, NodeId, NodeKind};
use crate::config::ConfigStore;
use crate::entropy;
use crate::issue::{self, Confidence, Severity};
use crate::resolve;
use crate::rules::{Context, MatchResult, Rule};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

const ID: &str = "G101";
const DESCRIPTION: &str = "Potential hardcoded credentials";

fn default_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r"(?i)passwd|pass|password|pwd|secret|token|pswd|apikey|api_key|bearer|cred")
            .expect("credential name pattern")
    })
}

/// Flags string constants assigned to credential-named variables.
/// The entropy scorer gates severity: strings below the threshold are
/// still reported, at Low severity.
pub struct CredentialsRule {
    pattern: Regex,
    entropy_threshold: f64,
    per_char_threshold: f64,
    truncate: usize,
    ignore_entropy: bool,
}

impl CredentialsRule {
    /// Creates the rule, honouring per-rule configuration under `G101`:
    /// `pattern`, `entropy_threshold`, `per_char_threshold`, `truncate`,
    /// `ignore_entropy`.
    #[must_use]
    pub fn new(config: &ConfigStore) -> Box<dyn Rule> {
        let mut rule = Self {
            pattern: default_pattern().clone(),
            entropy_threshold: 80.0,
            per_char_threshold: 3.0,
            truncate: 16,
            ignore_entropy: false,
        };
        if let Some(Value::Object(cfg)) = config.get(ID) {
            if let Some(Value::String(p)) = cfg.get("pattern") {
                if let Ok(re) = Regex::new(p) {
                    rule.pattern = re;
                }
            }
            if let Some(t) = cfg.get("entropy_threshold").and_then(Value::as_f64) {
                rule.entropy_threshold = t;
            }
            if let Some(t) = cfg.get("per_char_threshold").and_then(Value::as_f64) {
                rule.per_char_threshold = t;
            }
            if let Some(t) = cfg.get("truncate").and_then(Value::as_u64) {
                rule.truncate = t as usize;
            }
            if let Some(b) = cfg.get("ignore_entropy").and_then(Value::as_bool) {
                rule.ignore_entropy = b;
            }
        }
        Box::new(rule)
    }

    fn severity_for(&self, secret: &str) -> Severity {
        if self.ignore_entropy {
            return Severity::High;
        }
        let truncated: String = secret.chars().take(self.truncate).collect();
        let bits = entropy::estimate(&truncated);
        let strong = bits >= self.entropy_threshold
            || entropy::per_char(&truncated) >= self.per_char_threshold;
        if strong {
            Severity::High
        } else {
            Severity::Low
        }
    }

    fn check_pair(&self, ctx: &Context<'_>, lhs: NodeId, rhs: NodeId) -> Option<crate::issue::Issue> {
        let name = ctx.ast.ident_name(lhs)?;
        if !self.pattern.is_match(name) {
            return None;
        }
        let value = resolve::get_string(ctx, rhs).ok()?;
        if value.is_empty() {
            return None;
        }
        Some(issue::new_issue(
            ctx,
            lhs,
            ID,
            DESCRIPTION,
            self.severity_for(&value),
            Confidence::Low,
        ))
    }
}

impl Rule for CredentialsRule {
    fn id(&self) -> &'static str {
        ID
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::AssignStmt, NodeKind::ValueSpec, NodeKind::BinaryExpr]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        match ctx.ast.node(node) {
            Node::AssignStmt(assign) => {
                for (i, &lhs) in assign.lhs.iter().enumerate() {
                    let Some(&rhs) = assign.rhs.get(i) else {
                        continue;
                    };
                    if let Some(found) = self.check_pair(ctx, lhs, rhs) {
                        return Ok(Some(found));
                    }
                }
                Ok(None)
            }
            Node::ValueSpec(spec) => {
                for (i, &name) in spec.names.iter().enumerate() {
                    let Some(&value) = spec.values.get(i) else {
                        continue;
                    };
                    if let Some(found) = self.check_pair(ctx, name, value) {
                        return Ok(Some(found));
                    }
                }
                Ok(None)
            }
            // Comparisons against credential-named identifiers.
            Node::BinaryExpr(bin) if matches!(bin.op, BinOp::Eq | BinOp::Neq) => {
                let (ident, lit) = match (ctx.ast.node(bin.x), ctx.ast.node(bin.y)) {
                    (Node::Ident(_), Node::BasicLit(l)) if l.kind == LitKind::String => {
                        (bin.x, bin.y)
                    }
                    (Node::BasicLit(l), Node::Ident(_)) if l.kind == LitKind::String => {
                        (bin.y, bin.x)
                    }
                    _ => return Ok(None),
                };
                Ok(self.check_pair(ctx, ident, lit))
            }
            _ => Ok(None),
        }
    }
}
