//! Filesystem rules (G301, G302, G303, G304, G306).

use crate::ast::{Node, NodeId, NodeKind};
use crate::calls::CallList;
use crate::config::ConfigStore;
use crate::issue::{self, Confidence, Severity};
use crate::resolve;
use crate::rules::{Context, MatchResult, Rule};
use serde_json::Value;

/// Reads a permission-bits override from per-rule configuration; the
/// value may be a number or an octal literal string.
fn configured_mode(config: &ConfigStore, rule_id: &str, default: i64) -> i64 {
    match config.get(rule_id) {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(default),
        Some(Value::String(s)) => resolve::parse_int_literal(s).unwrap_or(default),
        _ => default,
    }
}

/// A permission check on one argument of a call set. Shared shape of
/// G301, G302, and G306.
struct PermCheck {
    id: &'static str,
    calls: CallList,
    /// (function name, permission argument index) pairs.
    arg_index: fn(&str) -> usize,
    max_mode: i64,
    what: &'static str,
}

impl PermCheck {
    fn check(&self, node: NodeId, ctx: &Context<'_>) -> MatchResult {
        if self.calls.contains_call_expr(ctx, node).is_none() {
            return Ok(None);
        }
        let Some(call) = ctx.ast.as_call(node) else {
            return Ok(None);
        };
        let Some((_, name)) = resolve::get_call_info(ctx, node) else {
            return Ok(None);
        };
        let Some(&mode_arg) = call.args.get((self.arg_index)(&name)) else {
            return Ok(None);
        };
        // Only a concrete constant can prove the mode too wide.
        match resolve::get_int(ctx, mode_arg) {
            Ok(mode) if mode > self.max_mode => Ok(Some(issue::new_issue(
                ctx,
                node,
                self.id,
                &format!(
                    "Expect {} permissions to be {:#o} or less",
                    self.what, self.max_mode
                ),
                Severity::Medium,
                Confidence::High,
            ))),
            _ => Ok(None),
        }
    }
}

/// Flags directory creation with wide permissions (G301).
pub struct MkdirPermRule {
    check: PermCheck,
}

impl MkdirPermRule {
    /// Creates the rule; the 0750 ceiling is configurable under `G301`.
    #[must_use]
    pub fn new(config: &ConfigStore) -> Box<dyn Rule> {
        let mut calls = CallList::new();
        calls.add_all("os", ["Mkdir", "MkdirAll"]);
        Box::new(Self {
            check: PermCheck {
                id: "G301",
                calls,
                arg_index: |_| 1,
                max_mode: configured_mode(config, "G301", 0o750),
                what: "directory",
            },
        })
    }
}

impl Rule for MkdirPermRule {
    fn id(&self) -> &'static str {
        "G301"
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::CallExpr]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        self.check.check(node, ctx)
    }
}

/// Flags chmod and open calls with wide permissions (G302).
pub struct ChmodPermRule {
    check: PermCheck,
}

impl ChmodPermRule {
    /// Creates the rule; the 0600 ceiling is configurable under `G302`.
    #[must_use]
    pub fn new(config: &ConfigStore) -> Box<dyn Rule> {
        let mut calls = CallList::new();
        calls.add_all("os", ["Chmod", "OpenFile"]);
        Box::new(Self {
            check: PermCheck {
                id: "G302",
                calls,
                arg_index: |name| if name == "OpenFile" { 2 } else { 1 },
                max_mode: configured_mode(config, "G302", 0o600),
                what: "file",
            },
        })
    }
}

impl Rule for ChmodPermRule {
    fn id(&self) -> &'static str {
        "G302"
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::CallExpr]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        self.check.check(node, ctx)
    }
}

/// Flags file writes with wide permissions (G306).
pub struct WriteFilePermRule {
    check: PermCheck,
}

impl WriteFilePermRule {
    /// Creates the rule; the 0600 ceiling is configurable under `G306`.
    #[must_use]
    pub fn new(config: &ConfigStore) -> Box<dyn Rule> {
        let mut calls = CallList::new();
        calls.add("os", "WriteFile");
        calls.add("io/ioutil", "WriteFile");
        Box::new(Self {
            check: PermCheck {
                id: "G306",
                calls,
                arg_index: |_| 2,
                max_mode: configured_mode(config, "G306", 0o600),
                what: "WriteFile",
            },
        })
    }
}

impl Rule for WriteFilePermRule {
    fn id(&self) -> &'static str {
        "G306"
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::CallExpr]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        self.check.check(node, ctx)
    }
}

/// Flags file creation under predictable shared temp paths (G303).
pub struct SharedTmpRule {
    calls: CallList,
}

impl SharedTmpRule {
    /// Creates the rule.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        let mut calls = CallList::new();
        calls.add_all("os", ["Create", "WriteFile", "OpenFile"]);
        calls.add("io/ioutil", "WriteFile");
        Box::new(Self { calls })
    }
}

impl Rule for SharedTmpRule {
    fn id(&self) -> &'static str {
        "G303"
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::CallExpr]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        if self.calls.contains_call_expr(ctx, node).is_none() {
            return Ok(None);
        }
        let Some(call) = ctx.ast.as_call(node) else {
            return Ok(None);
        };
        let Some(&path_arg) = call.args.first() else {
            return Ok(None);
        };
        let Ok(path) = resolve::get_string(ctx, path_arg) else {
            return Ok(None);
        };
        let shared = path.starts_with("/tmp/")
            || path.starts_with("/var/tmp/")
            || path.starts_with("/usr/tmp/");
        if shared {
            return Ok(Some(issue::new_issue(
                ctx,
                node,
                self.id(),
                "File creation in shared tmp directory without using os.CreateTemp",
                Severity::Medium,
                Confidence::High,
            )));
        }
        Ok(None)
    }
}

/// Flags file access through non-constant paths (G304).
pub struct TaintedPathRule {
    calls: CallList,
}

impl TaintedPathRule {
    /// Creates the rule.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        let mut calls = CallList::new();
        calls.add_all("os", ["Open", "OpenFile", "Create", "ReadFile"]);
        calls.add_all("io/ioutil", ["ReadFile", "WriteFile"]);
        Box::new(Self { calls })
    }
}

impl Rule for TaintedPathRule {
    fn id(&self) -> &'static str {
        "G304"
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::CallExpr]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        if self.calls.contains_call_expr(ctx, node).is_none() {
            return Ok(None);
        }
        let Some(call) = ctx.ast.as_call(node) else {
            return Ok(None);
        };
        let Some(&path_arg) = call.args.first() else {
            return Ok(None);
        };
        let dynamic = match ctx.ast.node(ctx.ast.unparen(path_arg)) {
            Node::Ident(_) | Node::BinaryExpr(_) | Node::CallExpr(_) => {
                !resolve::try_resolve(ctx, path_arg)
            }
            _ => false,
        };
        if dynamic {
            return Ok(Some(issue::new_issue(
                ctx,
                node,
                self.id(),
                "Potential file inclusion via variable",
                Severity::Medium,
                Confidence::High,
            )));
        }
        Ok(None)
    }
}
