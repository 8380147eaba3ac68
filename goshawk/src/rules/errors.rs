//! Unhandled-error rules (G104).

use crate::ast::{Node, NodeId, NodeKind};
use crate::config::{ConfigStore, GlobalOption};
use crate::frontend::Object;
use crate::issue::{self, Confidence, Severity};
use crate::resolve;
use crate::rules::{Context, MatchResult, Rule};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;

const ID: &str = "G104";

/// Flags calls whose `error` result is discarded (G104).
///
/// The allow-list of acceptable callees is configurable under the rule
/// id; the `audit` global disables it entirely.
pub struct UnhandledErrorRule {
    allowlist: FxHashMap<String, FxHashSet<String>>,
    audit: bool,
}

impl UnhandledErrorRule {
    /// Creates the rule, merging configured allow-list entries into the
    /// defaults.
    #[must_use]
    pub fn new(config: &ConfigStore) -> Box<dyn Rule> {
        let mut allowlist: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();
        let defaults: [(&str, &[&str]); 3] = [
            (
                "fmt",
                &["Print", "Printf", "Println", "Fprint", "Fprintf", "Fprintln"],
            ),
            ("strings.Builder", &["WriteString", "WriteRune", "WriteByte", "Write"]),
            ("bytes.Buffer", &["WriteString", "WriteRune", "WriteByte", "Write"]),
        ];
        for (pkg, names) in defaults {
            allowlist
                .entry(pkg.to_owned())
                .or_default()
                .extend(names.iter().map(|n| (*n).to_owned()));
        }
        if let Some(Value::Object(cfg)) = config.get(ID) {
            for (pkg, names) in cfg {
                if let Value::Array(list) = names {
                    let entry = allowlist.entry(pkg.clone()).or_default();
                    for name in list.iter().filter_map(Value::as_str) {
                        entry.insert(name.to_owned());
                    }
                }
            }
        }
        Box::new(Self {
            allowlist,
            audit: config.is_global_enabled(GlobalOption::Audit),
        })
    }

    fn is_allowed(&self, ctx: &Context<'_>, call: NodeId) -> bool {
        if self.audit {
            return false;
        }
        let Some((qualifier, name)) = resolve::get_call_info(ctx, call) else {
            return false;
        };
        let bare = qualifier.trim_start_matches('*');
        self.allowlist
            .get(bare)
            .is_some_and(|names| names.contains(&name))
    }

    /// Whether the callee's signature declares an `error` result, and at
    /// which positions.
    fn error_positions(&self, ctx: &Context<'_>, call: NodeId) -> Vec<usize> {
        match resolve::get_call_object(ctx, call) {
            Some(Object::Func { sig, .. }) => sig
                .results
                .iter()
                .enumerate()
                .filter(|(_, ty)| ty.is_error())
                .map(|(i, _)| i)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn report(&self, ctx: &Context<'_>, node: NodeId) -> MatchResult {
        Ok(Some(issue::new_issue(
            ctx,
            node,
            ID,
            "Errors unhandled",
            Severity::Low,
            Confidence::High,
        )))
    }
}

impl Rule for UnhandledErrorRule {
    fn id(&self) -> &'static str {
        ID
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::ExprStmt, NodeKind::AssignStmt]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        match ctx.ast.node(node) {
            Node::ExprStmt(stmt) => {
                let call = ctx.ast.unparen(stmt.x);
                if ctx.ast.as_call(call).is_none() {
                    return Ok(None);
                }
                if self.error_positions(ctx, call).is_empty() || self.is_allowed(ctx, call) {
                    return Ok(None);
                }
                self.report(ctx, node)
            }
            Node::AssignStmt(assign) => {
                if assign.rhs.len() != 1 {
                    return Ok(None);
                }
                let call = ctx.ast.unparen(assign.rhs[0]);
                if ctx.ast.as_call(call).is_none() {
                    return Ok(None);
                }
                let positions = self.error_positions(ctx, call);
                if positions.is_empty() || self.is_allowed(ctx, call) {
                    return Ok(None);
                }
                let discards_error = positions.iter().any(|&i| {
                    assign
                        .lhs
                        .get(i)
                        .and_then(|&l| ctx.ast.ident_name(l))
                        .is_some_and(|name| name == "_")
                });
                if discards_error {
                    self.report(ctx, node)
                } else {
                    Ok(None)
                }
            }
            _ => Ok(None),
        }
    }
}
