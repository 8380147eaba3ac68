//! Process execution rules (G204).

use crate::ast::{Node, NodeId, NodeKind};
use crate::calls::CallList;
use crate::config::ConfigStore;
use crate::issue::{self, Confidence, Severity};
use crate::resolve;
use crate::rules::{Context, MatchResult, Rule};

/// Flags subprocesses launched with non-constant arguments (G204).
pub struct SubprocessRule {
    calls: CallList,
}

impl SubprocessRule {
    /// Creates the rule over the exec and syscall entry points.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        let mut calls = CallList::new();
        calls.add_all("os/exec", ["Command", "CommandContext"]);
        calls.add_all("syscall", ["Exec", "ForkExec", "StartProcess"]);
        calls.add("os", "StartProcess");
        Box::new(Self { calls })
    }
}

impl Rule for SubprocessRule {
    fn id(&self) -> &'static str {
        "G204"
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::CallExpr]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        let Some(matched) = self.calls.contains_call_expr(ctx, node) else {
            return Ok(None);
        };
        let Some(call) = ctx.ast.as_call(node) else {
            return Ok(None);
        };
        // CommandContext takes the context first.
        let skip = usize::from(matched.name == "CommandContext");
        for &arg in call.args.iter().skip(skip) {
            let dynamic = match ctx.ast.node(ctx.ast.unparen(arg)) {
                Node::Ident(_) | Node::BinaryExpr(_) | Node::CallExpr(_) => {
                    !resolve::try_resolve(ctx, arg)
                }
                _ => false,
            };
            if dynamic {
                return Ok(Some(issue::new_issue(
                    ctx,
                    node,
                    self.id(),
                    "Subprocess launched with a potential tainted input or cmd arguments",
                    Severity::Medium,
                    Confidence::High,
                )));
            }
        }
        Ok(None)
    }
}
