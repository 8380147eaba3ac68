//! SQL and template injection rules (G201, G202, G203).

use crate::ast::{BinOp, Node, NodeId, NodeKind};
use crate::calls::CallList;
use crate::config::ConfigStore;
use crate::issue::{self, Confidence, Severity};
use crate::resolve;
use crate::rules::{Context, MatchResult, Rule};
use regex::Regex;
use std::sync::OnceLock;

fn sql_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r"(?i)(SELECT|DELETE|INSERT|UPDATE|INTO|FROM|WHERE)\b")
            .expect("sql keyword pattern")
    })
}

fn query_sinks() -> CallList {
    let mut calls = CallList::new();
    let methods = [
        "Query",
        "QueryContext",
        "QueryRow",
        "QueryRowContext",
        "Exec",
        "ExecContext",
        "Prepare",
        "PrepareContext",
    ];
    calls.add_all("*database/sql.DB", methods);
    calls.add_all("*database/sql.Tx", methods);
    calls
}

/// The query argument position: the `Context` variants take the context
/// first.
fn query_arg_index(method: &str) -> usize {
    usize::from(method.ends_with("Context"))
}

/// Flags SQL built through format strings with dynamic arguments (G201).
pub struct SqlFormatRule {
    sinks: CallList,
}

impl SqlFormatRule {
    /// Creates the rule.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        Box::new(Self {
            sinks: query_sinks(),
        })
    }

    /// Whether the expression is a `fmt.Sprintf` building a SQL string
    /// from non-constant parts.
    fn is_tainted_format(&self, ctx: &Context<'_>, node: NodeId) -> bool {
        let target = match ctx.ast.node(ctx.ast.unparen(node)) {
            Node::CallExpr(_) => ctx.ast.unparen(node),
            Node::Ident(_) => match resolve::ident_decl_rhs(ctx, ctx.ast.unparen(node)) {
                Some(rhs) if ctx.ast.as_call(ctx.ast.unparen(rhs)).is_some() => {
                    ctx.ast.unparen(rhs)
                }
                _ => return false,
            },
            _ => return false,
        };
        let Some((pkg, name)) = resolve::get_call_info(ctx, target) else {
            return false;
        };
        if pkg != "fmt" || name != "Sprintf" {
            return false;
        }
        let Some(call) = ctx.ast.as_call(target) else {
            return false;
        };
        let Some(&format_arg) = call.args.first() else {
            return false;
        };
        let Ok(format) = resolve::get_string(ctx, format_arg) else {
            return false;
        };
        if !sql_re().is_match(&format) {
            return false;
        }
        call.args
            .iter()
            .skip(1)
            .any(|&arg| !resolve::try_resolve(ctx, arg))
    }
}

impl Rule for SqlFormatRule {
    fn id(&self) -> &'static str {
        "G201"
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::CallExpr]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        let Some(matched) = self.sinks.contains_call_expr(ctx, node) else {
            return Ok(None);
        };
        let Some(call) = ctx.ast.as_call(node) else {
            return Ok(None);
        };
        let Some(&query) = call.args.get(query_arg_index(&matched.name)) else {
            return Ok(None);
        };
        if self.is_tainted_format(ctx, query) {
            return Ok(Some(issue::new_issue(
                ctx,
                node,
                self.id(),
                "SQL string formatting with variable data",
                Severity::Medium,
                Confidence::High,
            )));
        }
        Ok(None)
    }
}

/// What a tracked identifier currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConcatMark {
    /// A constant string that looks like SQL.
    Sql,
    /// A SQL string concatenated with variable data.
    Tainted,
}

/// `passed_values` key for a tracked query identifier.
fn concat_key(name: &str) -> String {
    format!("G202:{name}")
}

const MARK_SQL: &str = "sql";
const MARK_TAINTED: &str = "tainted";

/// Flags SQL built through string concatenation with variables (G202).
///
/// Assignments that build query strings are remembered in the context's
/// `passed_values`, so a query grown across several statements is still
/// tainted when it finally reaches a sink.
pub struct SqlConcatRule {
    sinks: CallList,
}

impl SqlConcatRule {
    /// Creates the rule.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        Box::new(Self {
            sinks: query_sinks(),
        })
    }

    /// The mark previously recorded for an identifier, if any.
    fn recorded_mark(ctx: &Context<'_>, name: &str) -> Option<ConcatMark> {
        match ctx.passed_values.get(&concat_key(name)).map(String::as_str) {
            Some(MARK_TAINTED) => Some(ConcatMark::Tainted),
            Some(MARK_SQL) => Some(ConcatMark::Sql),
            _ => None,
        }
    }

    /// Classifies an expression as a SQL constant, a tainted
    /// concatenation, or neither. A recorded mark on an identifier wins
    /// over its declaration site: only the mark sees reassignments.
    fn classify(ctx: &Context<'_>, node: NodeId) -> Option<ConcatMark> {
        let node = ctx.ast.unparen(node);
        match ctx.ast.node(node) {
            Node::Ident(ident) => {
                if let Some(mark) = Self::recorded_mark(ctx, &ident.name) {
                    return Some(mark);
                }
                let text = resolve::get_string(ctx, node).ok()?;
                sql_re().is_match(&text).then_some(ConcatMark::Sql)
            }
            Node::BinaryExpr(bin) if bin.op == BinOp::Add => {
                let mut acc = LeafAcc::default();
                Self::scan_leaves(ctx, node, &mut acc);
                if acc.tainted || (acc.sql && acc.var) {
                    Some(ConcatMark::Tainted)
                } else if acc.sql {
                    Some(ConcatMark::Sql)
                } else {
                    None
                }
            }
            _ => {
                let text = resolve::get_string(ctx, node).ok()?;
                sql_re().is_match(&text).then_some(ConcatMark::Sql)
            }
        }
    }

    fn scan_leaves(ctx: &Context<'_>, node: NodeId, acc: &mut LeafAcc) {
        let node = ctx.ast.unparen(node);
        match ctx.ast.node(node) {
            Node::BinaryExpr(bin) if bin.op == BinOp::Add => {
                Self::scan_leaves(ctx, bin.x, acc);
                Self::scan_leaves(ctx, bin.y, acc);
            }
            Node::Ident(ident) => match Self::recorded_mark(ctx, &ident.name) {
                Some(ConcatMark::Tainted) => acc.tainted = true,
                Some(ConcatMark::Sql) => acc.sql = true,
                None => {
                    if let Ok(text) = resolve::get_string(ctx, node) {
                        acc.sql |= sql_re().is_match(&text);
                    } else {
                        acc.var = true;
                    }
                }
            },
            _ => {
                if let Ok(text) = resolve::get_string(ctx, node) {
                    acc.sql |= sql_re().is_match(&text);
                } else {
                    acc.var = true;
                }
            }
        }
    }

    /// Records the marks produced by one assignment or value spec.
    fn track_pairs(ctx: &mut Context<'_>, pairs: &[(String, NodeId)]) {
        for (name, rhs) in pairs {
            match Self::classify(ctx, *rhs) {
                Some(ConcatMark::Tainted) => {
                    ctx.passed_values
                        .insert(concat_key(name), MARK_TAINTED.to_owned());
                }
                Some(ConcatMark::Sql) => {
                    ctx.passed_values
                        .insert(concat_key(name), MARK_SQL.to_owned());
                }
                // Reassigned to something unrelated: forget the mark.
                None => {
                    ctx.passed_values.remove(&concat_key(name));
                }
            }
        }
    }
}

#[derive(Default)]
struct LeafAcc {
    sql: bool,
    var: bool,
    tainted: bool,
}

impl Rule for SqlConcatRule {
    fn id(&self) -> &'static str {
        "G202"
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::AssignStmt, NodeKind::ValueSpec, NodeKind::CallExpr]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        let ast = ctx.ast;
        match ast.node(node) {
            Node::AssignStmt(assign) => {
                let pairs: Vec<(String, NodeId)> = assign
                    .lhs
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &lhs)| {
                        let name = ast.ident_name(lhs)?;
                        let rhs = assign.rhs.get(i)?;
                        Some((name.to_owned(), *rhs))
                    })
                    .collect();
                Self::track_pairs(ctx, &pairs);
                Ok(None)
            }
            Node::ValueSpec(spec) => {
                let pairs: Vec<(String, NodeId)> = spec
                    .names
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &lhs)| {
                        let name = ast.ident_name(lhs)?;
                        let value = spec.values.get(i)?;
                        Some((name.to_owned(), *value))
                    })
                    .collect();
                Self::track_pairs(ctx, &pairs);
                Ok(None)
            }
            Node::CallExpr(_) => {
                let Some(matched) = self.sinks.contains_call_expr(ctx, node) else {
                    return Ok(None);
                };
                let Some(call) = ast.as_call(node) else {
                    return Ok(None);
                };
                let Some(&query) = call.args.get(query_arg_index(&matched.name)) else {
                    return Ok(None);
                };
                if Self::classify(ctx, query) == Some(ConcatMark::Tainted) {
                    return Ok(Some(issue::new_issue(
                        ctx,
                        node,
                        self.id(),
                        "SQL string concatenation with variable data",
                        Severity::Medium,
                        Confidence::High,
                    )));
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

/// Flags template-escape bypass conversions of dynamic data (G203).
pub struct TemplateEscapeRule {
    conversions: CallList,
}

impl TemplateEscapeRule {
    /// Creates the rule over the `html/template` trusted-type
    /// conversions.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        let mut conversions = CallList::new();
        conversions.add_all(
            "html/template",
            ["HTML", "HTMLAttr", "JS", "JSStr", "URL", "Srcset"],
        );
        Box::new(Self { conversions })
    }
}

impl Rule for TemplateEscapeRule {
    fn id(&self) -> &'static str {
        "G203"
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::CallExpr]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        let Some(matched) = self.conversions.contains_call_expr(ctx, node) else {
            return Ok(None);
        };
        let Some(call) = ctx.ast.as_call(node) else {
            return Ok(None);
        };
        let Some(&arg) = call.args.first() else {
            return Ok(None);
        };
        if resolve::try_resolve(ctx, arg) {
            return Ok(None);
        }
        Ok(Some(issue::new_issue(
            ctx,
            node,
            self.id(),
            &format!(
                "The used method template.{} does not auto-escape and is vulnerable to XSS",
                matched.name
            ),
            Severity::Medium,
            Confidence::Low,
        )))
    }
}
