//! Miscellaneous rules: unsafe usage (G103), lossy integer conversion
//! (G109), decompression bombs (G110), and range-value aliasing (G601).

use crate::ast::{Node, NodeId, NodeKind, UnOp};
use crate::calls::CallList;
use crate::config::ConfigStore;
use crate::frontend::LangVersion;
use crate::issue::{self, Confidence, Severity};
use crate::resolve;
use crate::rules::{Context, MatchResult, Rule};

/// Flags any use of the `unsafe` pseudo-package (G103).
pub struct UnsafeUsageRule;

impl UnsafeUsageRule {
    /// Creates the rule.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        Box::new(Self)
    }
}

impl Rule for UnsafeUsageRule {
    fn id(&self) -> &'static str {
        "G103"
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::SelectorExpr, NodeKind::ImportSpec]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        let fires = match ctx.ast.node(node) {
            Node::SelectorExpr(sel) => {
                let local = ctx.imports.local_name("unsafe").unwrap_or("unsafe");
                ctx.ast.ident_name(ctx.ast.unparen(sel.x)) == Some(local)
                    && ctx.imports.is_imported("unsafe")
            }
            Node::ImportSpec(spec) => ctx
                .ast
                .as_lit(spec.path)
                .is_some_and(|lit| lit.value.trim_matches('"') == "unsafe"),
            _ => false,
        };
        if fires {
            return Ok(Some(issue::new_issue(
                ctx,
                node,
                self.id(),
                "Use of unsafe calls should be audited",
                Severity::Low,
                Confidence::High,
            )));
        }
        Ok(None)
    }
}

/// Flags narrowing conversions of parsed integers (G109, audit-only):
/// `int16`/`int32` of a `strconv.Atoi` result can overflow.
pub struct IntConversionRule;

impl IntConversionRule {
    /// Creates the rule.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        Box::new(Self)
    }
}

impl Rule for IntConversionRule {
    fn id(&self) -> &'static str {
        "G109"
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::CallExpr]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        let Some(call) = ctx.ast.as_call(node) else {
            return Ok(None);
        };
        let callee = ctx.ast.unparen(call.func);
        let Some(conv) = ctx.ast.ident_name(callee) else {
            return Ok(None);
        };
        if conv != "int16" && conv != "int32" {
            return Ok(None);
        }
        let Some(&arg) = call.args.first() else {
            return Ok(None);
        };
        let arg = ctx.ast.unparen(arg);
        if ctx.ast.ident_name(arg).is_none() {
            return Ok(None);
        }
        let Some(rhs) = resolve::ident_tuple_rhs(ctx, arg) else {
            return Ok(None);
        };
        match resolve::get_call_info(ctx, rhs) {
            Some((pkg, name)) if pkg == "strconv" && name == "Atoi" => {
                Ok(Some(issue::new_issue(
                    ctx,
                    node,
                    self.id(),
                    &format!("Potential integer overflow by {conv} conversion of strconv.Atoi result"),
                    Severity::Medium,
                    Confidence::Medium,
                )))
            }
            _ => Ok(None),
        }
    }
}

/// Flags unbounded copies from decompression readers (G110).
pub struct DecompressionBombRule {
    copies: CallList,
    readers: CallList,
}

impl DecompressionBombRule {
    /// Creates the rule.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        let mut copies = CallList::new();
        copies.add_all("io", ["Copy", "CopyBuffer"]);
        let mut readers = CallList::new();
        for pkg in [
            "compress/gzip",
            "compress/zlib",
            "compress/bzip2",
            "compress/flate",
            "compress/lzw",
        ] {
            readers.add_all(pkg, ["NewReader", "NewReaderDict", "NewReaderSize"]);
        }
        Box::new(Self { copies, readers })
    }

    /// Whether the copy source is a decompression reader, directly or
    /// through its defining assignment.
    fn is_decompression_source(&self, ctx: &Context<'_>, arg: NodeId) -> bool {
        let arg = ctx.ast.unparen(arg);
        let target = match ctx.ast.node(arg) {
            Node::CallExpr(_) => Some(arg),
            Node::Ident(_) => resolve::ident_tuple_rhs(ctx, arg)
                .or_else(|| resolve::ident_decl_rhs(ctx, arg)),
            _ => None,
        };
        let Some(target) = target else {
            return false;
        };
        self.readers.contains_call_expr(ctx, target).is_some()
    }
}

impl Rule for DecompressionBombRule {
    fn id(&self) -> &'static str {
        "G110"
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::CallExpr]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        let Some(matched) = self.copies.contains_call_expr(ctx, node) else {
            return Ok(None);
        };
        let Some(call) = ctx.ast.as_call(node) else {
            return Ok(None);
        };
        // io.Copy(dst, src) / io.CopyBuffer(dst, src, buf).
        let src_index = 1;
        let Some(&src) = call.args.get(src_index) else {
            return Ok(None);
        };
        if self.is_decompression_source(ctx, src) {
            return Ok(Some(issue::new_issue(
                ctx,
                node,
                self.id(),
                &format!("Potential decompression bomb in io.{}", matched.name),
                Severity::Medium,
                Confidence::Medium,
            )));
        }
        Ok(None)
    }
}

/// The language version where range values stopped aliasing.
const RANGE_ALIAS_FIXED: LangVersion = LangVersion {
    major: 1,
    minor: 22,
};

/// Flags taking the address of a range-loop value variable (G601).
/// A no-op at or above the toolchain version that made loop variables
/// per-iteration.
pub struct RangeAliasRule;

impl RangeAliasRule {
    /// Creates the rule.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        Box::new(Self)
    }
}

impl Rule for RangeAliasRule {
    fn id(&self) -> &'static str {
        "G601"
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::RangeStmt]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        if ctx.lang_version >= RANGE_ALIAS_FIXED {
            return Ok(None);
        }
        let Node::RangeStmt(range) = ctx.ast.node(node) else {
            return Ok(None);
        };
        let mut loop_vars = Vec::new();
        for bound in [range.key, range.value].into_iter().flatten() {
            if let Some(oid) = ctx.info.object_id_of(bound) {
                loop_vars.push(oid);
            }
        }
        if loop_vars.is_empty() {
            return Ok(None);
        }
        // Search the body for &v of a loop variable.
        let mut stack = vec![range.body];
        while let Some(cur) = stack.pop() {
            if let Node::UnaryExpr(unary) = ctx.ast.node(cur) {
                if unary.op == UnOp::Amp {
                    let target = ctx.ast.unparen(unary.x);
                    if let Some(oid) = ctx.info.object_id_of(target) {
                        if loop_vars.contains(&oid) {
                            return Ok(Some(issue::new_issue(
                                ctx,
                                cur,
                                self.id(),
                                "Implicit memory aliasing in for loop",
                                Severity::Medium,
                                Confidence::Medium,
                            )));
                        }
                    }
                }
            }
            stack.extend(ctx.ast.children(cur));
        }
        Ok(None)
    }
}
