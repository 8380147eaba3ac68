//! Constant folding and call-target resolution over the arena AST.
//!
//! Every rule goes through these helpers. They are pure with respect to
//! the context, bound their recursion, and answer "don't know" with a
//! failure value rather than an error or a panic.

use crate::ast::{BinOp, CompositeLit, LitKind, Node, NodeId, UnOp};
use crate::frontend::{ConstValue, Object, Ty};
use crate::rules::Context;
use std::path::Path;
use thiserror::Error;

/// Identifier-chasing and folding stop at this depth.
const MAX_DEPTH: u32 = 16;

/// Failure to extract a concrete value from a subtree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The subtree does not fold to a constant.
    #[error("expression is not a constant")]
    NotConstant,
}

/// Whether `node` can be constant-folded: literals, declared constants
/// reached through identifier chains, binary operators, composite
/// literal elements, and value-spec/assignment right-hand sides. Call
/// expressions never resolve.
#[must_use]
pub fn try_resolve(ctx: &Context<'_>, node: NodeId) -> bool {
    resolve_depth(ctx, node, 0)
}

fn resolve_depth(ctx: &Context<'_>, node: NodeId, depth: u32) -> bool {
    if depth > MAX_DEPTH {
        return false;
    }
    match ctx.ast.node(node) {
        Node::BasicLit(_) => true,
        Node::ParenExpr(p) => resolve_depth(ctx, p.x, depth + 1),
        Node::UnaryExpr(u) => resolve_depth(ctx, u.x, depth + 1),
        Node::BinaryExpr(b) => {
            resolve_depth(ctx, b.x, depth + 1) && resolve_depth(ctx, b.y, depth + 1)
        }
        Node::CompositeLit(c) => c.elts.iter().all(|&e| resolve_depth(ctx, e, depth + 1)),
        Node::KeyValueExpr(kv) => resolve_depth(ctx, kv.value, depth + 1),
        Node::Ident(_) => {
            if matches!(ctx.info.object_of(node), Some(Object::Const { value: Some(_), .. })) {
                return true;
            }
            match ident_decl_rhs(ctx, node) {
                Some(rhs) => resolve_depth(ctx, rhs, depth + 1),
                None => false,
            }
        }
        // Unknown side effects.
        Node::CallExpr(_) => false,
        _ => false,
    }
}

/// The right-hand side that defines `ident`, from its value spec or
/// assignment. Returns `None` for parameters, fields, and multi-value
/// assignments that do not line up.
#[must_use]
pub fn ident_decl_rhs(ctx: &Context<'_>, ident: NodeId) -> Option<NodeId> {
    let name = ctx.ast.ident_name(ident)?;
    let oid = ctx.info.object_id_of(ident)?;
    let decl = *ctx.info.decl_of.get(&oid)?;
    match ctx.ast.node(decl) {
        Node::ValueSpec(spec) => {
            let pos = spec
                .names
                .iter()
                .position(|&n| ctx.ast.ident_name(n) == Some(name))?;
            spec.values.get(pos).copied()
        }
        Node::AssignStmt(assign) => {
            let pos = assign
                .lhs
                .iter()
                .position(|&n| ctx.ast.ident_name(n) == Some(name))?;
            if assign.rhs.len() == assign.lhs.len() {
                assign.rhs.get(pos).copied()
            } else {
                // Tuple assignment from a call; cannot fold.
                None
            }
        }
        _ => None,
    }
}

/// The single right-hand side of the tuple assignment defining `ident`
/// (`v, err := f(x)` yields `f(x)`). Used by rules that inspect the
/// producing call rather than the value itself.
#[must_use]
pub fn ident_tuple_rhs(ctx: &Context<'_>, ident: NodeId) -> Option<NodeId> {
    let oid = ctx.info.object_id_of(ident)?;
    let decl = *ctx.info.decl_of.get(&oid)?;
    match ctx.ast.node(decl) {
        Node::AssignStmt(assign) if assign.lhs.len() > 1 && assign.rhs.len() == 1 => {
            Some(assign.rhs[0])
        }
        Node::ValueSpec(spec) if spec.names.len() > 1 && spec.values.len() == 1 => {
            Some(spec.values[0])
        }
        _ => None,
    }
}

/// Recursively extracts a literal string value. Binary `+` concatenates
/// both sides; identifiers chase their single definition.
///
/// # Errors
///
/// [`ResolveError::NotConstant`] when any leaf is not a string constant.
pub fn get_string(ctx: &Context<'_>, node: NodeId) -> Result<String, ResolveError> {
    get_string_depth(ctx, node, 0)
}

fn get_string_depth(ctx: &Context<'_>, node: NodeId, depth: u32) -> Result<String, ResolveError> {
    if depth > MAX_DEPTH {
        return Err(ResolveError::NotConstant);
    }
    if let Some(ConstValue::Str(s)) = ctx.info.const_value(node) {
        return Ok(s.clone());
    }
    match ctx.ast.node(node) {
        Node::BasicLit(lit) if lit.kind == LitKind::String => Ok(lit.value.clone()),
        Node::ParenExpr(p) => get_string_depth(ctx, p.x, depth + 1),
        Node::BinaryExpr(b) if b.op == BinOp::Add => {
            let left = get_string_depth(ctx, b.x, depth + 1)?;
            let right = get_string_depth(ctx, b.y, depth + 1)?;
            Ok(left + &right)
        }
        Node::Ident(_) => {
            if let Some(Object::Const {
                value: Some(ConstValue::Str(s)),
                ..
            }) = ctx.info.object_of(node)
            {
                return Ok(s.clone());
            }
            match ident_decl_rhs(ctx, node) {
                Some(rhs) => get_string_depth(ctx, rhs, depth + 1),
                None => Err(ResolveError::NotConstant),
            }
        }
        _ => Err(ResolveError::NotConstant),
    }
}

/// Extracts a literal integer value, chasing identifiers and negation.
///
/// # Errors
///
/// [`ResolveError::NotConstant`] when the subtree is not an integer
/// constant.
pub fn get_int(ctx: &Context<'_>, node: NodeId) -> Result<i64, ResolveError> {
    get_int_depth(ctx, node, 0)
}

fn get_int_depth(ctx: &Context<'_>, node: NodeId, depth: u32) -> Result<i64, ResolveError> {
    if depth > MAX_DEPTH {
        return Err(ResolveError::NotConstant);
    }
    if let Some(ConstValue::Int(i)) = ctx.info.const_value(node) {
        return Ok(*i);
    }
    match ctx.ast.node(node) {
        Node::BasicLit(lit) if lit.kind == LitKind::Int => {
            parse_int_literal(&lit.value).ok_or(ResolveError::NotConstant)
        }
        Node::ParenExpr(p) => get_int_depth(ctx, p.x, depth + 1),
        Node::UnaryExpr(u) if u.op == UnOp::Neg => {
            get_int_depth(ctx, u.x, depth + 1).map(|v| -v)
        }
        Node::Ident(_) => {
            if let Some(Object::Const {
                value: Some(ConstValue::Int(i)),
                ..
            }) = ctx.info.object_of(node)
            {
                return Ok(*i);
            }
            match ident_decl_rhs(ctx, node) {
                Some(rhs) => get_int_depth(ctx, rhs, depth + 1),
                None => Err(ResolveError::NotConstant),
            }
        }
        _ => Err(ResolveError::NotConstant),
    }
}

/// Extracts a literal float value.
///
/// # Errors
///
/// [`ResolveError::NotConstant`] when the subtree is not a float constant.
pub fn get_float(ctx: &Context<'_>, node: NodeId) -> Result<f64, ResolveError> {
    if let Some(ConstValue::Float(f)) = ctx.info.const_value(node) {
        return Ok(*f);
    }
    match ctx.ast.node(node) {
        Node::BasicLit(lit) if lit.kind == LitKind::Float => {
            lit.value.parse().map_err(|_| ResolveError::NotConstant)
        }
        Node::ParenExpr(p) => get_float(ctx, p.x),
        _ => Err(ResolveError::NotConstant),
    }
}

/// Extracts a literal character value.
///
/// # Errors
///
/// [`ResolveError::NotConstant`] when the subtree is not a char constant.
pub fn get_char(ctx: &Context<'_>, node: NodeId) -> Result<char, ResolveError> {
    if let Some(ConstValue::Char(c)) = ctx.info.const_value(node) {
        return Ok(*c);
    }
    match ctx.ast.node(node) {
        Node::BasicLit(lit) if lit.kind == LitKind::Char => {
            lit.value.chars().next().ok_or(ResolveError::NotConstant)
        }
        Node::ParenExpr(p) => get_char(ctx, p.x),
        _ => Err(ResolveError::NotConstant),
    }
}

/// Top-level driver for string concatenation trees that may mix
/// constants and identifiers. Only accepts a binary expression root.
#[must_use]
pub fn concat_string(ctx: &Context<'_>, node: NodeId) -> Option<String> {
    match ctx.ast.node(node) {
        Node::BinaryExpr(_) => get_string(ctx, node).ok(),
        _ => None,
    }
}

/// Collects every identifier in a binary-expression tree that resolves
/// to a variable (not a constant).
#[must_use]
pub fn find_var_identities(ctx: &Context<'_>, node: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    collect_vars(ctx, node, &mut out);
    out
}

fn collect_vars(ctx: &Context<'_>, node: NodeId, out: &mut Vec<NodeId>) {
    match ctx.ast.node(node) {
        Node::BinaryExpr(b) => {
            collect_vars(ctx, b.x, out);
            collect_vars(ctx, b.y, out);
        }
        Node::ParenExpr(p) => collect_vars(ctx, p.x, out),
        Node::Ident(_) => {
            if matches!(ctx.info.object_of(node), Some(Object::Var { .. })) {
                out.push(node);
            }
        }
        _ => {}
    }
}

/// `(qualifier, name)` of a call: `(receiver-type, method)` for method
/// calls, `(package-path, function)` for package-qualified calls,
/// `(package-name, function)` for local calls.
#[must_use]
pub fn get_call_info(ctx: &Context<'_>, call: NodeId) -> Option<(String, String)> {
    let call_expr = ctx.ast.as_call(ctx.ast.unparen(call))?;
    let func = ctx.ast.unparen(call_expr.func);
    match ctx.ast.node(func) {
        Node::Ident(ident) => Some((ctx.pkg_name.to_owned(), ident.name.clone())),
        Node::SelectorExpr(sel) => {
            let method = ctx.ast.ident_name(sel.sel)?.to_owned();
            let recv = ctx.ast.unparen(sel.x);
            qualifier_of(ctx, recv).map(|q| (q, method))
        }
        _ => None,
    }
}

/// Resolves the qualifier of a selector receiver: the canonical package
/// path for package names, the qualified type name for typed values.
fn qualifier_of(ctx: &Context<'_>, recv: NodeId) -> Option<String> {
    match ctx.ast.node(recv) {
        Node::Ident(ident) => match ctx.info.object_of(recv) {
            Some(Object::PkgName { path, .. }) => Some(path.clone()),
            Some(Object::Var { ty, .. }) => ty.qualified_name(),
            Some(_) => type_qualifier(ctx, recv),
            None => {
                // Unresolved: map the lexical name back through imports.
                let by_import = ctx
                    .imports
                    .aliased
                    .iter()
                    .chain(ctx.imports.imported.iter())
                    .find(|(_, local)| local.as_str() == ident.name)
                    .map(|(path, _)| path.clone());
                by_import.or_else(|| Some(ident.name.clone()))
            }
        },
        Node::CallExpr(inner) => {
            let callee = ctx.ast.unparen(inner.func);
            if let Node::Ident(id) = ctx.ast.node(callee) {
                match ctx.info.object_of(callee) {
                    // new(T) yields a *T receiver.
                    Some(Object::Builtin { name }) if name == "new" => {
                        let arg = inner.args.first().copied()?;
                        type_expr_name(ctx, arg)
                    }
                    // `new` (or anything else) overridden by a user
                    // function: use its declared result type.
                    Some(Object::Func { sig, .. }) => {
                        sig.results.first().and_then(Ty::qualified_name)
                    }
                    _ if id.name == "new" => {
                        let arg = inner.args.first().copied()?;
                        type_expr_name(ctx, arg)
                    }
                    _ => type_qualifier(ctx, recv),
                }
            } else if let Node::SelectorExpr(_) = ctx.ast.node(callee) {
                // Call returning a (pointer) receiver.
                match get_call_object(ctx, recv) {
                    Some(Object::Func { sig, .. }) => {
                        sig.results.first().and_then(Ty::qualified_name)
                    }
                    _ => type_qualifier(ctx, recv),
                }
            } else {
                type_qualifier(ctx, recv)
            }
        }
        _ => type_qualifier(ctx, recv),
    }
}

/// The qualified name of a node's recorded type, pointer form preserved.
fn type_qualifier(ctx: &Context<'_>, node: NodeId) -> Option<String> {
    ctx.info.type_of(node).and_then(Ty::qualified_name)
}

/// The qualified name spelled by a type expression (`pkg.T`, `*pkg.T`,
/// or a bare identifier).
fn type_expr_name(ctx: &Context<'_>, node: NodeId) -> Option<String> {
    match ctx.ast.node(ctx.ast.unparen(node)) {
        Node::Ident(ident) => Some(ident.name.clone()),
        Node::SelectorExpr(sel) => {
            let name = ctx.ast.ident_name(sel.sel)?;
            match ctx.info.object_of(ctx.ast.unparen(sel.x)) {
                Some(Object::PkgName { path, .. }) => {
                    Some(crate::cache::qualify(path, name, false))
                }
                _ => {
                    let pkg = ctx.ast.ident_name(ctx.ast.unparen(sel.x))?;
                    Some(format!("{pkg}.{name}"))
                }
            }
        }
        Node::StarExpr(star) => type_expr_name(ctx, star.x).map(|n| format!("*{n}")),
        _ => None,
    }
}

/// The type-checker object the callee resolves to, if any.
#[must_use]
pub fn get_call_object<'c>(ctx: &'c Context<'_>, call: NodeId) -> Option<&'c Object> {
    let call_expr = ctx.ast.as_call(ctx.ast.unparen(call))?;
    match ctx.ast.node(ctx.ast.unparen(call_expr.func)) {
        Node::Ident(_) => ctx.info.object_of(ctx.ast.unparen(call_expr.func)),
        Node::SelectorExpr(sel) => ctx.info.object_of(sel.sel),
        _ => None,
    }
}

/// Returns the composite literal iff its type is one of the qualified
/// names given (`crypto/tls.Config` style).
#[must_use]
pub fn match_composite_lit<'c>(
    ctx: &'c Context<'_>,
    node: NodeId,
    qualified: &[&str],
) -> Option<&'c CompositeLit> {
    let Node::CompositeLit(lit) = ctx.ast.node(node) else {
        return None;
    };
    let name = ctx
        .info
        .type_of(node)
        .and_then(Ty::qualified_name)
        .or_else(|| lit.typ.and_then(|t| type_expr_name(ctx, t)))?;
    let stripped = name.trim_start_matches('*');
    if qualified.iter().any(|q| q.trim_start_matches('*') == stripped) {
        Some(lit)
    } else {
        None
    }
}

/// File path and line of a node, for diagnostics.
#[must_use]
pub fn get_location<'c>(ctx: &'c Context<'_>, node: NodeId) -> (&'c Path, u32) {
    (ctx.file.path.as_path(), ctx.ast.span(node).start.line)
}

/// Parses an integer literal token: decimal, `0x`/`0o`/`0b` prefixes,
/// and legacy leading-zero octal; `_` separators allowed.
#[must_use]
pub fn parse_int_literal(raw: &str) -> Option<i64> {
    let cleaned: String = raw.chars().filter(|&c| c != '_').collect();
    let s = cleaned.as_str();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    if let Some(oct) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
        return i64::from_str_radix(oct, 8).ok();
    }
    if let Some(bin) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        return i64::from_str_radix(bin, 2).ok();
    }
    if s.len() > 1 && s.starts_with('0') {
        return i64::from_str_radix(&s[1..], 8).ok();
    }
    s.parse().ok()
}
