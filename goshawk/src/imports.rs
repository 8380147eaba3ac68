//! Per-file import bookkeeping.
//!
//! Rules resolve a type-checker package path to the lexical name actually
//! in scope (`crypto/md5` imported as `m` makes `m.New()` an md5 call).
//! Imports are tracked by canonical path; aliases are stored separately.

use crate::ast::{Ast, File, Node};
use rustc_hash::{FxHashMap, FxHashSet};

/// Records the imports of a single file.
#[derive(Debug, Default, Clone)]
pub struct ImportTracker {
    /// Canonical path to the local name in scope (the package's exported
    /// name for plain imports).
    pub imported: FxHashMap<String, String>,
    /// Canonical path to its alias for renamed imports.
    pub aliased: FxHashMap<String, String>,
    /// Canonical paths imported with the blank identifier.
    pub init_only: FxHashSet<String>,
}

impl ImportTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks the file's top-level import declarations and records every
    /// import. The `unsafe` pseudo-package is recorded even though the
    /// type checker omits it from its package list.
    pub fn track_file(&mut self, ast: &Ast, file: &File) {
        for &decl in &file.decls {
            let Node::GenDecl(gen) = ast.node(decl) else {
                continue;
            };
            for &spec in &gen.specs {
                let Node::ImportSpec(imp) = ast.node(spec) else {
                    continue;
                };
                let Some(lit) = ast.as_lit(imp.path) else {
                    continue;
                };
                let path = normalize_path(&lit.value);
                match imp.name.and_then(|n| ast.ident_name(n)) {
                    Some("_") => {
                        self.init_only.insert(path);
                    }
                    Some(alias) => {
                        self.aliased.insert(path, alias.to_owned());
                    }
                    None => {
                        let local = exported_name(&path).to_owned();
                        self.imported.insert(path, local);
                    }
                }
            }
        }
    }

    /// The lexical name `path` is reachable under, alias included.
    #[must_use]
    pub fn local_name(&self, path: &str) -> Option<&str> {
        self.aliased
            .get(path)
            .or_else(|| self.imported.get(path))
            .map(String::as_str)
    }

    /// Whether the file imports `path` in any form.
    #[must_use]
    pub fn is_imported(&self, path: &str) -> bool {
        self.imported.contains_key(path)
            || self.aliased.contains_key(path)
            || self.init_only.contains(path)
    }
}

/// Strips quotes and vendor prefixes from an import path literal.
fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim_matches('"');
    match trimmed.rfind("vendor/") {
        Some(idx) => trimmed[idx + "vendor/".len()..].to_owned(),
        None => trimmed.to_owned(),
    }
}

/// The exported name of a package, i.e. the last path segment.
fn exported_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
