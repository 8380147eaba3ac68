//! Matching call expressions against package-qualified name sets.

use crate::ast::NodeId;
use crate::resolve;
use crate::rules::Context;
use rustc_hash::{FxHashMap, FxHashSet};

/// A successful call-list match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMatch {
    /// The list entry that matched (package path or qualified type).
    pub qualifier: String,
    /// The matched function or method name.
    pub name: String,
}

/// A set of `(package-or-type, function)` pairs rules match calls
/// against.
#[derive(Debug, Default, Clone)]
pub struct CallList {
    entries: FxHashMap<String, FxHashSet<String>>,
}

impl CallList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one `(qualifier, name)` pair.
    pub fn add(&mut self, qualifier: &str, name: &str) {
        self.entries
            .entry(qualifier.to_owned())
            .or_default()
            .insert(name.to_owned());
    }

    /// Adds several names under one qualifier.
    pub fn add_all<'n>(&mut self, qualifier: &str, names: impl IntoIterator<Item = &'n str>) {
        let set = self.entries.entry(qualifier.to_owned()).or_default();
        for name in names {
            set.insert((*name).to_owned());
        }
    }

    /// Whether the exact `(qualifier, name)` pair is present.
    #[must_use]
    pub fn contains(&self, qualifier: &str, name: &str) -> bool {
        self.entries
            .get(qualifier)
            .is_some_and(|set| set.contains(name))
    }

    /// Like [`CallList::contains`] but tolerant of pointer receivers:
    /// `T` and `*T` entries both match either form.
    #[must_use]
    pub fn contains_pointer(&self, qualifier: &str, name: &str) -> bool {
        let bare = qualifier.trim_start_matches('*');
        self.contains(bare, name) || self.contains(&format!("*{bare}"), name)
    }

    /// Resolves a call node and looks it up. Preference order: the exact
    /// qualifier, its pointer-stripped form, then the unqualified name —
    /// the more specific entry always wins.
    #[must_use]
    pub fn contains_call_expr(&self, ctx: &Context<'_>, node: NodeId) -> Option<CallMatch> {
        let (qualifier, name) = resolve::get_call_info(ctx, node)?;
        if self.contains(&qualifier, &name) {
            return Some(CallMatch { qualifier, name });
        }
        let bare = qualifier.trim_start_matches('*');
        if bare != qualifier && self.contains(bare, &name) {
            return Some(CallMatch {
                qualifier: bare.to_owned(),
                name,
            });
        }
        // Fall back to a short, unqualified entry.
        let short = bare.rsplit(['.', '/']).next().unwrap_or(bare);
        if short != bare && self.contains(short, &name) {
            return Some(CallMatch {
                qualifier: short.to_owned(),
                name,
            });
        }
        None
    }

    /// Package-qualified variant: the matched qualifier must be a
    /// package imported by the file (or the file's own package). With
    /// `pointer_match` set, `*pkg.T` receivers also match `pkg.T`
    /// entries.
    #[must_use]
    pub fn contains_pkg_call_expr(
        &self,
        ctx: &Context<'_>,
        node: NodeId,
        pointer_match: bool,
    ) -> Option<CallMatch> {
        let (qualifier, name) = resolve::get_call_info(ctx, node)?;
        let candidate = if pointer_match {
            qualifier.trim_start_matches('*')
        } else {
            qualifier.as_str()
        };
        if !self.contains(candidate, &name) {
            return None;
        }
        let pkg_of = candidate.split('.').next().unwrap_or(candidate);
        if ctx.imports.is_imported(pkg_of) || pkg_of == ctx.pkg_path || pkg_of == ctx.pkg_name {
            Some(CallMatch {
                qualifier: candidate.to_owned(),
                name,
            })
        } else {
            None
        }
    }
}
