//! Import blocklist rules (G108, G501–G505).

use crate::ast::{Node, NodeId, NodeKind};
use crate::config::ConfigStore;
use crate::issue::{self, Confidence, Severity};
use crate::rules::{Context, MatchResult, Rule};

/// Fires when a file imports a blocklisted package.
pub struct BlockedImportRule {
    id: &'static str,
    path: &'static str,
    description: &'static str,
    severity: Severity,
}

impl BlockedImportRule {
    fn boxed(
        id: &'static str,
        path: &'static str,
        description: &'static str,
        severity: Severity,
    ) -> Box<dyn Rule> {
        Box::new(Self {
            id,
            path,
            description,
            severity,
        })
    }

    /// Profiling endpoint auto-registration (G108).
    #[must_use]
    pub fn pprof(_config: &ConfigStore) -> Box<dyn Rule> {
        Self::boxed(
            "G108",
            "net/http/pprof",
            "Profiling endpoint is automatically exposed on /debug/pprof",
            Severity::High,
        )
    }

    /// MD5 import (G501).
    #[must_use]
    pub fn md5(_config: &ConfigStore) -> Box<dyn Rule> {
        Self::boxed(
            "G501",
            "crypto/md5",
            "Blocklisted import crypto/md5: weak cryptographic primitive",
            Severity::Medium,
        )
    }

    /// DES import (G502).
    #[must_use]
    pub fn des(_config: &ConfigStore) -> Box<dyn Rule> {
        Self::boxed(
            "G502",
            "crypto/des",
            "Blocklisted import crypto/des: weak cryptographic primitive",
            Severity::Medium,
        )
    }

    /// RC4 import (G503).
    #[must_use]
    pub fn rc4(_config: &ConfigStore) -> Box<dyn Rule> {
        Self::boxed(
            "G503",
            "crypto/rc4",
            "Blocklisted import crypto/rc4: weak cryptographic primitive",
            Severity::Medium,
        )
    }

    /// CGI import (G504).
    #[must_use]
    pub fn cgi(_config: &ConfigStore) -> Box<dyn Rule> {
        Self::boxed(
            "G504",
            "net/http/cgi",
            "Blocklisted import net/http/cgi: Go versions < 1.6.3 are vulnerable to Httpoxy attack",
            Severity::High,
        )
    }

    /// SHA-1 import (G505).
    #[must_use]
    pub fn sha1(_config: &ConfigStore) -> Box<dyn Rule> {
        Self::boxed(
            "G505",
            "crypto/sha1",
            "Blocklisted import crypto/sha1: weak cryptographic primitive",
            Severity::Medium,
        )
    }
}

impl Rule for BlockedImportRule {
    fn id(&self) -> &'static str {
        self.id
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::ImportSpec]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        let Node::ImportSpec(spec) = ctx.ast.node(node) else {
            return Ok(None);
        };
        let Some(lit) = ctx.ast.as_lit(spec.path) else {
            return Ok(None);
        };
        if lit.value.trim_matches('"') == self.path {
            return Ok(Some(issue::new_issue(
                ctx,
                node,
                self.id,
                self.description,
                self.severity,
                Confidence::High,
            )));
        }
        Ok(None)
    }
}
