//! Weak cryptography rules (G401, G403, G404).

use crate::ast::{NodeId, NodeKind};
use crate::calls::CallList;
use crate::config::ConfigStore;
use crate::issue::{self, Confidence, Severity};
use crate::resolve;
use crate::rules::{Context, MatchResult, Rule};

/// Flags constructors of broken or weak primitives: MD5, SHA-1, DES,
/// and RC4 (G401).
pub struct WeakCryptoRule {
    calls: CallList,
}

impl WeakCryptoRule {
    /// Creates the rule with its fixed blocklist.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        let mut calls = CallList::new();
        calls.add_all("crypto/md5", ["New", "Sum"]);
        calls.add_all("crypto/sha1", ["New", "Sum"]);
        calls.add_all("crypto/des", ["NewCipher", "NewTripleDESCipher"]);
        calls.add("crypto/rc4", "NewCipher");
        Box::new(Self { calls })
    }
}

impl Rule for WeakCryptoRule {
    fn id(&self) -> &'static str {
        "G401"
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::CallExpr]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        match self.calls.contains_call_expr(ctx, node) {
            Some(matched) => Ok(Some(issue::new_issue(
                ctx,
                node,
                self.id(),
                &format!(
                    "Use of weak cryptographic primitive {}.{}",
                    matched.qualifier, matched.name
                ),
                Severity::High,
                Confidence::High,
            ))),
            None => Ok(None),
        }
    }
}

/// Flags RSA key generation below a minimum bit length (G403).
pub struct RsaKeyLengthRule {
    calls: CallList,
    min_bits: i64,
}

impl RsaKeyLengthRule {
    /// Creates the rule; 2048 bits is the floor.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        let mut calls = CallList::new();
        calls.add("crypto/rsa", "GenerateKey");
        Box::new(Self {
            calls,
            min_bits: 2048,
        })
    }
}

impl Rule for RsaKeyLengthRule {
    fn id(&self) -> &'static str {
        "G403"
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
        let Some(&bits_arg) = call.args.get(1) else {
            return Ok(None);
        };
        // Only a concrete constant can prove the key too short.
        match resolve::get_int(ctx, bits_arg) {
            Ok(bits) if bits < self.min_bits => Ok(Some(issue::new_issue(
                ctx,
                node,
                self.id(),
                &format!("RSA keys should be at least {} bits", self.min_bits),
                Severity::Medium,
                Confidence::High,
            ))),
            _ => Ok(None),
        }
    }
}

/// Flags the non-cryptographic random generator (G404).
pub struct WeakRandRule {
    calls: CallList,
}

impl WeakRandRule {
    /// Creates the rule over `math/rand` and `math/rand/v2`.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        let mut calls = CallList::new();
        let funcs = [
            "New",
            "NewSource",
            "Read",
            "Int",
            "Intn",
            "Int31",
            "Int31n",
            "Int63",
            "Int63n",
            "Uint32",
            "Uint64",
            "Float32",
            "Float64",
            "Perm",
            "Shuffle",
        ];
        calls.add_all("math/rand", funcs);
        calls.add_all("math/rand/v2", ["Int", "IntN", "Int32", "Int32N", "Int64", "Int64N", "N", "Uint32", "Uint64", "Float32", "Float64", "Perm", "Shuffle"]);
        Box::new(Self { calls })
    }
}

impl Rule for WeakRandRule {
    fn id(&self) -> &'static str {
        "G404"
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::CallExpr]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        match self.calls.contains_call_expr(ctx, node) {
            Some(matched) => Ok(Some(issue::new_issue(
                ctx,
                node,
                self.id(),
                &format!(
                    "Use of weak random number generator ({}.{} instead of crypto/rand)",
                    matched.qualifier, matched.name
                ),
                Severity::High,
                Confidence::Medium,
            ))),
            None => Ok(None),
        }
    }
}
