//! Network, TLS, and HTTP hardening rules
//! (G102, G106, G107, G112, G114, G402).

use crate::ast::{Node, NodeId, NodeKind};
use crate::calls::CallList;
use crate::config::ConfigStore;
use crate::issue::{self, Confidence, Issue, Severity};
use crate::resolve;
use crate::rules::{Context, MatchResult, Rule};

/// TLS 1.2 as the minimum acceptable protocol version.
const TLS12: i64 = 0x0303;

/// Version constant names below the TLS 1.2 floor.
const LOW_VERSION_NAMES: &[&str] = &["VersionSSL30", "VersionTLS10", "VersionTLS11"];

/// Cipher suites with known weaknesses.
const BAD_CIPHER_SUITES: &[&str] = &[
    "TLS_RSA_WITH_RC4_128_SHA",
    "TLS_RSA_WITH_AES_128_CBC_SHA256",
    "TLS_ECDHE_ECDSA_WITH_RC4_128_SHA",
    "TLS_ECDHE_RSA_WITH_RC4_128_SHA",
];

/// Flags listeners bound to every interface (G102).
pub struct BindAllInterfacesRule {
    calls: CallList,
}

impl BindAllInterfacesRule {
    /// Creates the rule over the `net` and `crypto/tls` listeners.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        let mut calls = CallList::new();
        calls.add("net", "Listen");
        calls.add("crypto/tls", "Listen");
        Box::new(Self { calls })
    }
}

impl Rule for BindAllInterfacesRule {
    fn id(&self) -> &'static str {
        "G102"
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
        let Some(&addr_arg) = call.args.get(1) else {
            return Ok(None);
        };
        let Ok(addr) = resolve::get_string(ctx, addr_arg) else {
            return Ok(None);
        };
        let binds_all = addr == "0.0.0.0" || addr.starts_with("0.0.0.0:") || addr.starts_with(':');
        if binds_all {
            return Ok(Some(issue::new_issue(
                ctx,
                node,
                self.id(),
                "Binds to all network interfaces",
                Severity::Medium,
                Confidence::High,
            )));
        }
        Ok(None)
    }
}

/// Flags disabled host-key verification for SSH (G106).
pub struct SshHostKeyRule {
    calls: CallList,
}

impl SshHostKeyRule {
    /// Creates the rule.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        let mut calls = CallList::new();
        calls.add("golang.org/x/crypto/ssh", "InsecureIgnoreHostKey");
        Box::new(Self { calls })
    }
}

impl Rule for SshHostKeyRule {
    fn id(&self) -> &'static str {
        "G106"
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::CallExpr]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        match self.calls.contains_call_expr(ctx, node) {
            Some(_) => Ok(Some(issue::new_issue(
                ctx,
                node,
                self.id(),
                "Use of ssh.InsecureIgnoreHostKey disables host key verification",
                Severity::Medium,
                Confidence::High,
            ))),
            None => Ok(None),
        }
    }
}

/// Flags HTTP requests whose URL is not a compile-time constant (G107).
pub struct VariableUrlRule {
    calls: CallList,
}

impl VariableUrlRule {
    /// Creates the rule over the `net/http` request helpers.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        let mut calls = CallList::new();
        calls.add_all("net/http", ["Get", "Head", "Post", "PostForm"]);
        Box::new(Self { calls })
    }
}

impl Rule for VariableUrlRule {
    fn id(&self) -> &'static str {
        "G107"
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
        let Some(&url_arg) = call.args.first() else {
            return Ok(None);
        };
        let dynamic = match ctx.ast.node(ctx.ast.unparen(url_arg)) {
            Node::Ident(_) => !resolve::try_resolve(ctx, url_arg),
            Node::BinaryExpr(_) => {
                !resolve::find_var_identities(ctx, url_arg).is_empty()
                    && resolve::concat_string(ctx, url_arg).is_none()
            }
            _ => false,
        };
        if dynamic {
            return Ok(Some(issue::new_issue(
                ctx,
                node,
                self.id(),
                "HTTP request made with variable url",
                Severity::Medium,
                Confidence::Medium,
            )));
        }
        Ok(None)
    }
}

/// Flags `http.Server` literals without read timeouts (G112).
pub struct SlowlorisRule;

impl SlowlorisRule {
    /// Creates the rule.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        Box::new(Self)
    }
}

impl Rule for SlowlorisRule {
    fn id(&self) -> &'static str {
        "G112"
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::CompositeLit]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        let Some(lit) = resolve::match_composite_lit(ctx, node, &["net/http.Server"]) else {
            return Ok(None);
        };
        let mut has_timeout = false;
        for &elt in &lit.elts {
            if let Node::KeyValueExpr(kv) = ctx.ast.node(elt) {
                if let Some(key) = ctx.ast.ident_name(kv.key) {
                    if key == "ReadHeaderTimeout" || key == "ReadTimeout" {
                        has_timeout = true;
                    }
                }
            }
        }
        if has_timeout {
            return Ok(None);
        }
        Ok(Some(issue::new_issue(
            ctx,
            node,
            self.id(),
            "Potential slowloris attack: http.Server without ReadHeaderTimeout",
            Severity::Medium,
            Confidence::Low,
        )))
    }
}

/// Flags the serve helpers that cannot set timeouts (G114).
pub struct ServeWithoutTimeoutRule {
    calls: CallList,
}

impl ServeWithoutTimeoutRule {
    /// Creates the rule.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        let mut calls = CallList::new();
        calls.add_all(
            "net/http",
            ["ListenAndServe", "ListenAndServeTLS", "Serve", "ServeTLS"],
        );
        Box::new(Self { calls })
    }
}

impl Rule for ServeWithoutTimeoutRule {
    fn id(&self) -> &'static str {
        "G114"
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
                &format!("Use of net/http.{} with no support for timeouts", matched.name),
                Severity::Medium,
                Confidence::High,
            ))),
            None => Ok(None),
        }
    }
}

/// Flags insecure `tls.Config` field values (G402): disabled certificate
/// verification, protocol floors below TLS 1.2, and weak cipher suites.
pub struct TlsConfigRule;

impl TlsConfigRule {
    /// Creates the rule.
    #[must_use]
    pub fn new(_config: &ConfigStore) -> Box<dyn Rule> {
        Box::new(Self)
    }

    fn check_field(&self, ctx: &Context<'_>, lit_node: NodeId, elt: NodeId) -> Option<Issue> {
        let Node::KeyValueExpr(kv) = ctx.ast.node(elt) else {
            return None;
        };
        let key = ctx.ast.ident_name(kv.key)?;
        match key {
            "InsecureSkipVerify" => {
                if is_true_value(ctx, kv.value) {
                    return Some(issue::new_issue(
                        ctx,
                        lit_node,
                        "G402",
                        "TLS InsecureSkipVerify set true",
                        Severity::High,
                        Confidence::High,
                    ));
                }
                None
            }
            "MinVersion" | "MaxVersion" => {
                if is_low_tls_version(ctx, kv.value) {
                    return Some(issue::new_issue(
                        ctx,
                        lit_node,
                        "G402",
                        &format!("TLS {key} too low"),
                        Severity::Medium,
                        Confidence::High,
                    ));
                }
                None
            }
            "CipherSuites" => {
                let Node::CompositeLit(suites) = ctx.ast.node(ctx.ast.unparen(kv.value)) else {
                    return None;
                };
                for &suite in &suites.elts {
                    if let Some(name) = selector_name(ctx, suite) {
                        if BAD_CIPHER_SUITES.contains(&name) {
                            return Some(issue::new_issue(
                                ctx,
                                lit_node,
                                "G402",
                                &format!("TLS bad cipher suite: {name}"),
                                Severity::Medium,
                                Confidence::High,
                            ));
                        }
                    }
                }
                None
            }
            _ => None,
        }
    }
}

impl Rule for TlsConfigRule {
    fn id(&self) -> &'static str {
        "G402"
    }

    fn node_kinds(&self) -> &[NodeKind] {
        &[NodeKind::CompositeLit]
    }

    fn matches(&mut self, node: NodeId, ctx: &mut Context<'_>) -> MatchResult {
        let Some(lit) = resolve::match_composite_lit(ctx, node, &["crypto/tls.Config"]) else {
            return Ok(None);
        };
        for &elt in &lit.elts {
            if let Some(found) = self.check_field(ctx, node, elt) {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

/// Whether the expression is the boolean constant `true`.
fn is_true_value(ctx: &Context<'_>, node: NodeId) -> bool {
    if let Some(crate::frontend::ConstValue::Bool(b)) = ctx.info.const_value(node) {
        return *b;
    }
    ctx.ast.ident_name(ctx.ast.unparen(node)) == Some("true")
}

/// Whether the expression names or folds to a version below TLS 1.2.
fn is_low_tls_version(ctx: &Context<'_>, node: NodeId) -> bool {
    if let Ok(version) = resolve::get_int(ctx, node) {
        return version < TLS12;
    }
    matches!(selector_name(ctx, node), Some(name) if LOW_VERSION_NAMES.contains(&name))
}

/// The selected name of a `pkg.Name` expression.
fn selector_name<'c>(ctx: &'c Context<'_>, node: NodeId) -> Option<&'c str> {
    match ctx.ast.node(ctx.ast.unparen(node)) {
        Node::SelectorExpr(sel) => ctx.ast.ident_name(sel.sel),
        Node::Ident(ident) => Some(&ident.name),
        _ => None,
    }
}
