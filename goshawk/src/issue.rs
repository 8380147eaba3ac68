//! The issue model and its builder.
//!
//! Issues carry independent severity and confidence axes, a rendered
//! code snippet with one line of surrounding context, and the CWE mapped
//! from the rule id.

use crate::ast::{NodeId, Span};
use crate::cwe;
use crate::rules::Context;
use serde::Serialize;
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

/// How severe an issue is. Independent from [`Confidence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Minor security concern.
    Low,
    /// Potential security risk.
    Medium,
    /// Significant security risk.
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
        }
    }
}

/// How confident the rule is in its finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    /// The pattern is circumstantial.
    Low,
    /// The pattern usually indicates a defect.
    Medium,
    /// The pattern is a defect whenever it appears.
    High,
}

/// A CWE reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cwe {
    /// CWE identifier, e.g. `"328"`.
    pub id: String,
    /// URL of the weakness definition.
    pub url: String,
}

impl Cwe {
    /// Creates the reference for a numeric CWE id.
    #[must_use]
    pub fn new(id: u16) -> Self {
        Self {
            id: id.to_string(),
            url: format!("https://cwe.mitre.org/data/definitions/{id}.html"),
        }
    }
}

/// Why a would-be issue was not reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SuppressionKind {
    /// Suppressed by an in-source directive.
    #[serde(rename = "inSource")]
    InSource,
    /// Suppressed by scan configuration.
    #[serde(rename = "external")]
    External,
}

/// A record of one suppression that applied to an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suppression {
    /// Where the suppression came from.
    pub kind: SuppressionKind,
    /// The stated justification; may be empty.
    pub justification: String,
}

/// One reported security finding.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    /// Issue severity.
    pub severity: Severity,
    /// Rule confidence.
    pub confidence: Confidence,
    /// Mapped CWE, when the rule id has one.
    pub cwe: Option<Cwe>,
    /// The reporting rule's id.
    pub rule_id: String,
    /// Human-readable description.
    pub details: String,
    /// File the issue was found in.
    pub file: String,
    /// Code snippet with one line of context, each line `N: ` prefixed.
    pub code: String,
    /// Line rendered as `"N"`, or `"S-E"` for multi-line nodes.
    pub line: String,
    /// Start column of the node.
    pub column: String,
    /// Whether an in-source directive suppressed the issue.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nosec: bool,
    /// Suppressions that applied, in tracking mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppressions: Option<Vec<Suppression>>,
    /// Proposed fix text, when a collaborator supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autofix: Option<String>,
}

impl Issue {
    /// First line of the issue, for ordering.
    #[must_use]
    pub fn start_line(&self) -> u32 {
        self.line
            .split('-')
            .next()
            .and_then(|l| l.parse().ok())
            .unwrap_or(0)
    }

    /// Attaches suppression records and marks the issue suppressed.
    #[must_use]
    pub fn with_suppressions(mut self, suppressions: Vec<Suppression>) -> Self {
        self.nosec = suppressions
            .iter()
            .any(|s| s.kind == SuppressionKind::InSource);
        self.suppressions = Some(suppressions);
        self
    }

    /// Whether any suppression applies to this issue.
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.suppressions.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// Builds an issue for an AST node in the current file.
#[must_use]
pub fn new_issue(
    ctx: &Context<'_>,
    node: NodeId,
    rule_id: &str,
    details: &str,
    severity: Severity,
    confidence: Confidence,
) -> Issue {
    let span = ctx.ast.span(node);
    new_issue_at(
        &ctx.file.path,
        ctx.file.source.as_deref(),
        span,
        rule_id,
        details,
        severity,
        confidence,
    )
}

/// Builds an issue at a raw source position (used by the taint engine).
#[must_use]
pub fn new_issue_at(
    file: &Path,
    source: Option<&str>,
    span: Span,
    rule_id: &str,
    details: &str,
    severity: Severity,
    confidence: Confidence,
) -> Issue {
    let line = if span.start.line == span.end.line {
        span.start.line.to_string()
    } else {
        format!("{}-{}", span.start.line, span.end.line)
    };
    Issue {
        severity,
        confidence,
        cwe: cwe::get(rule_id),
        rule_id: rule_id.to_owned(),
        details: details.to_owned(),
        file: file.display().to_string(),
        code: code_snippet(file, source, span),
        line,
        column: span.start.column.to_string(),
        nosec: false,
        suppressions: None,
        autofix: None,
    }
}

/// Renders the node's code with one line of context either side, each
/// line prefixed `N: `. Substitutes `"invalid AST node"` when the source
/// cannot be read.
fn code_snippet(file: &Path, source: Option<&str>, span: Span) -> String {
    let owned;
    let text = match source {
        Some(s) => s,
        None => match fs::read_to_string(file) {
            Ok(s) => {
                owned = s;
                &owned
            }
            Err(_) => return "invalid AST node".to_owned(),
        },
    };
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() || span.start.line == 0 {
        return "invalid AST node".to_owned();
    }
    let first = span.start.line.saturating_sub(1).max(1) as usize;
    let last = ((span.end.line + 1) as usize).min(lines.len());
    if first > lines.len() {
        return "invalid AST node".to_owned();
    }
    let mut out = String::new();
    for n in first..=last {
        out.push_str(&format!("{}: {}\n", n, lines[n - 1]));
    }
    out
}

/// Sorts issues by (severity desc, rule id asc, file asc, line asc) —
/// the stable order reported after a scan.
pub fn sort_issues(issues: &mut [Issue]) {
    issues.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.rule_id.cmp(&b.rule_id))
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| a.start_line().cmp(&b.start_line()))
            .then_with(|| cmp_columns(a, b))
    });
}

fn cmp_columns(a: &Issue, b: &Issue) -> Ordering {
    let ca: u32 = a.column.parse().unwrap_or(0);
    let cb: u32 = b.column.parse().unwrap_or(0);
    ca.cmp(&cb)
}
