//! Parsing of in-source suppression directives.
//!
//! A directive is `<tag> [rule-id-list] [-- justification]`. The tag
//! must open a comment, or a line of a block comment; ids are
//! `letter digit digit digit`; the justification is everything after the
//! first run of two or more dashes. A directive with no ids suppresses
//! every rule, represented with the wildcard key.

use crate::ast::CommentGroup;
use crate::issue::{Suppression, SuppressionKind};
use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::OnceLock;

/// The default directive tag.
pub const DEFAULT_TAG: &str = "#nosec";

/// Map key standing for "all rules".
pub const WILDCARD: &str = "*";

fn justification_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| Regex::new(r"-{2,}").expect("justification separator regex"))
}

/// Extracts every suppression declared by the comment groups attached to
/// one node. Multiple ids on one line suppress each independently;
/// multiple directives union.
#[must_use]
pub fn extract_directives(
    groups: &[&CommentGroup],
    tag: &str,
    alt_tag: Option<&str>,
) -> FxHashMap<String, Suppression> {
    let mut out = FxHashMap::default();
    for group in groups {
        for comment in &group.comments {
            for line in comment_lines(comment) {
                let trimmed = line.trim_start();
                let rest = match strip_tag(trimmed, tag, alt_tag) {
                    Some(r) => r,
                    None => continue,
                };
                let (ids_part, justification) = split_justification(rest);
                let ids = parse_ids(ids_part);
                if ids.is_empty() {
                    out.insert(
                        WILDCARD.to_owned(),
                        Suppression {
                            kind: SuppressionKind::InSource,
                            justification: justification.clone(),
                        },
                    );
                } else {
                    for id in ids {
                        out.insert(
                            id,
                            Suppression {
                                kind: SuppressionKind::InSource,
                                justification: justification.clone(),
                            },
                        );
                    }
                }
            }
        }
    }
    out
}

/// The content lines a directive may start: the body of a line comment,
/// or each line of a block comment.
fn comment_lines(comment: &str) -> Vec<&str> {
    if let Some(body) = comment.strip_prefix("//") {
        return vec![body];
    }
    let body = comment.strip_prefix("/*").unwrap_or(comment);
    let body = body.strip_suffix("*/").unwrap_or(body);
    body.lines().collect()
}

/// Strips a matching tag from the start of a trimmed comment line. The
/// tag must be a whole token: the remainder has to be empty or start
/// with whitespace, so `#nosecurity` never matches the `#nosec` tag.
fn strip_tag<'l>(line: &'l str, tag: &str, alt_tag: Option<&str>) -> Option<&'l str> {
    for candidate in [Some(tag), alt_tag].into_iter().flatten() {
        if let Some(rest) = line.strip_prefix(candidate) {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return Some(rest);
            }
        }
    }
    None
}

/// Splits at the first run of two-or-more dashes; both halves trimmed.
fn split_justification(rest: &str) -> (&str, String) {
    match justification_re().find(rest) {
        Some(m) => (
            rest[..m.start()].trim(),
            rest[m.end()..].trim().to_owned(),
        ),
        None => (rest.trim(), String::new()),
    }
}

/// Collects id-shaped tokens (`G101` style) from the list part.
fn parse_ids(part: &str) -> Vec<String> {
    part.split_whitespace()
        .map(|tok| tok.trim_matches(','))
        .filter(|tok| is_rule_id(tok))
        .map(ToOwned::to_owned)
        .collect()
}

fn is_rule_id(tok: &str) -> bool {
    let bytes = tok.as_bytes();
    bytes.len() == 4
        && bytes[0].is_ascii_uppercase()
        && bytes[1..].iter().all(u8::is_ascii_digit)
}
