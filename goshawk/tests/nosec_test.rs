//! Suppression directive parsing tests.

use goshawk::ast::{CommentGroup, Span};
use goshawk::nosec::{extract_directives, DEFAULT_TAG, WILDCARD};

fn group(comments: &[&str]) -> CommentGroup {
    CommentGroup {
        comments: comments.iter().map(|c| (*c).to_owned()).collect(),
        span: Span::line(1, 1),
    }
}

fn extract(comments: &[&str]) -> rustc_hash::FxHashMap<String, goshawk::issue::Suppression> {
    let g = group(comments);
    extract_directives(&[&g], DEFAULT_TAG, None)
}

#[test]
fn bare_tag_suppresses_all_rules() {
    let map = extract(&["// #nosec"]);
    assert!(map.contains_key(WILDCARD));
    assert_eq!(map.len(), 1);
}

#[test]
fn tag_with_ids_suppresses_each() {
    let map = extract(&["// #nosec G101 G204"]);
    assert!(map.contains_key("G101"));
    assert!(map.contains_key("G204"));
    assert!(!map.contains_key(WILDCARD));
}

#[test]
fn justification_follows_double_dash() {
    let map = extract(&["// #nosec G101 -- reviewed by security"]);
    assert_eq!(map["G101"].justification, "reviewed by security");
}

#[test]
fn longer_dash_runs_also_separate_justification() {
    let map = extract(&["// #nosec ---- because reasons"]);
    assert_eq!(map[WILDCARD].justification, "because reasons");
}

#[test]
fn tag_must_start_the_comment() {
    let map = extract(&["// this code is fine #nosec"]);
    assert!(map.is_empty());
}

#[test]
fn tag_must_be_a_whole_token() {
    // A longer word sharing the tag prefix is not a directive.
    let map = extract(&["// #nosecurity unrelated note"]);
    assert!(map.is_empty());
    let map = extract(&["// #nosecs G101"]);
    assert!(map.is_empty());
}

#[test]
fn block_comment_lines_each_carry_directives() {
    let map = extract(&["/*\n   #nosec G301\n other text\n*/"]);
    assert!(map.contains_key("G301"));
    assert_eq!(map.len(), 1);
}

#[test]
fn single_line_block_comment_matches() {
    let map = extract(&["/* #nosec */"]);
    assert!(map.contains_key(WILDCARD));
}

#[test]
fn alternative_tag_is_recognised() {
    let g = group(&["//goshawk:disable G104"]);
    let map = extract_directives(&[&g], DEFAULT_TAG, Some("goshawk:disable"));
    assert!(map.contains_key("G104"));
}

#[test]
fn malformed_ids_fall_back_to_wildcard() {
    // Prose after the tag without id-shaped tokens suppresses all.
    let map = extract(&["// #nosec not a real id"]);
    assert!(map.contains_key(WILDCARD));
}

#[test]
fn multiple_comments_in_a_group_union() {
    let map = extract(&["// #nosec G101", "// #nosec G204"]);
    assert!(map.contains_key("G101"));
    assert!(map.contains_key("G204"));
}
