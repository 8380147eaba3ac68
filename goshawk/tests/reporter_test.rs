//! Issue-stream serialisation tests.

use goshawk::ast::{Position, Span};
use goshawk::engine::Metrics;
use goshawk::frontend::ParseError;
use goshawk::issue::{new_issue_at, Confidence, Severity};
use goshawk::reporter::{write_json, JsonReporter, Reporter};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

fn sample_issue() -> goshawk::issue::Issue {
    new_issue_at(
        Path::new("main.go"),
        Some("one\ntwo\n"),
        Span::new(Position::new(1, 3), Position::new(1, 3)),
        "G401",
        "weak hash",
        Severity::High,
        Confidence::High,
    )
}

#[test]
fn json_payload_contains_issues_stats_and_errors() {
    let metrics = Metrics {
        num_files: 2,
        num_lines: 40,
        num_nosec: 1,
        num_found: 1,
    };
    let mut errors = BTreeMap::new();
    errors.insert(
        "broken.go".to_owned(),
        vec![ParseError {
            file: PathBuf::from("broken.go"),
            line: 3,
            column: 9,
            message: "unexpected token".to_owned(),
        }],
    );

    let mut buf = Vec::new();
    write_json(&mut buf, &[sample_issue()], &metrics, &errors).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();

    assert_eq!(json["issues"][0]["rule_id"], "G401");
    assert_eq!(json["issues"][0]["line"], "1");
    assert_eq!(json["issues"][0]["column"], "3");
    assert_eq!(json["stats"]["num_found"], 1);
    assert_eq!(json["errors"]["broken.go"][0]["line"], 3);
    assert_eq!(json["errors"]["broken.go"][0]["error"], "unexpected token");
}

#[test]
fn reporter_trait_writes_through() {
    let mut buf = Vec::new();
    {
        let mut reporter = JsonReporter::new(&mut buf);
        reporter
            .report(&[sample_issue()], &Metrics::default(), &BTreeMap::new())
            .unwrap();
    }
    assert!(!buf.is_empty());
}
