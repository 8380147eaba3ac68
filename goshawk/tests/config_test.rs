//! Configuration store tests.

use goshawk::config::{
    parse_exclude_spec, ConfigStore, ExcludeTargets, GlobalOption,
};

#[test]
fn globals_round_trip_and_coerce() {
    let mut config = ConfigStore::new();
    config.set_global(GlobalOption::Audit, "enabled");
    assert_eq!(config.get_global(GlobalOption::Audit).as_deref(), Some("enabled"));
    assert!(config.is_global_enabled(GlobalOption::Audit));
    assert!(!config.is_global_enabled(GlobalOption::Nosec));
}

#[test]
fn boolean_global_values_count_as_enabled() {
    let mut config = ConfigStore::new();
    config
        .read_from(r#"{"global": {"nosec": true, "audit": "false"}}"#.as_bytes())
        .unwrap();
    assert!(config.is_global_enabled(GlobalOption::Nosec));
    assert!(!config.is_global_enabled(GlobalOption::Audit));
    // Booleans coerce to strings on read.
    assert_eq!(config.get_global(GlobalOption::Nosec).as_deref(), Some("true"));
}

#[test]
fn write_read_round_trip_preserves_content() {
    let mut config = ConfigStore::new();
    config.set_global(GlobalOption::Audit, "true");
    config.set("G101", serde_json::json!({"pattern": "tok"}));
    config.set("unknown-extension", serde_json::json!([1, 2, 3]));

    let mut buf = Vec::new();
    config.write_to(&mut buf).unwrap();
    let mut restored = ConfigStore::new();
    restored.read_from(buf.as_slice()).unwrap();
    assert_eq!(config, restored);
}

#[test]
fn non_object_configuration_is_rejected() {
    let mut config = ConfigStore::new();
    assert!(config.read_from("[1, 2]".as_bytes()).is_err());
    assert!(config.read_from("not json".as_bytes()).is_err());
}

#[test]
fn per_rule_lookup_never_returns_the_global_section() {
    let mut config = ConfigStore::new();
    config.set("G104", serde_json::json!({"fmt": ["Println"]}));
    assert!(config.get("G104").is_some());
    assert!(config.get("global").is_none());
}

#[test]
fn exclude_grammar_parses_patterns_and_ids() {
    let rules = parse_exclude_spec("cmd/.*:G204 ; vendor/.*:G101,G104").unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].pattern(), "cmd/.*");
    assert_eq!(
        rules[0].targets(),
        &ExcludeTargets::Ids(vec!["G204".to_owned()])
    );
    assert_eq!(
        rules[1].targets(),
        &ExcludeTargets::Ids(vec!["G101".to_owned(), "G104".to_owned()])
    );
}

#[test]
fn exclude_wildcard_means_all_rules() {
    let rules = parse_exclude_spec("generated/.*:*").unwrap();
    assert_eq!(rules[0].targets(), &ExcludeTargets::All);
}

#[test]
fn exclude_grammar_rejects_bad_input() {
    assert!(parse_exclude_spec("no-colon-here").is_err());
    assert!(parse_exclude_spec(":G101").is_err());
    assert!(parse_exclude_spec("cmd/.*:").is_err());
    assert!(parse_exclude_spec("([:G101").is_err());
    assert!(parse_exclude_spec("cmd/.*:NOPE").is_err());
}

#[test]
fn should_exclude_matches_rule_and_path() {
    let mut config = ConfigStore::new();
    config.set_exclude_rules(parse_exclude_spec("cmd/.*:G204").unwrap());
    assert!(config.should_exclude("cmd/tool/main.go", "G204"));
    assert!(!config.should_exclude("cmd/tool/main.go", "G101"));
    assert!(!config.should_exclude("pkg/lib.go", "G204"));
}

#[test]
fn should_exclude_normalises_backslashes() {
    let mut config = ConfigStore::new();
    config.set_exclude_rules(parse_exclude_spec("cmd/.*:*").unwrap());
    assert!(config.should_exclude(r"cmd\tool\main.go", "G204"));
}
