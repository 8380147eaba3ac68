//! Hardcoded-credential rule tests (G101).

use goshawk::ast::BinOp;
use goshawk::config::ConfigStore;
use goshawk::engine::ScanEngine;
use goshawk::frontend::{LoadedPackage, Ty};
use goshawk::issue::Severity;
use goshawk::rules::registry::{self, RuleFilter};
use goshawk::testutil::{PackageBuilder, StubLoader};

fn scan_with(config: ConfigStore, pkg: LoadedPackage) -> ScanEngine {
    let ruleset = registry::generate(&config, false, &[RuleFilter::include(["G101"])]);
    let mut engine = ScanEngine::new(config, 1, false, false);
    engine.load_rules(ruleset);
    let path = pkg.pkg.path.clone();
    engine.scan(&StubLoader::new(vec![pkg]), &[path]).unwrap();
    engine
}

fn assigned_secret(name: &str, value: &str) -> LoadedPackage {
    let mut pb = PackageBuilder::new("x/creds", "main");
    let mut f = pb.file("main.go");
    f.begin_func("main");
    let lit = f.str_lit(value);
    f.define(&[(name, Ty::basic("string"))], vec![lit]);
    f.end_func();
    f.finish();
    pb.into_loaded()
}

#[test]
fn credential_named_assignment_fires() {
    let engine = scan_with(
        ConfigStore::new(),
        assigned_secret("apiToken", "kDh2!x9Q#mW4@zR7bT1$"),
    );
    assert_eq!(engine.issues().len(), 1);
    let issue = &engine.issues()[0];
    assert_eq!(issue.rule_id, "G101");
    assert_eq!(issue.severity, Severity::High);
}

#[test]
fn low_entropy_values_downgrade_to_low_severity() {
    let engine = scan_with(ConfigStore::new(), assigned_secret("password", "aaaa"));
    assert_eq!(engine.issues().len(), 1);
    assert_eq!(engine.issues()[0].severity, Severity::Low);
}

#[test]
fn unrelated_names_do_not_fire() {
    let engine = scan_with(
        ConfigStore::new(),
        assigned_secret("greeting", "kDh2!x9Q#mW4@zR7bT1$"),
    );
    assert!(engine.issues().is_empty());
}

#[test]
fn non_constant_values_do_not_fire() {
    let mut pb = PackageBuilder::new("x/creds", "main");
    let mut f = pb.file("main.go");
    f.import("os");
    f.begin_func("main");
    let key = f.str_lit("TOKEN");
    let env = f.call_pkg("os", "Getenv", vec![key]);
    f.define(&[("apiToken", Ty::basic("string"))], vec![env]);
    f.end_func();
    f.finish();
    let engine = scan_with(ConfigStore::new(), pb.into_loaded());
    assert!(engine.issues().is_empty());
}

#[test]
fn const_specs_fire_like_assignments() {
    let mut pb = PackageBuilder::new("x/creds", "main");
    let mut f = pb.file("main.go");
    f.const_str("dbPassword", "kDh2!x9Q#mW4@zR7bT1$");
    f.finish();
    let engine = scan_with(ConfigStore::new(), pb.into_loaded());
    assert_eq!(engine.issues().len(), 1);
}

#[test]
fn comparisons_against_secrets_fire() {
    let mut pb = PackageBuilder::new("x/creds", "main");
    let mut f = pb.file("main.go");
    f.begin_func("check");
    f.declare_var("password", Ty::basic("string"));
    let ident = f.ident("password");
    let lit = f.str_lit("kDh2!x9Q#mW4@zR7bT1$");
    let cmp = f.binary(BinOp::Eq, ident, lit);
    f.stmt(cmp);
    f.end_func();
    f.finish();
    let engine = scan_with(ConfigStore::new(), pb.into_loaded());
    assert_eq!(engine.issues().len(), 1);
}

#[test]
fn custom_pattern_overrides_the_default() {
    let mut config = ConfigStore::new();
    config.set("G101", serde_json::json!({"pattern": "(?i)launch_code"}));
    let engine = scan_with(config, assigned_secret("launchCode", "kDh2!x9Q#mW4@zR7bT1$"));
    assert!(engine.issues().is_empty());

    let mut config = ConfigStore::new();
    config.set("G101", serde_json::json!({"pattern": "(?i)launch_?code"}));
    let engine = scan_with(config, assigned_secret("launchCode", "kDh2!x9Q#mW4@zR7bT1$"));
    assert_eq!(engine.issues().len(), 1);
}

#[test]
fn ignore_entropy_forces_high_severity() {
    let mut config = ConfigStore::new();
    config.set("G101", serde_json::json!({"ignore_entropy": true}));
    let engine = scan_with(config, assigned_secret("password", "aaaa"));
    assert_eq!(engine.issues()[0].severity, Severity::High);
}
