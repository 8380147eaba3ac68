//! Subprocess rule tests (G204).

use goshawk::config::ConfigStore;
use goshawk::engine::ScanEngine;
use goshawk::frontend::{LoadedPackage, Ty};
use goshawk::rules::registry::{self, RuleFilter};
use goshawk::testutil::{PackageBuilder, StubLoader};

fn scan(pkg: LoadedPackage) -> ScanEngine {
    let config = ConfigStore::new();
    let ruleset = registry::generate(&config, false, &[RuleFilter::include(["G204"])]);
    let mut engine = ScanEngine::new(config, 1, false, false);
    engine.load_rules(ruleset);
    let path = pkg.pkg.path.clone();
    engine.scan(&StubLoader::new(vec![pkg]), &[path]).unwrap();
    engine
}

#[test]
fn variable_command_arguments_fire() {
    let mut pb = PackageBuilder::new("x/exec", "main");
    let mut f = pb.file("main.go");
    f.import("os/exec");
    f.begin_func("main");
    f.declare_var("tool", Ty::basic("string"));
    let tool = f.ident("tool");
    let call = f.call_pkg("exec", "Command", vec![tool]);
    f.stmt(call);
    f.end_func();
    f.finish();
    let engine = scan(pb.into_loaded());
    assert_eq!(engine.issues().len(), 1);
    assert_eq!(engine.issues()[0].rule_id, "G204");
}

#[test]
fn constant_command_lines_pass() {
    let mut pb = PackageBuilder::new("x/exec", "main");
    let mut f = pb.file("main.go");
    f.import("os/exec");
    f.begin_func("main");
    let bin = f.str_lit("/usr/bin/uptime");
    let call = f.call_pkg("exec", "Command", vec![bin]);
    f.stmt(call);
    f.end_func();
    f.finish();
    let engine = scan(pb.into_loaded());
    assert!(engine.issues().is_empty());
}

#[test]
fn command_context_skips_the_context_argument() {
    let mut pb = PackageBuilder::new("x/exec", "main");
    let mut f = pb.file("main.go");
    f.import("os/exec");
    f.begin_func("main");
    f.declare_var("ctx", Ty::named("context", "Context"));
    let ctx_arg = f.ident("ctx");
    let bin = f.str_lit("/usr/bin/uptime");
    let call = f.call_pkg("exec", "CommandContext", vec![ctx_arg, bin]);
    f.stmt(call);
    f.end_func();
    f.finish();
    let engine = scan(pb.into_loaded());
    assert!(engine.issues().is_empty());
}

#[test]
fn nested_call_arguments_fire() {
    let mut pb = PackageBuilder::new("x/exec", "main");
    let mut f = pb.file("main.go");
    f.import("os/exec");
    f.import("os");
    f.begin_func("main");
    let env_key = f.str_lit("SHELL");
    let shell = f.call_pkg("os", "Getenv", vec![env_key]);
    let call = f.call_pkg("exec", "Command", vec![shell]);
    f.stmt(call);
    f.end_func();
    f.finish();
    let engine = scan(pb.into_loaded());
    assert_eq!(engine.issues().len(), 1);
}
