//! Taint engine tests: source to sink propagation, sanitizers, dedup.

use goshawk::config::{ConfigStore, GlobalOption};
use goshawk::engine::ScanEngine;
use goshawk::rules::registry;
use goshawk::taint::ssa::{CalleeRef, TypeRef};
use goshawk::taint::{Sanitizer, Sink, Source, TaintConfig, TaintEngine};
use goshawk::testutil::{ssa_program, PackageBuilder, SsaFunctionBuilder, StubLoader};

fn request_source() -> Source {
    Source {
        pkg: "net/http".to_owned(),
        name: "Request".to_owned(),
        pointer: true,
        function: false,
    }
}

fn db_query_sink() -> Sink {
    Sink {
        pkg: "database/sql".to_owned(),
        receiver: Some("DB".to_owned()),
        method: "Query".to_owned(),
        pointer: true,
        check_args: Some(vec![1]),
        rule_id: "G701".to_owned(),
    }
}

/// `r.URL.Query().Get("q")` flowing into `db.Query(...)`. The receiver
/// is argument zero of a method call.
fn handler_ssa(sanitize: bool) -> goshawk::taint::ssa::SsaProgram {
    let mut b = SsaFunctionBuilder::new("x/web", "handler", "handler.go");
    let db = b.param("db", TypeRef::new("database/sql", "DB", true));
    let r = b.param("r", TypeRef::new("net/http", "Request", true));
    let url = b.field(r, "URL");
    let query = b.call(
        CalleeRef::method("net/url", "URL", "Query", true),
        vec![url],
        8,
    );
    let key = b.constant("\"q\"");
    let mut value = b.call(
        CalleeRef::method("net/url", "Values", "Get", false),
        vec![query, key],
        9,
    );
    if sanitize {
        let from = b.constant("\"'\"");
        let to = b.constant("\"\"");
        value = b.call(
            CalleeRef::func("strings", "ReplaceAll"),
            vec![value, from, to],
            10,
        );
    }
    b.call(
        CalleeRef::method("database/sql", "DB", "Query", true),
        vec![db, value],
        12,
    );
    ssa_program(vec![b.finish()])
}

#[test]
fn tainted_request_reaches_query_sink() {
    let cfg = TaintConfig {
        sources: vec![request_source()],
        sinks: vec![db_query_sink()],
        sanitizers: vec![],
    };
    let hits = TaintEngine::new(&cfg).analyze(&handler_ssa(false));
    assert_eq!(hits.len(), 1);
    let hit = &hits[0];
    assert_eq!(hit.rule_id, "G701");
    assert_eq!(hit.span.start.line, 12);
    assert!(hit.details.contains("database/sql.DB.Query"));
}

#[test]
fn sanitizer_on_path_suppresses_the_sink() {
    let cfg = TaintConfig {
        sources: vec![request_source()],
        sinks: vec![db_query_sink()],
        sanitizers: vec![Sanitizer {
            pkg: "strings".to_owned(),
            receiver: None,
            method: "ReplaceAll".to_owned(),
            pointer: false,
        }],
    };
    let hits = TaintEngine::new(&cfg).analyze(&handler_ssa(true));
    assert!(hits.is_empty());
}

#[test]
fn unchecked_argument_positions_do_not_fire() {
    // Taint reaches the receiver (index 0), but only index 1 is checked.
    let mut b = SsaFunctionBuilder::new("x/web", "handler", "handler.go");
    let r = b.param("r", TypeRef::new("net/http", "Request", true));
    let clean = b.constant("\"SELECT 1\"");
    b.call(
        CalleeRef::method("database/sql", "DB", "Query", true),
        vec![r, clean],
        5,
    );
    let cfg = TaintConfig {
        sources: vec![request_source()],
        sinks: vec![db_query_sink()],
        sanitizers: vec![],
    };
    let hits = TaintEngine::new(&cfg).analyze(&ssa_program(vec![b.finish()]));
    assert!(hits.is_empty());
}

#[test]
fn absent_check_args_checks_every_argument() {
    let mut b = SsaFunctionBuilder::new("x/web", "handler", "handler.go");
    let r = b.param("r", TypeRef::new("net/http", "Request", true));
    let clean = b.constant("\"SELECT 1\"");
    b.call(
        CalleeRef::method("database/sql", "DB", "Query", true),
        vec![r, clean],
        5,
    );
    let mut sink = db_query_sink();
    sink.check_args = None;
    let cfg = TaintConfig {
        sources: vec![request_source()],
        sinks: vec![sink],
        sanitizers: vec![],
    };
    let hits = TaintEngine::new(&cfg).analyze(&ssa_program(vec![b.finish()]));
    assert_eq!(hits.len(), 1);
}

#[test]
fn fields_of_a_source_type_seed_on_their_own() {
    // The request lives on a handler struct rather than arriving as a
    // parameter; the field read itself matches the type source.
    let mut b = SsaFunctionBuilder::new("x/web", "serve", "serve.go");
    let handler = b.param("h", TypeRef::new("x/web", "handler", true));
    let req = b.field_typed(handler, "req", TypeRef::new("net/http", "Request", true));
    let uri = b.field(req, "RequestURI");
    let db = b.param("db", TypeRef::new("database/sql", "DB", true));
    b.call(
        CalleeRef::method("database/sql", "DB", "Query", true),
        vec![db, uri],
        9,
    );
    let cfg = TaintConfig {
        sources: vec![request_source()],
        sinks: vec![db_query_sink()],
        sanitizers: vec![],
    };
    let hits = TaintEngine::new(&cfg).analyze(&ssa_program(vec![b.finish()]));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].span.start.line, 9);
}

#[test]
fn phi_nodes_propagate_any_tainted_edge() {
    let mut b = SsaFunctionBuilder::new("x/web", "pick", "pick.go");
    let r = b.param("r", TypeRef::new("net/http", "Request", true));
    let tainted = b.field(r, "RequestURI");
    let clean = b.constant("\"static\"");
    let joined = b.phi(vec![clean, tainted]);
    let db = b.param("db", TypeRef::new("database/sql", "DB", true));
    b.call(
        CalleeRef::method("database/sql", "DB", "Query", true),
        vec![db, joined],
        7,
    );
    let cfg = TaintConfig {
        sources: vec![request_source()],
        sinks: vec![db_query_sink()],
        sanitizers: vec![],
    };
    let hits = TaintEngine::new(&cfg).analyze(&ssa_program(vec![b.finish()]));
    assert_eq!(hits.len(), 1);
}

#[test]
fn function_sources_taint_their_results() {
    let mut b = SsaFunctionBuilder::new("x/cli", "run", "run.go");
    let input = b.call(CalleeRef::func("os", "Getenv"), vec![], 3);
    let db = b.param("db", TypeRef::new("database/sql", "DB", true));
    b.call(
        CalleeRef::method("database/sql", "DB", "Query", true),
        vec![db, input],
        4,
    );
    let cfg = TaintConfig {
        sources: vec![Source {
            pkg: "os".to_owned(),
            name: "Getenv".to_owned(),
            pointer: false,
            function: true,
        }],
        sinks: vec![db_query_sink()],
        sanitizers: vec![],
    };
    let hits = TaintEngine::new(&cfg).analyze(&ssa_program(vec![b.finish()]));
    assert_eq!(hits.len(), 1);
}

#[test]
fn overlapping_sinks_produce_one_issue_per_call_site() {
    let mut b = SsaFunctionBuilder::new("x/web", "handler", "handler.go");
    let r = b.param("r", TypeRef::new("net/http", "Request", true));
    let db = b.param("db", TypeRef::new("database/sql", "DB", true));
    let uri = b.field(r, "RequestURI");
    b.call(
        CalleeRef::method("database/sql", "DB", "Query", true),
        vec![db, uri],
        6,
    );
    let broad = Sink {
        check_args: None,
        ..db_query_sink()
    };
    let cfg = TaintConfig {
        sources: vec![request_source()],
        sinks: vec![db_query_sink(), broad],
        sanitizers: vec![],
    };
    let hits = TaintEngine::new(&cfg).analyze(&ssa_program(vec![b.finish()]));
    assert_eq!(hits.len(), 1);
}

#[test]
fn engine_runs_taint_when_ssa_enabled() {
    let mut pb = PackageBuilder::new("x/web", "web");
    let mut f = pb.file("handler.go");
    f.begin_func("handler");
    f.end_func();
    f.finish();
    let loaded = pb.into_loaded_with_ssa(handler_ssa(false));

    let mut config = ConfigStore::new();
    config.set_global(GlobalOption::Ssa, "true");
    config.set(
        "taint",
        serde_json::json!({
            "sources": [{"pkg": "net/http", "name": "Request", "pointer": true}],
            "sinks": [{
                "pkg": "database/sql",
                "receiver": "DB",
                "method": "Query",
                "pointer": true,
                "check_args": [1]
            }]
        }),
    );
    let ruleset = registry::generate(&config, false, &[]);
    let mut engine = ScanEngine::new(config, 1, false, false);
    engine.load_rules(ruleset);
    engine
        .scan(&StubLoader::new(vec![loaded]), &["x/web".to_owned()])
        .unwrap();

    let issues = engine.issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].rule_id, "G701");
    assert_eq!(issues[0].cwe.as_ref().unwrap().id, "20");
    assert_eq!(issues[0].line, "12");
}

#[test]
fn engine_skips_taint_when_ssa_disabled() {
    let mut pb = PackageBuilder::new("x/web", "web");
    let mut f = pb.file("handler.go");
    f.begin_func("handler");
    f.end_func();
    f.finish();
    let loaded = pb.into_loaded_with_ssa(handler_ssa(false));

    let mut config = ConfigStore::new();
    config.set(
        "taint",
        serde_json::json!({
            "sources": [{"pkg": "net/http", "name": "Request", "pointer": true}],
            "sinks": [{"pkg": "database/sql", "receiver": "DB", "method": "Query", "pointer": true}]
        }),
    );
    let ruleset = registry::generate(&config, false, &[]);
    let mut engine = ScanEngine::new(config, 1, false, false);
    engine.load_rules(ruleset);
    engine
        .scan(&StubLoader::new(vec![loaded]), &["x/web".to_owned()])
        .unwrap();
    assert!(engine.issues().is_empty());
}

#[test]
fn nosec_range_covers_taint_issues() {
    // The walked file carries a wildcard directive on a block spanning
    // the sink's line; the taint issue is filtered like any other.
    let mut pb = PackageBuilder::new("x/web", "web");
    let mut f = pb.file("handler.go");
    f.begin_func("handler");
    f.begin_block();
    for _ in 0..14 {
        let lit = f.str_lit("padding");
        f.stmt(lit);
    }
    let block = f.end_block();
    f.attach_comment(block, "// #nosec");
    f.end_func();
    f.finish();
    let loaded = pb.into_loaded_with_ssa(handler_ssa(false));

    let mut config = ConfigStore::new();
    config.set_global(GlobalOption::Ssa, "true");
    config.set(
        "taint",
        serde_json::json!({
            "sources": [{"pkg": "net/http", "name": "Request", "pointer": true}],
            "sinks": [{
                "pkg": "database/sql",
                "receiver": "DB",
                "method": "Query",
                "pointer": true,
                "check_args": [1]
            }]
        }),
    );
    let ruleset = registry::generate(&config, false, &[]);
    let mut engine = ScanEngine::new(config, 1, false, false);
    engine.load_rules(ruleset);
    engine
        .scan(&StubLoader::new(vec![loaded]), &["x/web".to_owned()])
        .unwrap();
    assert!(engine.issues().is_empty());
    assert_eq!(engine.metrics().num_nosec, 1);
}
