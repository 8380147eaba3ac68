//! Tests for unsafe usage, import blocklists, conversions, bombs, and
//! range aliasing (G103, G108, G109, G110, G5xx, G601).

use goshawk::config::{ConfigStore, GlobalOption};
use goshawk::engine::ScanEngine;
use goshawk::frontend::{LangVersion, LoadedPackage, Ty};
use goshawk::rules::registry::{self, RuleFilter};
use goshawk::testutil::{PackageBuilder, StubLoader};

fn scan_full(config: ConfigStore, rules: &[&str], pkg: LoadedPackage, version: LangVersion) -> ScanEngine {
    let ruleset = registry::generate(&config, false, &[RuleFilter::include(rules.iter().copied())]);
    let mut engine = ScanEngine::new(config, 1, false, false);
    engine.load_rules(ruleset);
    let path = pkg.pkg.path.clone();
    let loader = StubLoader::new(vec![pkg]).with_version(version);
    engine.scan(&loader, &[path]).unwrap();
    engine
}

fn scan(rules: &[&str], pkg: LoadedPackage) -> ScanEngine {
    scan_full(ConfigStore::new(), rules, pkg, LangVersion::new(1, 22))
}

#[test]
fn unsafe_selector_and_import_fire_g103() {
    let mut pb = PackageBuilder::new("x/unsafe", "main");
    let mut f = pb.file("main.go");
    f.import("unsafe");
    f.begin_func("main");
    f.declare_var("p", Ty::basic("uintptr"));
    let arg = f.ident("p");
    let call = f.call_pkg("unsafe", "Pointer", vec![arg]);
    f.stmt(call);
    f.end_func();
    f.finish();
    let engine = scan(&["G103"], pb.into_loaded());
    // Once for the import spec, once for the selector use.
    assert_eq!(engine.issues().len(), 2);
    assert!(engine.issues().iter().all(|i| i.rule_id == "G103"));
}

#[test]
fn pprof_import_fires_g108_by_default() {
    let mut pb = PackageBuilder::new("x/prof", "main");
    let mut f = pb.file("main.go");
    f.import_blank("net/http/pprof");
    f.begin_func("main");
    f.end_func();
    f.finish();
    let engine = scan(&["G108"], pb.into_loaded());
    assert_eq!(engine.issues().len(), 1);
    assert_eq!(engine.issues()[0].rule_id, "G108");
}

#[test]
fn crypto_import_blocklist_is_audit_only() {
    let build = || {
        let mut pb = PackageBuilder::new("x/legacy", "main");
        let mut f = pb.file("main.go");
        f.import("crypto/md5");
        f.import("crypto/rc4");
        f.begin_func("main");
        f.end_func();
        f.finish();
        pb.into_loaded()
    };

    let quiet = scan(&["G501", "G503"], build());
    assert!(quiet.issues().is_empty());

    let mut config = ConfigStore::new();
    config.set_global(GlobalOption::Audit, "true");
    let audited = scan_full(config, &["G501", "G503"], build(), LangVersion::new(1, 22));
    let mut ids: Vec<&str> = audited.issues().iter().map(|i| i.rule_id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["G501", "G503"]);
}

#[test]
fn atoi_conversion_fires_g109_under_audit() {
    let build = || {
        let mut pb = PackageBuilder::new("x/conv", "main");
        let mut f = pb.file("main.go");
        f.import("strconv");
        f.begin_func("main");
        let input = f.str_lit("42");
        let atoi = f.call_pkg("strconv", "Atoi", vec![input]);
        f.define(
            &[("v", Ty::basic("int")), ("err", Ty::basic("error"))],
            vec![atoi],
        );
        let v = f.ident("v");
        let conv_fn = f.ident("int32");
        let conv = f.call(conv_fn, vec![v]);
        f.stmt(conv);
        f.end_func();
        f.finish();
        pb.into_loaded()
    };

    // Audit-only: silent by default.
    let quiet = scan(&["G109"], build());
    assert!(quiet.issues().is_empty());

    let mut config = ConfigStore::new();
    config.set_global(GlobalOption::Audit, "true");
    let audited = scan_full(config, &["G109"], build(), LangVersion::new(1, 22));
    assert_eq!(audited.issues().len(), 1);
    assert_eq!(audited.issues()[0].rule_id, "G109");
}

#[test]
fn gzip_copy_fires_g110() {
    let mut pb = PackageBuilder::new("x/zip", "main");
    let mut f = pb.file("main.go");
    f.import("compress/gzip");
    f.import("io");
    f.import("os");
    f.begin_func("main");
    f.declare_var("src", Ty::named("io", "Reader"));
    let raw = f.ident("src");
    let reader_call = f.call_pkg("gzip", "NewReader", vec![raw]);
    f.define(
        &[
            ("zr", Ty::ptr_to("compress/gzip", "Reader")),
            ("err", Ty::basic("error")),
        ],
        vec![reader_call],
    );
    let dst = f.pkg_sel("os", "Stdout");
    let zr = f.ident("zr");
    let copy = f.call_pkg("io", "Copy", vec![dst, zr]);
    f.stmt(copy);
    f.end_func();
    f.finish();
    let engine = scan(&["G110"], pb.into_loaded());
    assert_eq!(engine.issues().len(), 1);
    assert_eq!(engine.issues()[0].rule_id, "G110");
}

#[test]
fn plain_copy_passes_g110() {
    let mut pb = PackageBuilder::new("x/zip", "main");
    let mut f = pb.file("main.go");
    f.import("io");
    f.import("os");
    f.begin_func("main");
    f.declare_var("src", Ty::named("io", "Reader"));
    let dst = f.pkg_sel("os", "Stdout");
    let src = f.ident("src");
    let copy = f.call_pkg("io", "Copy", vec![dst, src]);
    f.stmt(copy);
    f.end_func();
    f.finish();
    let engine = scan(&["G110"], pb.into_loaded());
    assert!(engine.issues().is_empty());
}

#[test]
fn range_value_aliasing_fires_g601_before_1_22() {
    let mut pb = PackageBuilder::new("x/loop", "main");
    let mut f = pb.file("main.go");
    f.begin_func("main");
    f.declare_var("items", Ty::Slice(Box::new(Ty::basic("string"))));
    let items = f.ident("items");
    f.begin_range(None, Some("item"), items);
    let item = f.ident("item");
    let addr = f.addr_of(item);
    f.stmt(addr);
    f.end_range();
    f.end_func();
    f.finish();
    let engine = scan_full(
        ConfigStore::new(),
        &["G601"],
        pb.into_loaded(),
        LangVersion::new(1, 21),
    );
    assert_eq!(engine.issues().len(), 1);
    assert_eq!(engine.issues()[0].rule_id, "G601");
}

#[test]
fn range_value_aliasing_is_silent_from_1_22() {
    let mut pb = PackageBuilder::new("x/loop", "main");
    let mut f = pb.file("main.go");
    f.begin_func("main");
    f.declare_var("items", Ty::Slice(Box::new(Ty::basic("string"))));
    let items = f.ident("items");
    f.begin_range(None, Some("item"), items);
    let item = f.ident("item");
    let addr = f.addr_of(item);
    f.stmt(addr);
    f.end_range();
    f.end_func();
    f.finish();
    let engine = scan_full(
        ConfigStore::new(),
        &["G601"],
        pb.into_loaded(),
        LangVersion::new(1, 22),
    );
    assert!(engine.issues().is_empty());
}

#[test]
fn taking_the_address_of_other_variables_passes_g601() {
    let mut pb = PackageBuilder::new("x/loop", "main");
    let mut f = pb.file("main.go");
    f.begin_func("main");
    f.declare_var("items", Ty::Slice(Box::new(Ty::basic("string"))));
    f.declare_var("other", Ty::basic("string"));
    let items = f.ident("items");
    f.begin_range(None, Some("item"), items);
    let other = f.ident("other");
    let addr = f.addr_of(other);
    f.stmt(addr);
    f.end_range();
    f.end_func();
    f.finish();
    let engine = scan_full(
        ConfigStore::new(),
        &["G601"],
        pb.into_loaded(),
        LangVersion::new(1, 21),
    );
    assert!(engine.issues().is_empty());
}
