//! Call list matching tests.

use goshawk::calls::CallList;
use goshawk::config::ConfigStore;
use goshawk::frontend::Ty;
use goshawk::testutil::{context_for, PackageBuilder};

#[test]
fn contains_and_add_all() {
    let mut list = CallList::new();
    list.add("crypto/md5", "New");
    list.add_all("crypto/sha1", ["New", "Sum"]);
    assert!(list.contains("crypto/md5", "New"));
    assert!(list.contains("crypto/sha1", "Sum"));
    assert!(!list.contains("crypto/md5", "Sum"));
}

#[test]
fn pointer_entries_match_both_forms() {
    let mut list = CallList::new();
    list.add("*database/sql.DB", "Query");
    assert!(list.contains_pointer("database/sql.DB", "Query"));
    assert!(list.contains_pointer("*database/sql.DB", "Query"));
    let mut bare = CallList::new();
    bare.add("database/sql.DB", "Query");
    assert!(bare.contains_pointer("*database/sql.DB", "Query"));
}

#[test]
fn call_exprs_match_through_aliases() {
    let mut pb = PackageBuilder::new("x/c", "main");
    let mut f = pb.file("main.go");
    f.import_alias("crypto/md5", "m");
    f.begin_func("main");
    let call = f.call_pkg("m", "New", vec![]);
    f.stmt(call);
    f.end_func();
    f.finish();
    let pkg = pb.build();
    let config = ConfigStore::new();
    let ctx = context_for(&pkg, 0, &config);

    let mut list = CallList::new();
    list.add("crypto/md5", "New");
    let matched = list.contains_call_expr(&ctx, call).unwrap();
    assert_eq!(matched.qualifier, "crypto/md5");
    assert_eq!(matched.name, "New");
}

#[test]
fn qualified_entries_win_over_short_names() {
    let mut pb = PackageBuilder::new("x/c", "main");
    let mut f = pb.file("main.go");
    f.begin_func("main");
    f.declare_var("db", Ty::ptr_to("database/sql", "DB"));
    let recv = f.ident("db");
    let call = f.method_call(recv, "Query", vec![]);
    f.stmt(call);
    f.end_func();
    f.finish();
    let pkg = pb.build();
    let config = ConfigStore::new();
    let ctx = context_for(&pkg, 0, &config);

    let mut list = CallList::new();
    list.add("DB", "Query");
    list.add("*database/sql.DB", "Query");
    let matched = list.contains_call_expr(&ctx, call).unwrap();
    assert_eq!(matched.qualifier, "*database/sql.DB");
}

#[test]
fn short_name_fallback_still_matches() {
    let mut pb = PackageBuilder::new("x/c", "main");
    let mut f = pb.file("main.go");
    f.begin_func("main");
    f.declare_var("db", Ty::ptr_to("database/sql", "DB"));
    let recv = f.ident("db");
    let call = f.method_call(recv, "Query", vec![]);
    f.stmt(call);
    f.end_func();
    f.finish();
    let pkg = pb.build();
    let config = ConfigStore::new();
    let ctx = context_for(&pkg, 0, &config);

    let mut list = CallList::new();
    list.add("DB", "Query");
    let matched = list.contains_call_expr(&ctx, call).unwrap();
    assert_eq!(matched.qualifier, "DB");
}

#[test]
fn pkg_call_expr_requires_the_import() {
    let mut pb = PackageBuilder::new("x/c", "main");
    let mut f = pb.file("main.go");
    f.import("net/http");
    f.begin_func("main");
    let url = f.str_lit("https://example.com");
    let call = f.call_pkg("http", "Get", vec![url]);
    f.stmt(call);
    f.end_func();
    f.finish();
    let pkg = pb.build();
    let config = ConfigStore::new();
    let ctx = context_for(&pkg, 0, &config);

    let mut list = CallList::new();
    list.add("net/http", "Get");
    assert!(list.contains_pkg_call_expr(&ctx, call, false).is_some());

    let mut other = CallList::new();
    other.add("net/smtp", "Get");
    assert!(other.contains_pkg_call_expr(&ctx, call, false).is_none());
}
