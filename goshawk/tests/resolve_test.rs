//! Constant folding and call resolution tests.

use goshawk::ast::BinOp;
use goshawk::config::ConfigStore;
use goshawk::frontend::{Signature, Ty};
use goshawk::resolve;
use goshawk::testutil::{context_for, PackageBuilder};

#[test]
fn get_string_concatenates_literals() {
    let mut pb = PackageBuilder::new("x/r", "main");
    let mut f = pb.file("main.go");
    f.begin_func("main");
    let a = f.str_lit("SELECT * ");
    let b = f.str_lit("FROM users");
    let concat = f.binary(BinOp::Add, a, b);
    f.stmt(concat);
    f.end_func();
    f.finish();
    let pkg = pb.build();
    let config = ConfigStore::new();
    let ctx = context_for(&pkg, 0, &config);
    assert_eq!(
        resolve::get_string(&ctx, concat).unwrap(),
        "SELECT * FROM users"
    );
    assert_eq!(
        resolve::concat_string(&ctx, concat).as_deref(),
        Some("SELECT * FROM users")
    );
}

#[test]
fn get_string_chases_identifier_definitions() {
    let mut pb = PackageBuilder::new("x/r", "main");
    let mut f = pb.file("main.go");
    f.const_str("prefix", "api-");
    f.begin_func("main");
    let p = f.ident("prefix");
    let suffix = f.str_lit("key");
    let concat = f.binary(BinOp::Add, p, suffix);
    f.stmt(concat);
    f.end_func();
    f.finish();
    let pkg = pb.build();
    let config = ConfigStore::new();
    let ctx = context_for(&pkg, 0, &config);
    assert_eq!(resolve::get_string(&ctx, concat).unwrap(), "api-key");
}

#[test]
fn variables_do_not_fold() {
    let mut pb = PackageBuilder::new("x/r", "main");
    let mut f = pb.file("main.go");
    f.begin_func("main");
    f.declare_var("user", Ty::basic("string"));
    let lit = f.str_lit("hello ");
    let user = f.ident("user");
    let concat = f.binary(BinOp::Add, lit, user);
    f.stmt(concat);
    f.end_func();
    f.finish();
    let pkg = pb.build();
    let config = ConfigStore::new();
    let ctx = context_for(&pkg, 0, &config);
    assert!(resolve::get_string(&ctx, concat).is_err());
    assert!(!resolve::try_resolve(&ctx, concat));
    let vars = resolve::find_var_identities(&ctx, concat);
    assert_eq!(vars.len(), 1);
}

#[test]
fn calls_never_resolve() {
    let mut pb = PackageBuilder::new("x/r", "main");
    let mut f = pb.file("main.go");
    f.import("os");
    f.begin_func("main");
    let call = f.call_pkg("os", "Getenv", vec![]);
    f.stmt(call);
    f.end_func();
    f.finish();
    let pkg = pb.build();
    let config = ConfigStore::new();
    let ctx = context_for(&pkg, 0, &config);
    assert!(!resolve::try_resolve(&ctx, call));
}

#[test]
fn int_literals_parse_all_radixes() {
    assert_eq!(resolve::parse_int_literal("0600"), Some(0o600));
    assert_eq!(resolve::parse_int_literal("0o750"), Some(0o750));
    assert_eq!(resolve::parse_int_literal("0x1F"), Some(31));
    assert_eq!(resolve::parse_int_literal("0b1010"), Some(10));
    assert_eq!(resolve::parse_int_literal("2048"), Some(2048));
    assert_eq!(resolve::parse_int_literal("1_000"), Some(1000));
    assert_eq!(resolve::parse_int_literal("0"), Some(0));
    assert_eq!(resolve::parse_int_literal("nope"), None);
}

#[test]
fn get_int_reads_octal_permission_bits() {
    let mut pb = PackageBuilder::new("x/r", "main");
    let mut f = pb.file("main.go");
    f.begin_func("main");
    let perm = f.int_lit("0777");
    f.stmt(perm);
    f.end_func();
    f.finish();
    let pkg = pb.build();
    let config = ConfigStore::new();
    let ctx = context_for(&pkg, 0, &config);
    assert_eq!(resolve::get_int(&ctx, perm).unwrap(), 0o777);
}

#[test]
fn call_info_resolves_package_calls_through_aliases() {
    let mut pb = PackageBuilder::new("x/r", "main");
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
    let (qualifier, name) = resolve::get_call_info(&ctx, call).unwrap();
    assert_eq!(qualifier, "crypto/md5");
    assert_eq!(name, "New");
}

#[test]
fn call_info_resolves_method_receiver_types() {
    let mut pb = PackageBuilder::new("x/r", "main");
    let mut f = pb.file("main.go");
    f.begin_func("main");
    f.declare_var("db", Ty::ptr_to("database/sql", "DB"));
    let recv = f.ident("db");
    let q = f.str_lit("SELECT 1");
    let call = f.method_call(recv, "Query", vec![q]);
    f.stmt(call);
    f.end_func();
    f.finish();
    let pkg = pb.build();
    let config = ConfigStore::new();
    let ctx = context_for(&pkg, 0, &config);
    let (qualifier, name) = resolve::get_call_info(&ctx, call).unwrap();
    assert_eq!(qualifier, "*database/sql.DB");
    assert_eq!(name, "Query");
}

#[test]
fn call_info_handles_local_calls() {
    let mut pb = PackageBuilder::new("x/r", "main");
    let mut f = pb.file("main.go");
    f.begin_func("main");
    let callee = f.ident("helper");
    let call = f.call(callee, vec![]);
    f.stmt(call);
    f.end_func();
    f.finish();
    let pkg = pb.build();
    let config = ConfigStore::new();
    let ctx = context_for(&pkg, 0, &config);
    let (qualifier, name) = resolve::get_call_info(&ctx, call).unwrap();
    assert_eq!(qualifier, "main");
    assert_eq!(name, "helper");
}

#[test]
fn call_info_resolves_methods_on_new_t() {
    let mut pb = PackageBuilder::new("x/r", "main");
    let mut f = pb.file("main.go");
    f.import("crypto/tls");
    f.begin_func("main");
    f.declare_builtin_new();
    let new_ident = f.ident("new");
    let ty_expr = f.pkg_sel("tls", "Config");
    let alloc = f.call(new_ident, vec![ty_expr]);
    let call = f.method_call(alloc, "Clone", vec![]);
    f.stmt(call);
    f.end_func();
    f.finish();
    let pkg = pb.build();
    let config = ConfigStore::new();
    let ctx = context_for(&pkg, 0, &config);
    let (qualifier, name) = resolve::get_call_info(&ctx, call).unwrap();
    assert_eq!(qualifier, "crypto/tls.Config");
    assert_eq!(name, "Clone");
}

#[test]
fn user_declared_new_resolves_through_its_result_type() {
    let mut pb = PackageBuilder::new("x/r", "main");
    let mut f = pb.file("main.go");
    f.begin_func("main");
    // A local `new` shadowing the builtin.
    f.declare_func(
        "new",
        Signature {
            params: vec![],
            results: vec![Ty::ptr_to("x/r", "Widget")],
            recv: None,
        },
    );
    let new_ident = f.ident("new");
    let alloc = f.call(new_ident, vec![]);
    let call = f.method_call(alloc, "Render", vec![]);
    f.stmt(call);
    f.end_func();
    f.finish();
    let pkg = pb.build();
    let config = ConfigStore::new();
    let ctx = context_for(&pkg, 0, &config);
    let (qualifier, name) = resolve::get_call_info(&ctx, call).unwrap();
    assert_eq!(qualifier, "*x/r.Widget");
    assert_eq!(name, "Render");
}

#[test]
fn call_object_reports_signatures() {
    let mut pb = PackageBuilder::new("x/r", "main");
    let mut f = pb.file("main.go");
    f.import("os");
    f.begin_func("main");
    let sig = Signature {
        params: vec![Ty::basic("string")],
        results: vec![Ty::basic("error")],
        recv: None,
    };
    let arg = f.str_lit("f");
    let call = f.call_pkg_sig("os", "Remove", sig, vec![arg]);
    f.stmt(call);
    f.end_func();
    f.finish();
    let pkg = pb.build();
    let config = ConfigStore::new();
    let ctx = context_for(&pkg, 0, &config);
    match resolve::get_call_object(&ctx, call) {
        Some(goshawk::frontend::Object::Func { sig, .. }) => assert!(sig.returns_error()),
        other => panic!("expected func object, got {other:?}"),
    }
}

#[test]
fn tuple_definitions_expose_their_producing_call() {
    let mut pb = PackageBuilder::new("x/r", "main");
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
    f.stmt(v);
    f.end_func();
    f.finish();
    let pkg = pb.build();
    let config = ConfigStore::new();
    let ctx = context_for(&pkg, 0, &config);
    let rhs = resolve::ident_tuple_rhs(&ctx, v).unwrap();
    let (pkg_name, func) = resolve::get_call_info(&ctx, rhs).unwrap();
    assert_eq!((pkg_name.as_str(), func.as_str()), ("strconv", "Atoi"));
    // And the plain single-definition chase refuses tuples.
    assert!(resolve::ident_decl_rhs(&ctx, v).is_none());
}
