//! Import tracker tests.

use goshawk::ast::Node;
use goshawk::imports::ImportTracker;
use goshawk::testutil::PackageBuilder;

fn tracker_for(build: impl FnOnce(&mut goshawk::testutil::FileBuilder<'_>)) -> ImportTracker {
    let mut pb = PackageBuilder::new("x/imp", "main");
    let mut f = pb.file("main.go");
    build(&mut f);
    f.finish();
    let pkg = pb.build();
    let mut tracker = ImportTracker::new();
    if let Node::File(file) = pkg.ast.node(pkg.files[0].root) {
        tracker.track_file(&pkg.ast, file);
    }
    tracker
}

#[test]
fn plain_imports_use_the_exported_name() {
    let tracker = tracker_for(|f| f.import("crypto/md5"));
    assert_eq!(tracker.imported.get("crypto/md5").map(String::as_str), Some("md5"));
    assert!(tracker.aliased.is_empty());
    assert_eq!(tracker.local_name("crypto/md5"), Some("md5"));
}

#[test]
fn aliased_imports_keep_the_canonical_path() {
    let tracker = tracker_for(|f| f.import_alias("crypto/md5", "m"));
    assert_eq!(tracker.aliased.get("crypto/md5").map(String::as_str), Some("m"));
    assert!(!tracker.imported.contains_key("crypto/md5"));
    assert_eq!(tracker.local_name("crypto/md5"), Some("m"));
}

#[test]
fn blank_imports_are_init_only() {
    let tracker = tracker_for(|f| f.import_blank("net/http/pprof"));
    assert!(tracker.init_only.contains("net/http/pprof"));
    assert!(tracker.local_name("net/http/pprof").is_none());
    assert!(tracker.is_imported("net/http/pprof"));
}

#[test]
fn unsafe_pseudo_package_is_tracked() {
    let tracker = tracker_for(|f| f.import("unsafe"));
    assert_eq!(tracker.imported.get("unsafe").map(String::as_str), Some("unsafe"));
}

#[test]
fn vendored_paths_are_normalised() {
    let tracker = tracker_for(|f| f.import("example.com/app/vendor/crypto/md5"));
    assert!(tracker.imported.contains_key("crypto/md5"));
}
