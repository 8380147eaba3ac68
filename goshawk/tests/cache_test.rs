//! Shared memoisation cache tests.

use goshawk::cache::{self, CacheKey, CacheValue};

#[test]
fn qualification_strings_render_pointer_forms() {
    assert_eq!(cache::qualify("crypto/tls", "Config", false), "crypto/tls.Config");
    assert_eq!(cache::qualify("net/http", "Request", true), "*net/http.Request");
    // Second lookup is served from the cache and must agree.
    assert_eq!(cache::qualify("crypto/tls", "Config", false), "crypto/tls.Config");
}

#[test]
fn regex_ids_are_unique() {
    let a = cache::next_regex_id();
    let b = cache::next_regex_id();
    assert_ne!(a, b);
}

#[test]
fn regex_match_verdicts_are_memoised_per_regex() {
    let re = regex::Regex::new("^cmd/").unwrap();
    let id = cache::next_regex_id();
    assert!(cache::regex_match(id, &re, "cmd/tool/main.go"));
    assert!(cache::regex_match(id, &re, "cmd/tool/main.go"));
    assert!(!cache::regex_match(id, &re, "pkg/lib.go"));

    // A different regex id with the same input is a distinct key.
    let never = regex::Regex::new("^$").unwrap();
    let other = cache::next_regex_id();
    assert!(!cache::regex_match(other, &never, "cmd/tool/main.go"));
}

#[test]
fn discriminated_keys_do_not_collide() {
    let key = CacheKey::TypeQual {
        pkg: "p".to_owned(),
        name: "T".to_owned(),
        pointer: false,
    };
    let value = cache::get_or_insert_with(key.clone(), || CacheValue::Str("p.T".to_owned()));
    assert!(matches!(value, CacheValue::Str(s) if s == "p.T"));
    let again = cache::get_or_insert_with(key, || CacheValue::Str("other".to_owned()));
    assert!(matches!(again, CacheValue::Str(s) if s == "p.T"));
}
