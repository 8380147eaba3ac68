//! Process-wide memoisation cache.
//!
//! One bounded LRU shared by every consumer, guarded by a single mutex.
//! Keys are a discriminated union per use-case so consumers cannot
//! collide. Capacity is 2^16 entries; insertion evicts the
//! least-recently-used entry.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

/// Cache capacity.
const CAPACITY: usize = 1 << 16;

/// Discriminated cache key; each consumer owns one variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Result of matching a compiled regex (identified by [`next_regex_id`])
    /// against an input string.
    RegexMatch {
        /// Unique id of the compiled regex.
        regex_id: u64,
        /// The matched input.
        input: String,
    },
    /// A rendered type-qualification string.
    TypeQual {
        /// Package path.
        pkg: String,
        /// Type or function name.
        name: String,
        /// Whether the pointer form was requested.
        pointer: bool,
    },
}

/// Values stored in the cache.
#[derive(Debug, Clone)]
pub enum CacheValue {
    /// A boolean verdict (regex matches).
    Bool(bool),
    /// A rendered string (qualification strings).
    Str(String),
}

fn cache() -> &'static Mutex<LruCache<CacheKey, CacheValue>> {
    static CACHE: OnceLock<Mutex<LruCache<CacheKey, CacheValue>>> = OnceLock::new();
    CACHE.get_or_init(|| {
        #[allow(clippy::expect_used)]
        let cap = NonZeroUsize::new(CAPACITY).expect("capacity is non-zero");
        Mutex::new(LruCache::new(cap))
    })
}

/// Hands out unique ids for compiled regexes used in cache keys.
pub fn next_regex_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// Looks up `key`, computing and inserting with `compute` on a miss.
pub fn get_or_insert_with<F>(key: CacheKey, compute: F) -> CacheValue
where
    F: FnOnce() -> CacheValue,
{
    let mut guard = match cache().lock() {
        Ok(g) => g,
        // A poisoned cache only loses memoisation, never correctness.
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(v) = guard.get(&key) {
        return v.clone();
    }
    let v = compute();
    guard.put(key, v.clone());
    v
}

/// Memoised verdict of `regex` (identified by `regex_id`) on `input`.
pub fn regex_match(regex_id: u64, regex: &regex::Regex, input: &str) -> bool {
    let key = CacheKey::RegexMatch {
        regex_id,
        input: input.to_owned(),
    };
    match get_or_insert_with(key, || CacheValue::Bool(regex.is_match(input))) {
        CacheValue::Bool(b) => b,
        CacheValue::Str(_) => false,
    }
}

/// Memoised `pkg.Name` / `*pkg.Name` qualification string.
#[must_use]
pub fn qualify(pkg: &str, name: &str, pointer: bool) -> String {
    let key = CacheKey::TypeQual {
        pkg: pkg.to_owned(),
        name: name.to_owned(),
        pointer,
    };
    match get_or_insert_with(key, || {
        let rendered = if pointer {
            format!("*{pkg}.{name}")
        } else {
            format!("{pkg}.{name}")
        };
        CacheValue::Str(rendered)
    }) {
        CacheValue::Str(s) => s,
        CacheValue::Bool(_) => String::new(),
    }
}
