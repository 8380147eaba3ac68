//! Static rule-id to CWE mapping.

use crate::issue::Cwe;
use rustc_hash::FxHashMap;
use std::sync::OnceLock;

fn table() -> &'static FxHashMap<&'static str, u16> {
    static TABLE: OnceLock<FxHashMap<&'static str, u16>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut m = FxHashMap::default();
        m.insert("G101", 798);
        m.insert("G102", 200);
        m.insert("G103", 242);
        m.insert("G104", 703);
        m.insert("G106", 322);
        m.insert("G107", 88);
        m.insert("G108", 200);
        m.insert("G109", 190);
        m.insert("G110", 409);
        m.insert("G112", 400);
        m.insert("G114", 676);
        m.insert("G201", 89);
        m.insert("G202", 89);
        m.insert("G203", 79);
        m.insert("G204", 78);
        m.insert("G301", 276);
        m.insert("G302", 276);
        m.insert("G303", 377);
        m.insert("G304", 22);
        m.insert("G306", 276);
        m.insert("G401", 328);
        m.insert("G402", 295);
        m.insert("G403", 310);
        m.insert("G404", 338);
        m.insert("G501", 327);
        m.insert("G502", 327);
        m.insert("G503", 327);
        m.insert("G504", 327);
        m.insert("G505", 327);
        m.insert("G601", 118);
        m.insert("G701", 20);
        m
    })
}

/// The CWE mapped to `rule_id`, when one exists. Every rule id maps to
/// at most one CWE.
#[must_use]
pub fn get(rule_id: &str) -> Option<Cwe> {
    table().get(rule_id).map(|&id| Cwe::new(id))
}
