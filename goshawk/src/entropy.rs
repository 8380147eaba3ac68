//! Entropy estimation for hardcoded-credential detection.
//!
//! A zxcvbn-style estimate in bits: the character-class pool bound,
//! capped by the observed per-character Shannon entropy so repetitive
//! strings never score as strong secrets.

use rustc_hash::FxHashMap;

/// Estimated entropy of `s` in bits.
#[must_use]
pub fn estimate(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    let len = s.chars().count() as f64;
    let pool_bits = len * (pool_size(s) as f64).log2();
    let shannon_bits = len * shannon_per_char(s);
    pool_bits.min(shannon_bits)
}

/// Estimated entropy per character of `s`.
#[must_use]
pub fn per_char(s: &str) -> f64 {
    let len = s.chars().count();
    if len == 0 {
        return 0.0;
    }
    estimate(s) / len as f64
}

/// The size of the smallest conventional character pool covering `s`.
fn pool_size(s: &str) -> u32 {
    let mut lower = false;
    let mut upper = false;
    let mut digit = false;
    let mut symbol = false;
    for c in s.chars() {
        if c.is_ascii_lowercase() {
            lower = true;
        } else if c.is_ascii_uppercase() {
            upper = true;
        } else if c.is_ascii_digit() {
            digit = true;
        } else {
            symbol = true;
        }
    }
    let mut pool = 0;
    if lower {
        pool += 26;
    }
    if upper {
        pool += 26;
    }
    if digit {
        pool += 10;
    }
    if symbol {
        pool += 33;
    }
    pool.max(1)
}

/// Shannon entropy per character over the string's own distribution.
fn shannon_per_char(s: &str) -> f64 {
    let mut counts: FxHashMap<char, u32> = FxHashMap::default();
    let mut total = 0u32;
    for c in s.chars() {
        *counts.entry(c).or_insert(0) += 1;
        total += 1;
    }
    let total = f64::from(total);
    counts
        .values()
        .map(|&n| {
            let p = f64::from(n) / total;
            -p * p.log2()
        })
        .sum()
}
