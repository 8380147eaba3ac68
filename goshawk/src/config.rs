//! Scan configuration: global options, per-rule settings, and path
//! exclusion rules.
//!
//! The store serialises to JSON with a fixed top-level shape —
//! `{<rule-id>: <any>, ..., "global": <map>}` — and preserves unknown
//! keys. Exclusion rules come from the driver's CLI and are applied
//! after issues are collected, never before walking.

use crate::cache;
use regex::Regex;
use serde_json::{Map, Value};
use std::io::{Read, Write};
use thiserror::Error;

/// Reserved key holding global options.
const GLOBAL_KEY: &str = "global";

/// Options that apply to the whole scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalOption {
    /// Ignore in-source suppression directives entirely.
    Nosec,
    /// An additional directive tag honoured next to the default.
    NoSecAlternative,
    /// Report issues that would have been suppressed.
    ShowIgnored,
    /// Run audit-mode rules and widen lenient checks.
    Audit,
    /// Enable SSA-based taint analysis.
    Ssa,
    /// Skip files carrying the generated-code marker.
    ExcludeGenerated,
    /// Do not fail the build on findings (driver contract).
    NoFail,
}

impl GlobalOption {
    /// The JSON key of this option.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            GlobalOption::Nosec => "nosec",
            GlobalOption::NoSecAlternative => "nosec-alternative",
            GlobalOption::ShowIgnored => "show-ignored",
            GlobalOption::Audit => "audit",
            GlobalOption::Ssa => "ssa",
            GlobalOption::ExcludeGenerated => "exclude-generated",
            GlobalOption::NoFail => "no-fail",
        }
    }
}

/// Configuration failures. Fatal at startup, non-fatal mid-scan.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration was not valid JSON.
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The top level was not an object.
    #[error("configuration must be a JSON object")]
    NotObject,
    /// Writing the configuration failed.
    #[error("could not write configuration: {0}")]
    Io(#[from] std::io::Error),
    /// A CLI exclude entry could not be parsed.
    #[error("invalid exclude rule {entry:?}: {message}")]
    InvalidExclude {
        /// The offending entry.
        entry: String,
        /// Why it was rejected.
        message: String,
    },
}

/// Which rules a path exclusion silences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExcludeTargets {
    /// Every rule (`*`).
    All,
    /// Only the listed rule ids.
    Ids(Vec<String>),
}

/// One path-pattern exclusion.
#[derive(Debug, Clone)]
pub struct PathExcludeRule {
    raw: String,
    pattern: Regex,
    regex_id: u64,
    targets: ExcludeTargets,
}

impl PathExcludeRule {
    /// Compiles a new exclusion rule.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidExclude`] for an empty pattern, an invalid
    /// regex, or an empty id list.
    pub fn new(pattern: &str, targets: ExcludeTargets) -> Result<Self, ConfigError> {
        if pattern.is_empty() {
            return Err(ConfigError::InvalidExclude {
                entry: pattern.to_owned(),
                message: "empty path pattern".to_owned(),
            });
        }
        if let ExcludeTargets::Ids(ids) = &targets {
            if ids.is_empty() {
                return Err(ConfigError::InvalidExclude {
                    entry: pattern.to_owned(),
                    message: "empty rule id list".to_owned(),
                });
            }
        }
        let compiled = Regex::new(pattern).map_err(|e| ConfigError::InvalidExclude {
            entry: pattern.to_owned(),
            message: e.to_string(),
        })?;
        Ok(Self {
            raw: pattern.to_owned(),
            pattern: compiled,
            regex_id: cache::next_regex_id(),
            targets,
        })
    }

    /// The original pattern text.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.raw
    }

    /// The silenced rules.
    #[must_use]
    pub fn targets(&self) -> &ExcludeTargets {
        &self.targets
    }

    fn matches_path(&self, path: &str) -> bool {
        cache::regex_match(self.regex_id, &self.pattern, path)
    }

    fn applies_to(&self, rule_id: &str) -> bool {
        match &self.targets {
            ExcludeTargets::All => true,
            ExcludeTargets::Ids(ids) => ids.iter().any(|id| id == rule_id),
        }
    }
}

/// The configuration store.
#[derive(Debug, Default, Clone)]
pub struct ConfigStore {
    data: Map<String, Value>,
    exclude_rules: Vec<PathExcludeRule>,
}

impl PartialEq for ConfigStore {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl ConfigStore {
    /// Creates a store with an empty global section.
    #[must_use]
    pub fn new() -> Self {
        let mut data = Map::new();
        data.insert(GLOBAL_KEY.to_owned(), Value::Object(Map::new()));
        Self {
            data,
            exclude_rules: Vec::new(),
        }
    }

    /// Sets the configuration blob of one rule.
    pub fn set(&mut self, rule_id: &str, value: Value) {
        self.data.insert(rule_id.to_owned(), value);
    }

    /// The configuration blob of one rule.
    #[must_use]
    pub fn get(&self, rule_id: &str) -> Option<&Value> {
        match self.data.get(rule_id) {
            Some(v) if rule_id != GLOBAL_KEY => Some(v),
            _ => None,
        }
    }

    /// Sets a global option.
    pub fn set_global(&mut self, option: GlobalOption, value: &str) {
        let globals = self
            .data
            .entry(GLOBAL_KEY.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(map) = globals {
            map.insert(option.key().to_owned(), Value::String(value.to_owned()));
        }
    }

    /// A global option's value, coerced to a string on read.
    #[must_use]
    pub fn get_global(&self, option: GlobalOption) -> Option<String> {
        let globals = self.data.get(GLOBAL_KEY)?.as_object()?;
        match globals.get(option.key())? {
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Whether a global option is enabled. Both booleans and the literal
    /// strings `"true"` / `"enabled"` count.
    #[must_use]
    pub fn is_global_enabled(&self, option: GlobalOption) -> bool {
        matches!(
            self.get_global(option).as_deref(),
            Some("true" | "enabled")
        )
    }

    /// Replaces the exclusion rules.
    pub fn set_exclude_rules(&mut self, rules: Vec<PathExcludeRule>) {
        self.exclude_rules = rules;
    }

    /// The active exclusion rules.
    #[must_use]
    pub fn exclude_rules(&self) -> &[PathExcludeRule] {
        &self.exclude_rules
    }

    /// Whether an issue of `rule_id` at `file_path` is excluded.
    /// Backslashes are normalised to forward slashes before matching.
    #[must_use]
    pub fn should_exclude(&self, file_path: &str, rule_id: &str) -> bool {
        let normalized = file_path.replace('\\', "/");
        self.exclude_rules
            .iter()
            .any(|rule| rule.matches_path(&normalized) && rule.applies_to(rule_id))
    }

    /// Loads the store from a JSON reader, replacing current contents.
    /// Unknown keys are preserved.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Json`] on malformed JSON, [`ConfigError::NotObject`]
    /// when the top level is not an object.
    pub fn read_from<R: Read>(&mut self, reader: R) -> Result<(), ConfigError> {
        let value: Value = serde_json::from_reader(reader)?;
        let Value::Object(map) = value else {
            return Err(ConfigError::NotObject);
        };
        self.data = map;
        Ok(())
    }

    /// Writes the store as JSON.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Json`] or [`ConfigError::Io`] when serialisation
    /// or the writer fail.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), ConfigError> {
        serde_json::to_writer(writer, &Value::Object(self.data.clone()))?;
        Ok(())
    }
}

/// Parses the CLI exclusion grammar
/// `pattern:ID[,ID...][;pattern:...]`; `*` means all rules and
/// whitespace is tolerated around every token.
///
/// # Errors
///
/// [`ConfigError::InvalidExclude`] for entries missing a `:`, empty
/// patterns, invalid regexes, or empty/malformed id lists.
pub fn parse_exclude_spec(spec: &str) -> Result<Vec<PathExcludeRule>, ConfigError> {
    let mut rules = Vec::new();
    for entry in spec.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some((pattern, ids)) = entry.rsplit_once(':') else {
            return Err(ConfigError::InvalidExclude {
                entry: entry.to_owned(),
                message: "expected pattern:ID[,ID...]".to_owned(),
            });
        };
        let pattern = pattern.trim();
        let mut parsed = Vec::new();
        let mut wildcard = false;
        for id in ids.split(',') {
            let id = id.trim();
            if id.is_empty() {
                continue;
            }
            if id == "*" {
                wildcard = true;
            } else if is_rule_id(id) {
                parsed.push(id.to_owned());
            } else {
                return Err(ConfigError::InvalidExclude {
                    entry: entry.to_owned(),
                    message: format!("malformed rule id {id:?}"),
                });
            }
        }
        let targets = if wildcard {
            ExcludeTargets::All
        } else {
            ExcludeTargets::Ids(parsed)
        };
        rules.push(PathExcludeRule::new(pattern, targets)?);
    }
    Ok(rules)
}

/// Whether `id` has the `letter digit digit digit` shape of a rule id.
fn is_rule_id(id: &str) -> bool {
    let mut chars = id.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.as_str().len() == 3
        && chars.all(|c| c.is_ascii_digit())
}
