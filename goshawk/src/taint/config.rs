//! Taint endpoint configuration.
//!
//! Read from the `"taint"` key of the configuration store. Sources
//! introduce taint, sinks raise issues when tainted data reaches a
//! checked argument, sanitizers break the chain.

use crate::taint::ssa::{CalleeRef, TypeRef};
use serde::{Deserialize, Serialize};

/// Default rule id for taint findings; a sink may override it.
pub const DEFAULT_RULE_ID: &str = "G701";

fn default_rule_id() -> String {
    DEFAULT_RULE_ID.to_owned()
}

/// A taint source: a type whose values arrive tainted, or a function
/// whose results do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Declaring package path.
    pub pkg: String,
    /// Type name (type sources) or function name (function sources).
    pub name: String,
    /// Whether the tainted form is a pointer.
    #[serde(default)]
    pub pointer: bool,
    /// `true` marks a function source; `false` a type source.
    #[serde(default)]
    pub function: bool,
}

impl Source {
    /// Whether a parameter of `ty` is tainted by this type source.
    #[must_use]
    pub fn matches_type(&self, ty: &TypeRef) -> bool {
        !self.function && self.pkg == ty.pkg && self.name == ty.name && self.pointer == ty.pointer
    }

    /// Whether a call to `callee` produces tainted results.
    #[must_use]
    pub fn matches_call(&self, callee: &CalleeRef) -> bool {
        self.function && callee.recv.is_none() && self.pkg == callee.pkg && self.name == callee.method
    }
}

/// A taint sink: a callee whose checked arguments must stay clean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sink {
    /// Declaring package path.
    pub pkg: String,
    /// Receiver type for method sinks.
    #[serde(default)]
    pub receiver: Option<String>,
    /// Function or method name.
    pub method: String,
    /// Whether the receiver is a pointer.
    #[serde(default)]
    pub pointer: bool,
    /// Argument indices that must not be tainted; absent checks all.
    #[serde(default)]
    pub check_args: Option<Vec<usize>>,
    /// Rule id attached to issues from this sink.
    #[serde(default = "default_rule_id")]
    pub rule_id: String,
}

impl Sink {
    /// Whether `callee` is this sink.
    #[must_use]
    pub fn matches(&self, callee: &CalleeRef) -> bool {
        self.pkg == callee.pkg
            && self.method == callee.method
            && self.receiver == callee.recv
            && (self.receiver.is_none() || self.pointer == callee.pointer)
    }

    /// Whether argument index `idx` is checked by this sink.
    #[must_use]
    pub fn checks_arg(&self, idx: usize) -> bool {
        match &self.check_args {
            None => true,
            Some(list) => list.contains(&idx),
        }
    }

    /// Rendered callee name for issue messages.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.receiver {
            Some(recv) => format!("{}.{}.{}", self.pkg, recv, self.method),
            None => format!("{}.{}", self.pkg, self.method),
        }
    }
}

/// A sanitizer: a callee whose results are clean regardless of inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sanitizer {
    /// Declaring package path.
    pub pkg: String,
    /// Receiver type for method sanitizers.
    #[serde(default)]
    pub receiver: Option<String>,
    /// Function or method name.
    pub method: String,
    /// Whether the receiver is a pointer.
    #[serde(default)]
    pub pointer: bool,
}

impl Sanitizer {
    /// Whether `callee` is this sanitizer.
    #[must_use]
    pub fn matches(&self, callee: &CalleeRef) -> bool {
        self.pkg == callee.pkg
            && self.method == callee.method
            && self.receiver == callee.recv
            && (self.receiver.is_none() || self.pointer == callee.pointer)
    }
}

/// The full endpoint configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaintConfig {
    /// Taint sources.
    #[serde(default)]
    pub sources: Vec<Source>,
    /// Taint sinks.
    #[serde(default)]
    pub sinks: Vec<Sink>,
    /// Sanitizers.
    #[serde(default)]
    pub sanitizers: Vec<Sanitizer>,
}
