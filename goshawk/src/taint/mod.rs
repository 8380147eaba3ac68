//! SSA-based taint analysis.
//!
//! A worklist propagates a tainted mark from configured sources along
//! def-use edges to configured sinks; sanitizer calls interrupt the
//! chain. The mark lattice is two-point and the SSA finite, so the
//! worklist drains in O(def-use edges).

/// Endpoint configuration (sources, sinks, sanitizers).
pub mod config;
/// The SSA contract types.
pub mod ssa;

pub use config::{Sanitizer, Sink, Source, TaintConfig};

use crate::ast::{Position, Span};
use crate::issue::{Confidence, Severity};
use rustc_hash::FxHashSet;
use ssa::{Function, SsaProgram, Value, ValueId, ValueKind};
use std::collections::VecDeque;
use std::path::PathBuf;

/// A sink reached by tainted data, before issue construction.
#[derive(Debug, Clone)]
pub struct TaintHit {
    /// Rule id for the issue (per-sink configurable).
    pub rule_id: String,
    /// Issue description.
    pub details: String,
    /// Issue severity.
    pub severity: Severity,
    /// Issue confidence.
    pub confidence: Confidence,
    /// File of the sink call site.
    pub file: PathBuf,
    /// Position of the sink call site.
    pub span: Span,
}

/// The taint propagation engine.
pub struct TaintEngine<'a> {
    cfg: &'a TaintConfig,
}

impl<'a> TaintEngine<'a> {
    /// Creates an engine over the given endpoint configuration.
    #[must_use]
    pub fn new(cfg: &'a TaintConfig) -> Self {
        Self { cfg }
    }

    /// Analyzes every function of the program.
    #[must_use]
    pub fn analyze(&self, program: &SsaProgram) -> Vec<TaintHit> {
        let mut hits = Vec::new();
        for func in &program.functions {
            self.analyze_function(func, &mut hits);
        }
        hits
    }

    fn analyze_function(&self, func: &Function, hits: &mut Vec<TaintHit>) {
        let mut marks: FxHashSet<ValueId> = FxHashSet::default();
        let mut emitted: FxHashSet<ValueId> = FxHashSet::default();
        let mut worklist: VecDeque<ValueId> = VecDeque::new();

        // Seed: parameters of source types, results of source functions.
        for (idx, value) in func.values.iter().enumerate() {
            let id = ValueId(u32::try_from(idx).unwrap_or(u32::MAX));
            if self.is_seed(value) && marks.insert(id) {
                worklist.push_back(id);
            }
        }

        while let Some(v) = worklist.pop_front() {
            for &u in &func.value(v).uses {
                let user = func.value(u);
                if let ValueKind::Call(call) = &user.kind {
                    let sanitized = self
                        .cfg
                        .sanitizers
                        .iter()
                        .any(|s| s.matches(&call.callee));
                    // Sanitizer match takes precedence over sink match at
                    // the same callee.
                    if !sanitized {
                        self.check_sink(func, u, v, hits, &mut emitted);
                    }
                    if marks.contains(&u) {
                        continue;
                    }
                    if sanitized {
                        continue;
                    }
                    if call.args.iter().any(|a| marks.contains(a)) {
                        marks.insert(u);
                        worklist.push_back(u);
                    }
                } else {
                    if marks.contains(&u) {
                        continue;
                    }
                    if user.kind.operands().iter().any(|o| marks.contains(o)) {
                        marks.insert(u);
                        worklist.push_back(u);
                    }
                }
            }
        }
    }

    /// Whether `value`'s producing construct matches a source. A type
    /// source taints every parameter and field read of that type; a
    /// function source taints its call results.
    fn is_seed(&self, value: &Value) -> bool {
        match &value.kind {
            ValueKind::Param { .. }
            | ValueKind::Field { .. }
            | ValueKind::FieldAddr { .. } => value
                .ty
                .as_ref()
                .is_some_and(|ty| self.cfg.sources.iter().any(|s| s.matches_type(ty))),
            ValueKind::Call(call) => self
                .cfg
                .sources
                .iter()
                .any(|s| s.matches_call(&call.callee)),
            _ => false,
        }
    }

    /// Emits a hit when the newly tainted `tainted` feeds a checked
    /// argument of a sink call. Multiple sinks matching one call produce
    /// one issue, deduplicated on the call's value identity.
    fn check_sink(
        &self,
        func: &Function,
        call_id: ValueId,
        tainted: ValueId,
        hits: &mut Vec<TaintHit>,
        emitted: &mut FxHashSet<ValueId>,
    ) {
        let value = func.value(call_id);
        let ValueKind::Call(call) = &value.kind else {
            return;
        };
        let Some(sink) = self.cfg.sinks.iter().find(|s| s.matches(&call.callee)) else {
            return;
        };
        let fires = call
            .args
            .iter()
            .enumerate()
            .any(|(idx, &arg)| arg == tainted && sink.checks_arg(idx));
        if !fires || !emitted.insert(call_id) {
            return;
        }
        let span = value
            .span
            .unwrap_or_else(|| Span::new(Position::new(0, 0), Position::new(0, 0)));
        hits.push(TaintHit {
            rule_id: sink.rule_id.clone(),
            details: format!(
                "tainted data reaches sensitive sink {}",
                sink.display_name()
            ),
            severity: Severity::High,
            confidence: Confidence::Medium,
            file: func.file.clone(),
            span,
        });
    }
}
