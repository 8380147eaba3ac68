//! The scanning engine.
//!
//! Packages are loaded on a pool of worker threads and fed over a
//! channel to the main loop, which walks each file sequentially: rules
//! therefore need no locking. A `quit` channel closed on a fatal load
//! error drains the pool before the scan returns. Suppression
//! directives are pushed and popped around each subtree so an outer
//! directive silences every child node.

use crate::ast::{NodeId, Span};
use crate::config::{ConfigStore, GlobalOption};
use crate::frontend::{
    LoadError, LoadedPackage, PackageLoader, ParseError, TypedFile, TypedPackage,
};
use crate::imports::ImportTracker;
use crate::issue::{self, Issue, Suppression, SuppressionKind};
use crate::nosec;
use crate::rules::{Context, RuleSet};
use crate::taint::config::TaintConfig;
use crate::taint::TaintEngine;
use crossbeam_channel::{bounded, unbounded};
use regex::Regex;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, warn};

/// Counters accumulated over one scan, updated only by the main loop.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Metrics {
    /// Files walked.
    pub num_files: usize,
    /// Total lines across walked files.
    pub num_lines: usize,
    /// Issues silenced by suppressions.
    pub num_nosec: usize,
    /// Issues reported.
    pub num_found: usize,
}

/// A scan-aborting failure.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The frontend failed fatally.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// A node subtree with active suppressions, remembered so that issues
/// raised outside the walk (taint analysis) honour the same directives.
#[derive(Debug, Clone)]
struct SuppressedRange {
    file: String,
    span: Span,
    ignores: FxHashMap<String, Suppression>,
}

fn generated_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r"^// Code generated .* DO NOT EDIT\.$").expect("generated-file marker regex")
    })
}

/// Orchestrates package loading, walking, rule dispatch, and issue
/// collection.
pub struct ScanEngine {
    config: ConfigStore,
    ruleset: RuleSet,
    worker_count: usize,
    include_tests: bool,
    track_suppressions: bool,
    passed_values: FxHashMap<String, String>,
    issues: Vec<Issue>,
    metrics: Metrics,
    errors: BTreeMap<String, Vec<ParseError>>,
    suppressed_ranges: Vec<SuppressedRange>,
}

impl ScanEngine {
    /// Creates an engine over `config` with a load pool of
    /// `worker_count` threads.
    #[must_use]
    pub fn new(
        config: ConfigStore,
        worker_count: usize,
        include_tests: bool,
        track_suppressions: bool,
    ) -> Self {
        Self {
            config,
            ruleset: RuleSet::new(),
            worker_count: worker_count.max(1),
            include_tests,
            track_suppressions,
            passed_values: FxHashMap::default(),
            issues: Vec::new(),
            metrics: Metrics::default(),
            errors: BTreeMap::new(),
            suppressed_ranges: Vec::new(),
        }
    }

    /// Installs the rules to dispatch during walks.
    pub fn load_rules(&mut self, ruleset: RuleSet) {
        self.ruleset = ruleset;
    }

    /// Seeds a value rules can observe through the context.
    pub fn set_passed_value(&mut self, key: &str, value: &str) {
        self.passed_values.insert(key.to_owned(), value.to_owned());
    }

    /// Issues collected so far, in reporting order after a scan.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Scan counters.
    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Load and parse diagnostics keyed by package path or file.
    #[must_use]
    pub fn errors(&self) -> &BTreeMap<String, Vec<ParseError>> {
        &self.errors
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Scans every package under the given paths.
    ///
    /// # Errors
    ///
    /// [`ScanError::Load`] when the frontend reports a fatal error; the
    /// worker pool is drained before returning.
    pub fn scan(&mut self, loader: &dyn PackageLoader, paths: &[String]) -> Result<(), ScanError> {
        let lang_version = loader.lang_version();
        let taint_config = self.parse_taint_config();

        let (jobs_tx, jobs_rx) = unbounded::<String>();
        for path in paths {
            // The receiver outlives this loop; a send cannot fail here.
            let _ = jobs_tx.send(path.clone());
        }
        drop(jobs_tx);

        let (results_tx, results_rx) =
            unbounded::<Result<Vec<LoadedPackage>, LoadError>>();
        let (quit_tx, quit_rx) = bounded::<()>(0);
        let mut quit_tx = Some(quit_tx);
        let include_tests = self.include_tests;

        let mut fatal: Option<LoadError> = None;
        std::thread::scope(|scope| {
            for _ in 0..self.worker_count {
                let jobs_rx = jobs_rx.clone();
                let results_tx = results_tx.clone();
                let quit_rx = quit_rx.clone();
                scope.spawn(move || {
                    while let Ok(path) = jobs_rx.recv() {
                        let result = loader.load(&path, include_tests);
                        crossbeam_channel::select! {
                            send(results_tx, result) -> sent => {
                                if sent.is_err() {
                                    break;
                                }
                            }
                            recv(quit_rx) -> _ => break,
                        }
                    }
                });
            }
            drop(results_tx);

            for result in &results_rx {
                match result {
                    Ok(packages) => {
                        for loaded in packages {
                            self.process_package(&loaded, lang_version, taint_config.as_ref());
                        }
                    }
                    Err(LoadError::Build { path, message }) => {
                        debug!(%path, "package failed to build");
                        self.errors.entry(path.clone()).or_default().push(ParseError {
                            file: path.into(),
                            line: 0,
                            column: 0,
                            message,
                        });
                    }
                    Err(err @ LoadError::Fatal(_)) => {
                        fatal = Some(err);
                        // Closing the quit channel tells every worker to
                        // stop at its next send; the scope then joins them.
                        quit_tx.take();
                        break;
                    }
                }
            }
        });

        self.finalize();
        match fatal {
            Some(err) => Err(ScanError::Load(err)),
            None => Ok(()),
        }
    }

    /// Parses the taint configuration from the `"taint"` config key.
    fn parse_taint_config(&self) -> Option<TaintConfig> {
        let raw = self.config.get("taint")?.clone();
        match serde_json::from_value::<TaintConfig>(raw) {
            Ok(cfg) => Some(cfg),
            Err(err) => {
                warn!(%err, "ignoring malformed taint configuration");
                None
            }
        }
    }

    fn process_package(
        &mut self,
        loaded: &LoadedPackage,
        lang_version: crate::frontend::LangVersion,
        taint_config: Option<&TaintConfig>,
    ) {
        let pkg = &loaded.pkg;
        for err in &loaded.parse_errors {
            self.errors
                .entry(err.file.display().to_string())
                .or_default()
                .push(err.clone());
        }

        let exclude_generated = self.config.is_global_enabled(GlobalOption::ExcludeGenerated);
        let nosec_disabled = self.config.is_global_enabled(GlobalOption::Nosec);
        let alt_tag = self.config.get_global(GlobalOption::NoSecAlternative);

        for file in &pkg.files {
            if !file.is_target_language() {
                continue;
            }
            if exclude_generated && is_generated_file(file) {
                debug!(file = %file.path.display(), "skipping generated file");
                continue;
            }
            self.metrics.num_files += 1;
            self.metrics.num_lines += file.line_count(&pkg.ast);
            self.walk_file(pkg, file, lang_version, nosec_disabled, alt_tag.as_deref());
        }

        if self.config.is_global_enabled(GlobalOption::Ssa) {
            if let (Some(cfg), Some(ssa)) = (taint_config, loaded.ssa.as_ref()) {
                self.run_taint(pkg, ssa, cfg);
            }
        }
    }

    fn walk_file(
        &mut self,
        pkg: &TypedPackage,
        file: &TypedFile,
        lang_version: crate::frontend::LangVersion,
        nosec_disabled: bool,
        alt_tag: Option<&str>,
    ) {
        let crate::ast::Node::File(file_node) = pkg.ast.node(file.root) else {
            return;
        };
        let mut imports = ImportTracker::new();
        imports.track_file(&pkg.ast, file_node);

        let ctx = Context {
            ast: &pkg.ast,
            info: &pkg.info,
            file,
            pkg_path: &pkg.path,
            pkg_name: &pkg.name,
            imports,
            config: &self.config,
            lang_version,
            passed_values: self.passed_values.clone(),
        };

        let Self {
            ruleset,
            issues,
            metrics,
            suppressed_ranges,
            track_suppressions,
            ..
        } = self;
        let mut walker = FileWalker {
            ruleset,
            issues,
            metrics,
            suppressed_ranges,
            track_suppressions: *track_suppressions,
            nosec_disabled,
            alt_tag,
            ctx,
        };
        walker.walk(file.root, &FxHashMap::default());
    }

    fn run_taint(&mut self, pkg: &TypedPackage, ssa: &crate::taint::ssa::SsaProgram, cfg: &TaintConfig) {
        let engine = TaintEngine::new(cfg);
        for hit in engine.analyze(ssa) {
            let source = pkg
                .files
                .iter()
                .find(|f| f.path == hit.file)
                .and_then(|f| f.source.as_deref());
            let issue = issue::new_issue_at(
                &hit.file,
                source,
                hit.span,
                &hit.rule_id,
                &hit.details,
                hit.severity,
                hit.confidence,
            );
            let in_source = self.suppression_covering(&issue);
            let external = self
                .ruleset
                .is_rule_suppressed(&issue.rule_id)
                .then(external_suppression);
            let applied: Vec<Suppression> = in_source.into_iter().chain(external).collect();
            if applied.is_empty() {
                self.metrics.num_found += 1;
                self.issues.push(issue);
            } else {
                if applied.iter().any(|s| s.kind == SuppressionKind::InSource) {
                    self.metrics.num_nosec += 1;
                }
                if self.track_suppressions {
                    self.issues.push(issue.with_suppressions(applied));
                }
            }
        }
    }

    /// The in-source suppression covering an issue's position, if any.
    fn suppression_covering(&self, issue: &Issue) -> Option<Suppression> {
        let line = issue.start_line();
        for range in &self.suppressed_ranges {
            if range.file == issue.file && range.span.contains_line(line) {
                if let Some(s) = range
                    .ignores
                    .get(&issue.rule_id)
                    .or_else(|| range.ignores.get(nosec::WILDCARD))
                {
                    return Some(s.clone());
                }
            }
        }
        None
    }

    /// Applies path exclusions, recounts, and sorts for reporting.
    fn finalize(&mut self) {
        let config = &self.config;
        self.issues
            .retain(|i| !config.should_exclude(&i.file, &i.rule_id));
        self.metrics.num_found = self.issues.iter().filter(|i| !i.is_suppressed()).count();
        issue::sort_issues(&mut self.issues);
        for errs in self.errors.values_mut() {
            errs.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.column.cmp(&b.column)));
        }
    }
}

/// Whether the file opens with the generated-code marker.
fn is_generated_file(file: &TypedFile) -> bool {
    let first = file
        .comments
        .first()
        .and_then(|group| group.comments.first());
    match first {
        Some(comment) => comment
            .lines()
            .next()
            .is_some_and(|line| generated_file_re().is_match(line.trim_end())),
        None => false,
    }
}

fn external_suppression() -> Suppression {
    Suppression {
        kind: SuppressionKind::External,
        justification: "Globally suppressed.".to_owned(),
    }
}

/// Walks one file, bracketing each subtree with its suppression map.
struct FileWalker<'a, 'pkg> {
    ruleset: &'a mut RuleSet,
    issues: &'a mut Vec<Issue>,
    metrics: &'a mut Metrics,
    suppressed_ranges: &'a mut Vec<SuppressedRange>,
    track_suppressions: bool,
    nosec_disabled: bool,
    alt_tag: Option<&'a str>,
    ctx: Context<'pkg>,
}

impl FileWalker<'_, '_> {
    fn walk(&mut self, node: NodeId, current: &FxHashMap<String, Suppression>) {
        let ignores = if self.nosec_disabled {
            FxHashMap::default()
        } else {
            let groups = self.ctx.file.comments_for(node);
            nosec::extract_directives(&groups, nosec::DEFAULT_TAG, self.alt_tag)
        };

        // Entering a node with directives pushes the union of the
        // current top and the node's own ignores; leaving pops (the
        // recursion models the stack).
        let merged;
        let effective = if ignores.is_empty() {
            current
        } else {
            let mut union = current.clone();
            union.extend(ignores);
            self.suppressed_ranges.push(SuppressedRange {
                file: self.ctx.file.path.display().to_string(),
                span: self.ctx.ast.span(node),
                ignores: union.clone(),
            });
            merged = union;
            &merged
        };

        self.dispatch(node, effective);

        for child in self.ctx.ast.children(node) {
            self.walk(child, effective);
        }
    }

    fn dispatch(&mut self, node: NodeId, suppressions: &FxHashMap<String, Suppression>) {
        let kind = self.ctx.ast.node(node).kind();
        let indices: Vec<usize> = self.ruleset.registered_for(kind).to_vec();
        for idx in indices {
            let rule = self.ruleset.rule_mut(idx);
            let rule_id = rule.id();
            let ctx = &mut self.ctx;
            let outcome = catch_unwind(AssertUnwindSafe(|| rule.matches(node, ctx)));
            match outcome {
                Err(_) => {
                    let span = self.ctx.ast.span(node);
                    warn!(
                        rule = rule_id,
                        file = %self.ctx.file.path.display(),
                        line = span.start.line,
                        "rule panicked; skipping node"
                    );
                }
                Ok(Err(err)) => {
                    let span = self.ctx.ast.span(node);
                    warn!(
                        rule = rule_id,
                        file = %self.ctx.file.path.display(),
                        line = span.start.line,
                        %err,
                        "rule returned an error"
                    );
                }
                Ok(Ok(None)) => {}
                Ok(Ok(Some(issue))) => self.retain_or_suppress(issue, suppressions),
            }
        }
    }

    fn retain_or_suppress(
        &mut self,
        issue: Issue,
        suppressions: &FxHashMap<String, Suppression>,
    ) {
        let in_source = suppressions
            .get(&issue.rule_id)
            .or_else(|| suppressions.get(nosec::WILDCARD))
            .cloned();
        let external = self
            .ruleset
            .is_rule_suppressed(&issue.rule_id)
            .then(external_suppression);
        let applied: Vec<Suppression> = in_source.into_iter().chain(external).collect();

        if applied.is_empty() {
            self.metrics.num_found += 1;
            self.issues.push(issue);
            return;
        }
        if applied.iter().any(|s| s.kind == SuppressionKind::InSource) {
            self.metrics.num_nosec += 1;
        }
        if self.track_suppressions {
            self.issues.push(issue.with_suppressions(applied));
        }
    }
}
