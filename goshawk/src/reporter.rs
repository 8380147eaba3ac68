//! The issue-stream contract with the external report renderer.
//!
//! Alternate formats (SARIF, JUnit, CSV, ...) are the driver's concern;
//! this module fixes the JSON shape issues and metrics serialise to.

use crate::engine::Metrics;
use crate::frontend::ParseError;
use crate::issue::Issue;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Accepts the stream of issues and metrics produced by a scan.
pub trait Reporter {
    /// Reports the scan results.
    ///
    /// # Errors
    ///
    /// Propagates any failure of the underlying sink.
    fn report(
        &mut self,
        issues: &[Issue],
        metrics: &Metrics,
        errors: &BTreeMap<String, Vec<ParseError>>,
    ) -> std::io::Result<()>;
}

#[derive(Serialize)]
struct Payload<'a> {
    issues: &'a [Issue],
    stats: &'a Metrics,
    errors: BTreeMap<&'a str, Vec<ErrorRecord<'a>>>,
}

#[derive(Serialize)]
struct ErrorRecord<'a> {
    line: u32,
    column: u32,
    error: &'a str,
}

/// Serialises issues, metrics, and per-file errors as one JSON document.
///
/// # Errors
///
/// Fails when serialisation or the writer fail.
pub fn write_json<W: Write>(
    writer: W,
    issues: &[Issue],
    metrics: &Metrics,
    errors: &BTreeMap<String, Vec<ParseError>>,
) -> std::io::Result<()> {
    let payload = Payload {
        issues,
        stats: metrics,
        errors: errors
            .iter()
            .map(|(file, errs)| {
                (
                    file.as_str(),
                    errs.iter()
                        .map(|e| ErrorRecord {
                            line: e.line,
                            column: e.column,
                            error: e.message.as_str(),
                        })
                        .collect(),
                )
            })
            .collect(),
    };
    serde_json::to_writer_pretty(writer, &payload).map_err(std::io::Error::from)
}

/// A [`Reporter`] writing the JSON document to any writer.
pub struct JsonReporter<W: Write> {
    writer: W,
}

impl<W: Write> JsonReporter<W> {
    /// Creates a reporter over `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(
        &mut self,
        issues: &[Issue],
        metrics: &Metrics,
        errors: &BTreeMap<String, Vec<ParseError>>,
    ) -> std::io::Result<()> {
        write_json(&mut self.writer, issues, metrics, errors)
    }
}
