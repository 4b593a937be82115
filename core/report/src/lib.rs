//! JSON report writer (spec §4.10, §6): the `classify` and `trace` documents.

mod classify_doc;
mod trace_doc;

pub use classify_doc::{build_classify_report, ClassifyReport, ClassifyStatement};
pub use trace_doc::{build_trace_report, TraceModule, TraceReport, TraceStatement};

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use deminify_model::AnalysisError;
use serde::Serialize;

/// Writes `value` as pretty JSON to `path`, matching the run log's
/// expectation that report files are human-diffable (spec §4.10).
///
/// # Errors
/// Returns [`AnalysisError::Io`] if the file cannot be created or written.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), AnalysisError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)
        .map_err(|e| AnalysisError::invariant(format!("failed to write {}: {e}", path.display())))
}
