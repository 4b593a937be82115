//! End-to-end orchestration of the bundle analysis engine (spec §2).
//!
//! `analyze` is the single entry point: source bytes in, annotated output
//! and both JSON reports out. Every stage is a pure function of its
//! inputs (spec §5); this crate only sequences them and asserts the
//! invariants that tie one stage's output to the next stage's precondition.

use deminify_model::{AnalysisError, ByteSpan, Statement};
use deminify_report::{ClassifyReport, TraceReport};
use tracing::debug_span;

/// The only tunables the engine exposes (spec §6): everything else
/// (Jaccard threshold, preamble cutoff, preamble-signal count) is a fixed
/// design constant inside the owning crate.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_file: String,
    pub ecma_version: u16,
}

impl RunConfig {
    #[must_use]
    pub fn new(input_file: impl Into<String>) -> Self {
        Self { input_file: input_file.into(), ecma_version: 2022 }
    }
}

#[derive(Debug)]
pub struct AnalysisOutput {
    pub annotated_source: String,
    pub classify: ClassifyReport,
    pub trace: TraceReport,
}

/// Runs the full pipeline over `source` (spec §2's data flow).
///
/// # Errors
/// Propagates [`AnalysisError::Input`]/[`AnalysisError::Parse`] from the
/// parser adapter, and [`AnalysisError::Invariant`] if any internal
/// invariant (statement ordering, module partition) is violated.
pub fn analyze(source: &str, config: &RunConfig) -> Result<AnalysisOutput, AnalysisError> {
    let parsed = debug_span!("parse").in_scope(|| deminify_source::parse(source, config.ecma_version))?;
    assert_statement_order(&parsed.spans)?;

    let helpers = debug_span!("detect_helpers")
        .in_scope(|| deminify_helpers::detect(&parsed.items, |span| parsed.text(span)));

    let classes = debug_span!("classify").in_scope(|| deminify_classify::classify(&parsed.items, &helpers));

    let first_statement_slices: Vec<&str> =
        parsed.spans.iter().take(5).map(|span| parsed.slice(*span)).collect();
    let fingerprint = debug_span!("fingerprint")
        .in_scope(|| deminify_classify::fingerprint(source, !helpers.is_empty(), &first_statement_slices));

    let names_per_statement: Vec<Vec<String>> =
        debug_span!("definition_map").in_scope(|| parsed.items.iter().map(deminify_graph::statement_names).collect());
    let definitions = deminify_graph::build_definitions(&names_per_statement);

    let references = debug_span!("reference_graph")
        .in_scope(|| deminify_graph::build_references(&parsed.items, &definitions));

    let initial_wrap_kinds: Vec<_> = classes.iter().map(|c| c.wrap_kind).collect();
    let categories: Vec<String> = classes.into_iter().map(|c| c.category).collect();

    let identification = debug_span!("identify_modules").in_scope(|| {
        deminify_modules::identify(
            &parsed.items,
            &parsed.spans,
            &parsed.lines,
            &initial_wrap_kinds,
            &categories,
            &names_per_statement,
            &references,
            &helpers,
        )
    })?;

    let statements: Vec<Statement> = (0..parsed.len())
        .map(|i| Statement {
            index: i as u32,
            span: parsed.spans[i],
            lines: parsed.lines[i],
            shape: parsed.shapes[i].clone(),
            category: categories[i].clone(),
            wrap_kind: identification.wrap_kinds[i],
            names: names_per_statement[i].clone(),
            module_id: Some(identification.statement_module[i]),
        })
        .collect();

    let annotated = debug_span!("annotate").in_scope(|| {
        deminify_annotate::annotate(&parsed.body, parsed.shebang.as_deref(), &statements, &identification.graph, &fingerprint)
    });

    if !annotated.stats.byte_accounting_match {
        return Err(AnalysisError::invariant(format!(
            "byte accounting mismatch: {} statement bytes + {} gap bytes != {} body bytes",
            annotated.stats.total_bytes_statements,
            annotated.stats.total_bytes_gaps,
            parsed.body.len(),
        )));
    }

    let shebang_size = parsed.shebang.as_ref().map_or(0, |s| s.len() as u32 + 1);
    let original_size = source.len() as u32;

    let classify_report = debug_span!("report_classify").in_scope(|| {
        deminify_report::build_classify_report(
            &config.input_file,
            original_size,
            shebang_size,
            &statements,
            &helpers,
            &fingerprint,
            annotated.stats,
        )
    });

    let trace_report = debug_span!("report_trace").in_scope(|| {
        deminify_report::build_trace_report(
            fingerprint.bundler.as_str(),
            &statements,
            &identification.graph,
            &references,
            definitions.len() as u32,
        )
    });

    Ok(AnalysisOutput {
        annotated_source: annotated.text,
        classify: classify_report,
        trace: trace_report,
    })
}

/// Spec invariant (statements are totally ordered and pairwise disjoint):
/// `spans[i+1].start >= spans[i].end`.
fn assert_statement_order(spans: &[ByteSpan]) -> Result<(), AnalysisError> {
    for (i, pair) in spans.windows(2).enumerate() {
        if pair[1].start < pair[0].end {
            return Err(AnalysisError::invariant_at_statement(
                "statement spans are not ordered/disjoint",
                i as u32 + 1,
            ));
        }
    }
    Ok(())
}
