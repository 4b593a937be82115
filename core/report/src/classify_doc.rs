use std::collections::BTreeMap;

use deminify_annotate::AnnotationStats;
use deminify_model::{Fingerprint, HelperMap, Statement};
use serde::Serialize;

/// The `classify` JSON document (spec §6): helper map, category and
/// WrapKind histograms, byte accounting, and a flat per-statement listing.
#[derive(Debug, Serialize)]
pub struct ClassifyReport {
    pub input_file: String,
    pub original_size: u32,
    pub body_size: u32,
    pub shebang_size: u32,
    pub bundler: String,
    pub bundler_confidence: String,
    pub bundler_signals: Vec<String>,
    pub runtime_helpers: BTreeMap<String, String>,
    pub total_statements: u32,
    pub categories: BTreeMap<String, u32>,
    pub wrapkind_distribution: BTreeMap<String, u32>,
    pub total_bytes_statements: u32,
    pub total_bytes_gaps: u32,
    pub annotation_bytes: u32,
    pub byte_accounting_match: bool,
    pub statements: Vec<ClassifyStatement>,
}

#[derive(Debug, Serialize)]
pub struct ClassifyStatement {
    pub index: u32,
    pub category: String,
    #[serde(rename = "wrapKind")]
    pub wrap_kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "startLine")]
    pub start_line: u32,
    #[serde(rename = "endLine")]
    pub end_line: u32,
    pub bytes: u32,
}

#[must_use]
pub fn build_classify_report(
    input_file: &str,
    original_size: u32,
    shebang_size: u32,
    statements: &[Statement],
    helpers: &HelperMap,
    fingerprint: &Fingerprint,
    annotation_stats: AnnotationStats,
) -> ClassifyReport {
    let mut categories: BTreeMap<String, u32> = BTreeMap::new();
    let mut wrapkind_distribution: BTreeMap<String, u32> = BTreeMap::new();
    for statement in statements {
        *categories.entry(statement.category.clone()).or_insert(0) += 1;
        *wrapkind_distribution.entry(statement.wrap_kind.as_str().to_owned()).or_insert(0) += 1;
    }

    let runtime_helpers = helpers
        .iter()
        .map(|(name, kind)| (name.to_owned(), kind.as_str().to_owned()))
        .collect();

    let statement_docs = statements
        .iter()
        .map(|statement| ClassifyStatement {
            index: statement.index,
            category: statement.category.clone(),
            wrap_kind: statement.wrap_kind.as_str().to_owned(),
            name: (!statement.names.is_empty()).then(|| statement.names.join(",")),
            start_line: statement.lines.start,
            end_line: statement.lines.end,
            bytes: statement.span.len(),
        })
        .collect();

    ClassifyReport {
        input_file: input_file.to_owned(),
        original_size,
        body_size: original_size - shebang_size,
        shebang_size,
        bundler: fingerprint.bundler.as_str().to_owned(),
        bundler_confidence: fingerprint.confidence.as_str().to_owned(),
        bundler_signals: fingerprint.signals.clone(),
        runtime_helpers,
        total_statements: statements.len() as u32,
        categories,
        wrapkind_distribution,
        total_bytes_statements: annotation_stats.total_bytes_statements,
        total_bytes_gaps: annotation_stats.total_bytes_gaps,
        annotation_bytes: annotation_stats.annotation_bytes,
        byte_accounting_match: annotation_stats.byte_accounting_match,
        statements: statement_docs,
    }
}
