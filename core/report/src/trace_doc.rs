use std::collections::BTreeMap;

use deminify_model::{ModuleGraph, ReferenceGraph, Statement};
use serde::Serialize;

/// The `trace` JSON document (spec §6): module list, module-level
/// dependency edges, and a per-statement reference listing.
#[derive(Debug, Serialize)]
pub struct TraceReport {
    pub bundler: String,
    pub total_statements: u32,
    pub total_modules: u32,
    pub total_edges: u32,
    pub top_level_names: u32,
    pub wrapkind_modules: BTreeMap<String, u32>,
    pub modules: Vec<TraceModule>,
    pub statements: Vec<TraceStatement>,
}

#[derive(Debug, Serialize)]
pub struct TraceModule {
    pub id: u32,
    #[serde(rename = "wrapKind")]
    pub wrap_kind: String,
    pub statements: Vec<u32>,
    pub line_start: u32,
    pub line_end: u32,
    pub bytes: u32,
    pub deps_out: Vec<u32>,
    pub deps_in: Vec<u32>,
}

#[derive(Debug, Serialize)]
pub struct TraceStatement {
    pub index: u32,
    pub module_id: u32,
    #[serde(rename = "wrapKind")]
    pub wrap_kind: String,
    pub names: Vec<String>,
    pub line_start: u32,
    pub line_end: u32,
    pub refs_out: Vec<u32>,
    pub refs_in: Vec<u32>,
}

#[must_use]
pub fn build_trace_report(
    bundler: &str,
    statements: &[Statement],
    modules: &ModuleGraph,
    references: &ReferenceGraph,
    top_level_names: u32,
) -> TraceReport {
    let mut wrapkind_modules: BTreeMap<String, u32> = BTreeMap::new();
    for module in modules.modules() {
        *wrapkind_modules.entry(module.wrap_kind.as_str().to_owned()).or_insert(0) += 1;
    }

    let module_docs = modules
        .modules()
        .iter()
        .map(|module| TraceModule {
            id: module.id,
            wrap_kind: module.wrap_kind.as_str().to_owned(),
            statements: module.statements.clone(),
            line_start: module.lines.start,
            line_end: module.lines.end,
            bytes: module.bytes,
            deps_out: module.sorted_deps_out(),
            deps_in: module.sorted_deps_in(),
        })
        .collect();

    let statement_docs = statements
        .iter()
        .map(|statement| TraceStatement {
            index: statement.index,
            module_id: statement.module_id.unwrap_or(0),
            wrap_kind: statement.wrap_kind.as_str().to_owned(),
            names: statement.names.clone(),
            line_start: statement.lines.start,
            line_end: statement.lines.end,
            refs_out: references.sorted_refs_out(statement.index),
            refs_in: references.sorted_refs_in(statement.index),
        })
        .collect();

    let total_edges: u32 = statements.iter().map(|s| references.refs_out(s.index).len() as u32).sum();

    TraceReport {
        bundler: bundler.to_owned(),
        total_statements: statements.len() as u32,
        total_modules: modules.len() as u32,
        total_edges,
        top_level_names,
        wrapkind_modules,
        modules: module_docs,
        statements: statement_docs,
    }
}
