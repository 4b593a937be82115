//! Byte-preserving annotator (spec §4.9).
//!
//! Emits a header comment, then walks the source left to right preserving
//! every inter-statement gap verbatim and inserting a module-boundary
//! comment (at the first statement of each module) and a per-statement
//! annotation comment ahead of each statement's bytes. The output parses
//! and executes identically to the input; only block comments are added.

use deminify_model::{Fingerprint, Module, ModuleGraph, Statement, WrapKind};
use rustc_hash::FxHashMap;

/// Running byte totals used to verify spec invariant I7
/// (`total_bytes_statements + total_bytes_gaps = |body|`).
#[derive(Debug, Clone, Copy)]
pub struct AnnotationStats {
    pub total_bytes_statements: u32,
    pub total_bytes_gaps: u32,
    pub annotation_bytes: u32,
    pub byte_accounting_match: bool,
}

#[derive(Debug)]
pub struct AnnotatedOutput {
    pub text: String,
    pub stats: AnnotationStats,
}

/// Produces the annotated output for `body` (the shebang-stripped source).
/// `statements` and `modules` must already be fully assigned (module
/// identification has run).
#[must_use]
pub fn annotate(
    body: &str,
    shebang: Option<&str>,
    statements: &[Statement],
    modules: &ModuleGraph,
    fingerprint: &Fingerprint,
) -> AnnotatedOutput {
    let boundary_at: FxHashMap<u32, &Module> =
        modules.modules().iter().map(|m| (m.min_statement(), m)).collect();

    let mut out = String::with_capacity(body.len() + 4096);
    let mut annotation_bytes: u32 = 0;
    let mut total_bytes_statements: u32 = 0;
    let mut total_bytes_gaps: u32 = 0;

    if let Some(shebang) = shebang {
        out.push_str(shebang);
        out.push('\n');
    }

    let header = header_block(statements, modules, fingerprint);
    annotation_bytes += header.len() as u32;
    out.push_str(&header);

    let mut cursor: u32 = 0;
    for statement in statements {
        let gap = &body[cursor as usize..statement.span.start as usize];
        total_bytes_gaps += gap.len() as u32;
        out.push_str(gap);

        if let Some(module) = boundary_at.get(&statement.index) {
            let boundary = module_boundary_comment(module);
            annotation_bytes += boundary.len() as u32;
            out.push_str(&boundary);
        }

        let annotation = statement_comment(statement);
        annotation_bytes += annotation.len() as u32;
        out.push_str(&annotation);

        let slice = &body[statement.span.start as usize..statement.span.end as usize];
        total_bytes_statements += slice.len() as u32;
        out.push_str(slice);

        cursor = statement.span.end;
    }

    let trailing = &body[cursor as usize..];
    total_bytes_gaps += trailing.len() as u32;
    out.push_str(trailing);

    let byte_accounting_match = total_bytes_statements + total_bytes_gaps == body.len() as u32;

    AnnotatedOutput {
        text: out,
        stats: AnnotationStats {
            total_bytes_statements,
            total_bytes_gaps,
            annotation_bytes,
            byte_accounting_match,
        },
    }
}

fn header_block(statements: &[Statement], modules: &ModuleGraph, fingerprint: &Fingerprint) -> String {
    let mut counts: FxHashMap<WrapKind, u32> = FxHashMap::default();
    for statement in statements {
        *counts.entry(statement.wrap_kind).or_insert(0) += 1;
    }
    let wrapkind_line = [
        WrapKind::Cjs,
        WrapKind::Esm,
        WrapKind::Runtime,
        WrapKind::Import,
        WrapKind::None,
    ]
    .iter()
    .map(|kind| format!("{}={}", kind.as_str(), counts.get(kind).copied().unwrap_or(0)))
    .collect::<Vec<_>>()
    .join(" ");

    let total_bytes: u32 = modules.modules().iter().map(|m| m.bytes).sum();

    format!(
        "/*\n\
         * DEMINI-CLASSIFY BUNDLE ANALYSIS\n\
         * ------------------------------\n\
         * Bundler:    {} (confidence: {})\n\
         * Statements: {}\n\
         * WrapKind:   {}\n\
         * Size:       {} bytes\n\
         */\n",
        fingerprint.bundler.as_str(),
        fingerprint.confidence.as_str(),
        statements.len(),
        wrapkind_line,
        total_bytes,
    )
}

/// `/* --- MODULE BOUNDARY [NNN] Wrap<KIND> (<label>, <bytes> bytes) --- */`
fn module_boundary_comment(module: &Module) -> String {
    let len = module.statements.len() as u32;
    let label = if module.stmt_count != len {
        let hoisted = len - 1;
        let inner = module.stmt_count - hoisted;
        format!("{inner} inner + {hoisted} hoisted")
    } else {
        format!("{len} stmts")
    };
    format!(
        "/* --- MODULE BOUNDARY [{:03}] Wrap{} ({label}, {} bytes) --- */\n",
        module.id,
        module.wrap_kind.as_str(),
        module.bytes,
    )
}

/// `/* === [IIII] TYPE: <cat> | WRAPKIND: <kind> | NAME: <name> | LINES: s-e | BYTES: n === */`
fn statement_comment(statement: &Statement) -> String {
    format!(
        "/* === [{:04}] TYPE: {} | WRAPKIND: {} | NAME: {} | LINES: {}-{} | BYTES: {} === */\n",
        statement.index,
        statement.category,
        statement.wrap_kind.as_str(),
        statement.name_display(),
        statement.lines.start,
        statement.lines.end,
        statement.span.len(),
    )
}
