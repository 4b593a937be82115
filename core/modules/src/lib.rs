//! Five-pass module identifier and module graph compiler (spec §4.7–§4.8).

mod inner_stmts;
mod jaccard;
mod passes;

use deminify_model::{
    AnalysisError, ByteSpan, HelperKind, HelperMap, LineSpan, Module, ModuleGraph, ReferenceGraph,
    WrapKind,
};
use rustc_hash::FxHashSet;
use swc_ecma_ast::ModuleItem;

use passes::PendingModule;

/// Everything the module identifier produces: the (possibly reclassified)
/// per-statement WrapKind, the final module id of every statement, and the
/// compiled module graph.
#[derive(Debug)]
pub struct Identification {
    pub wrap_kinds: Vec<WrapKind>,
    pub statement_module: Vec<u32>,
    pub graph: ModuleGraph,
}

/// Runs all five passes plus the renumber and module-graph-compile post
/// passes (spec §4.7–§4.8).
///
/// # Errors
/// Returns [`AnalysisError::Invariant`] if any statement is left unassigned
/// after Pass 5 (spec §7, spec invariant I2).
pub fn identify(
    items: &[ModuleItem],
    spans: &[ByteSpan],
    lines: &[LineSpan],
    initial_wrap_kinds: &[WrapKind],
    categories: &[String],
    names_per_statement: &[Vec<String>],
    references: &ReferenceGraph,
    helpers: &HelperMap,
) -> Result<Identification, AnalysisError> {
    let n = items.len();
    let mut wrap_kinds = initial_wrap_kinds.to_vec();
    passes::reclassify_preamble(&mut wrap_kinds);

    let mut assigned = vec![false; n];
    let mut statement_module_temp: Vec<Option<u32>> = vec![None; n];
    let mut pending: Vec<PendingModule> = Vec::new();

    if let Some(m) = passes::runtime_pass(&wrap_kinds) {
        push_pending(&mut pending, &mut assigned, &mut statement_module_temp, m);
    }
    for m in passes::cjs_pass(&wrap_kinds) {
        push_pending(&mut pending, &mut assigned, &mut statement_module_temp, m);
    }
    for m in passes::esm_pass(&mut wrap_kinds, categories, &mut assigned) {
        push_pending(&mut pending, &mut assigned, &mut statement_module_temp, m);
    }

    let mut factory_names: FxHashSet<String> = FxHashSet::default();
    for module in &pending {
        if matches!(module.wrap_kind, WrapKind::Cjs | WrapKind::Esm) {
            for &s in &module.statements {
                factory_names.extend(names_per_statement[s as usize].iter().cloned());
            }
        }
    }

    passes::import_pass(items, &mut wrap_kinds, &assigned, &factory_names);

    for m in jaccard::cluster(&wrap_kinds, &assigned, &statement_module_temp, references) {
        push_pending(&mut pending, &mut assigned, &mut statement_module_temp, m);
    }

    if let Some(unassigned) = assigned.iter().position(|&a| !a) {
        return Err(AnalysisError::invariant_at_statement(
            "statement left unassigned after Pass 5",
            unassigned as u32,
        ));
    }

    let mut modules: Vec<Module> = pending
        .into_iter()
        .enumerate()
        .map(|(id, pending_module)| compile_module(id as u32, pending_module, items, spans, lines, helpers))
        .collect();

    let mut statement_module: Vec<Option<u32>> = statement_module_temp;
    let mut graph = ModuleGraph::new(std::mem::take(&mut modules));
    graph.renumber(&mut statement_module);

    let statement_module: Vec<u32> = statement_module
        .into_iter()
        .map(|m| m.expect("every statement was assigned above"))
        .collect();

    compile_deps(&mut graph, references, &statement_module);

    Ok(Identification { wrap_kinds, statement_module, graph })
}

fn push_pending(
    pending: &mut Vec<PendingModule>,
    assigned: &mut [bool],
    statement_module_temp: &mut [Option<u32>],
    module: PendingModule,
) {
    let temp_id = pending.len() as u32;
    for &s in &module.statements {
        assigned[s as usize] = true;
        statement_module_temp[s as usize] = Some(temp_id);
    }
    pending.push(module);
}

fn compile_module(
    id: u32,
    pending: PendingModule,
    items: &[ModuleItem],
    spans: &[ByteSpan],
    lines: &[LineSpan],
    helpers: &HelperMap,
) -> Module {
    let module_lines = pending.statements[1..]
        .iter()
        .fold(lines[pending.statements[0] as usize], |acc, &s| acc.union(lines[s as usize]));
    let bytes: u32 = pending.statements.iter().map(|&s| spans[s as usize].len()).sum();

    let stmt_count = if pending.is_factory {
        let helper_kind = match pending.wrap_kind {
            WrapKind::Cjs => HelperKind::CommonJs,
            _ => HelperKind::Esm,
        };
        let inner = inner_stmts::factory_call(&items[pending.primary_statement as usize], helpers, helper_kind)
            .and_then(|call| call.args.first())
            .map(|arg| inner_stmts::count_block_statements(&arg.expr))
            .unwrap_or(0);
        if inner > 0 {
            inner + (pending.statements.len() as u32 - 1)
        } else {
            pending.statements.len() as u32
        }
    } else {
        pending.statements.len() as u32
    };

    Module {
        id,
        wrap_kind: pending.wrap_kind,
        statements: pending.statements,
        primary_statement: pending.primary_statement,
        lines: module_lines,
        bytes,
        stmt_count,
        deps_out: FxHashSet::default(),
        deps_in: FxHashSet::default(),
    }
}

fn compile_deps(graph: &mut ModuleGraph, references: &ReferenceGraph, statement_module: &[u32]) {
    let edges: Vec<(u32, u32)> = (0..statement_module.len() as u32)
        .flat_map(|s| {
            references
                .refs_out(s)
                .iter()
                .map(move |&t| (statement_module[s as usize], statement_module[t as usize]))
        })
        .filter(|(from, to)| from != to)
        .collect();

    let modules = graph.modules_mut();
    for (from, to) in edges {
        modules[from as usize].deps_out.insert(to);
        modules[to as usize].deps_in.insert(from);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deminify_classify::classify;

    fn run(src: &str) -> Identification {
        let parsed = deminify_source::parse(src, 2022).unwrap();
        let helpers = deminify_helpers::detect(&parsed.items, |span| parsed.text(span));
        let classes = classify(&parsed.items, &helpers);
        let wrap_kinds: Vec<WrapKind> = classes.iter().map(|c| c.wrap_kind).collect();
        let categories: Vec<String> = classes.iter().map(|c| c.category.clone()).collect();
        let names: Vec<Vec<String>> = parsed.items.iter().map(deminify_graph::statement_names).collect();
        let definitions = deminify_graph::build_definitions(&names);
        let references = deminify_graph::build_references(&parsed.items, &definitions);

        identify(
            &parsed.items,
            &parsed.spans,
            &parsed.lines,
            &wrap_kinds,
            &categories,
            &names,
            &references,
            &helpers,
        )
        .unwrap()
    }

    #[test]
    fn pure_cjs_bundle_produces_runtime_and_cjs_modules() {
        let src = "var w=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);\nvar r=w((e,m)=>{m.exports=1;});\n";
        let id = run(src);
        assert_eq!(id.graph.len(), 2);
        assert_eq!(id.graph.modules()[0].wrap_kind, WrapKind::Runtime);
        assert_eq!(id.graph.modules()[1].wrap_kind, WrapKind::Cjs);
        assert_eq!(id.graph.modules()[1].statements, vec![1]);
    }

    #[test]
    fn esm_back_trace_absorbs_preceding_none_statements() {
        // An unrelated CJS module comes first so `F` (the first CJS/ESM
        // statement, spec §4.7) is established at index 1, leaving the `var
        // a; var b; function f(){}` trio free of the preamble reclassification.
        let src = "var w=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);\n\
                   var r=w((e,m)=>{m.exports=1;});\n\
                   var v=(a,b)=>()=>(a=0,b());\n\
                   var a;\nvar b;\nfunction f(){}\nvar m=v(()=>{a=b=f();});\n";
        let id = run(src);
        let esm_module = id.graph.modules().iter().find(|m| m.wrap_kind == WrapKind::Esm).unwrap();
        assert_eq!(esm_module.statements, vec![3, 4, 5, 6]);
        assert_eq!(esm_module.primary_statement, 6);
    }

    #[test]
    fn every_statement_is_assigned_exactly_once() {
        let src = "var x = 1;\nvar y = 2;\nfunction f(){}\n";
        let id = run(src);
        let mut seen = std::collections::HashSet::new();
        for module in id.graph.modules() {
            for &s in &module.statements {
                assert!(seen.insert(s), "statement {s} assigned twice");
            }
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn module_ids_are_dense_and_increase_with_min_statement() {
        let src = "var r1=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);\n\
                   var m1=r1((e,m)=>{m.exports=1;});\n\
                   var m2=r1((e,m)=>{m.exports=2;});\n";
        let id = run(src);
        let modules = id.graph.modules();
        for (i, module) in modules.iter().enumerate() {
            assert_eq!(module.id, i as u32, "module ids must be dense 0..len");
        }
        assert!(
            modules.windows(2).all(|w| w[0].min_statement() < w[1].min_statement()),
            "module ids must increase with min(statements)"
        );
    }

    #[test]
    fn non_runtime_modules_are_contiguous() {
        // Same shape as `esm_back_trace_absorbs_preceding_none_statements`:
        // the leading CJS module establishes `F` early so the hoisted trio
        // stays `None` (not preamble-promoted) for Pass 3 to absorb.
        let src = "var w=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);\n\
                   var r=w((e,m)=>{m.exports=1;});\n\
                   var v=(a,b)=>()=>(a=0,b());\n\
                   var a;\nvar b;\nfunction f(){}\nvar m=v(()=>{a=b=f();});\n";
        let id = run(src);
        for module in id.graph.modules() {
            if module.wrap_kind == WrapKind::Runtime {
                continue;
            }
            let min = *module.statements.first().unwrap();
            let max = *module.statements.last().unwrap();
            assert_eq!(
                module.statements,
                (min..=max).collect::<Vec<u32>>(),
                "non-RUNTIME module {} is not a contiguous range",
                module.id
            );
        }
    }

    #[test]
    fn jaccard_split_on_disjoint_fingerprints() {
        // Two unrelated residual statements referencing disjoint prior modules.
        let src = "var r1=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);\n\
                   var m1=r1((e,m)=>{m.exports=1;});\n\
                   var m2=r1((e,m)=>{m.exports=2;});\n\
                   var c1=m1;\n\
                   var c2=m2;\n";
        let id = run(src);
        let none_modules: Vec<_> = id.graph.modules().iter().filter(|m| m.wrap_kind == WrapKind::None).collect();
        assert_eq!(none_modules.len(), 2);
    }
}
