//! Passes 1-4 of the module identifier (spec §4.7-§4.8).

use deminify_model::WrapKind;
use swc_ecma_ast::ModuleItem;

use crate::inner_stmts::callee_name;

/// A module under construction, before renumbering. `temp_id` is only used
/// to tag statements during identification; the final id comes from
/// [`deminify_model::ModuleGraph::renumber`].
#[derive(Debug, Clone)]
pub struct PendingModule {
    pub wrap_kind: WrapKind,
    pub statements: Vec<u32>,
    pub primary_statement: u32,
    pub is_factory: bool,
}

/// §4.7: statements before the first CJS/ESM statement that are still
/// `None` get promoted to `Runtime` (the preamble extension).
pub fn reclassify_preamble(wrap_kinds: &mut [WrapKind]) {
    let Some(first_wrapped) = wrap_kinds
        .iter()
        .position(|k| matches!(k, WrapKind::Cjs | WrapKind::Esm))
    else {
        return;
    };
    for kind in &mut wrap_kinds[..first_wrapped] {
        if *kind == WrapKind::None {
            *kind = WrapKind::Runtime;
        }
    }
}

/// Pass 1: every `Runtime`-kind statement joins a single module.
#[must_use]
pub fn runtime_pass(wrap_kinds: &[WrapKind]) -> Option<PendingModule> {
    let statements: Vec<u32> = wrap_kinds
        .iter()
        .enumerate()
        .filter(|(_, k)| **k == WrapKind::Runtime)
        .map(|(i, _)| i as u32)
        .collect();
    if statements.is_empty() {
        return None;
    }
    let primary_statement = statements[0];
    Some(PendingModule {
        wrap_kind: WrapKind::Runtime,
        statements,
        primary_statement,
        is_factory: false,
    })
}

/// Pass 2: each CJS statement is its own single-statement module.
#[must_use]
pub fn cjs_pass(wrap_kinds: &[WrapKind]) -> Vec<PendingModule> {
    wrap_kinds
        .iter()
        .enumerate()
        .filter(|(_, k)| **k == WrapKind::Cjs)
        .map(|(i, _)| PendingModule {
            wrap_kind: WrapKind::Cjs,
            statements: vec![i as u32],
            primary_statement: i as u32,
            is_factory: true,
        })
        .collect()
}

/// Pass 3: each ESM statement either back-traces and absorbs contiguous
/// preceding `None` statements (factory case), or stands alone (adapter
/// case). `assigned` is updated in place so later passes see the absorbed
/// statements as taken.
pub fn esm_pass(
    wrap_kinds: &mut [WrapKind],
    categories: &[String],
    assigned: &mut [bool],
) -> Vec<PendingModule> {
    let mut modules = Vec::new();
    let esm_indices: Vec<u32> = wrap_kinds
        .iter()
        .enumerate()
        .filter(|(_, k)| **k == WrapKind::Esm)
        .map(|(i, _)| i as u32)
        .collect();

    for s in esm_indices {
        if assigned[s as usize] {
            continue;
        }
        let is_factory = categories[s as usize].contains("MODULE_FACTORY.__esm");
        let mut statements = vec![s];

        if is_factory {
            let mut j = s as i64 - 1;
            while j >= 0 {
                let idx = j as usize;
                if assigned[idx] || wrap_kinds[idx] != WrapKind::None {
                    break;
                }
                statements.push(idx as u32);
                wrap_kinds[idx] = WrapKind::Esm;
                j -= 1;
            }
        }

        statements.sort_unstable();
        for &idx in &statements {
            assigned[idx as usize] = true;
        }
        modules.push(PendingModule {
            wrap_kind: WrapKind::Esm,
            statements,
            primary_statement: s,
            is_factory,
        });
    }

    modules
}

/// Pass 4: reclassifies still-unassigned statements that call a known
/// factory name to `Import`. These statements are *not* modularized here;
/// they remain candidates for Pass 5's Jaccard clustering.
pub fn import_pass(
    items: &[ModuleItem],
    wrap_kinds: &mut [WrapKind],
    assigned: &[bool],
    factory_names: &rustc_hash::FxHashSet<String>,
) {
    for (i, item) in items.iter().enumerate() {
        if assigned[i] || wrap_kinds[i] != WrapKind::None {
            continue;
        }
        if statement_calls_factory(item, factory_names) {
            wrap_kinds[i] = WrapKind::Import;
        }
    }
}

fn statement_calls_factory(item: &ModuleItem, factory_names: &rustc_hash::FxHashSet<String>) -> bool {
    use swc_ecma_ast::{Decl, Stmt};

    match item {
        ModuleItem::Stmt(Stmt::Decl(Decl::Var(var_decl))) => var_decl.decls.iter().any(|decl| {
            decl.init
                .as_deref()
                .and_then(|init| init.as_call())
                .and_then(callee_name)
                .is_some_and(|name| factory_names.contains(name))
        }),
        ModuleItem::Stmt(Stmt::Expr(expr_stmt)) => expr_stmt
            .expr
            .as_call()
            .and_then(callee_name)
            .is_some_and(|name| factory_names.contains(name)),
        _ => false,
    }
}
