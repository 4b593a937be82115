//! Pass 5: Jaccard clustering of residual statements (spec §4.8).

use deminify_model::{ReferenceGraph, WrapKind};
use rustc_hash::FxHashSet;

use crate::passes::PendingModule;

/// One clustering element: either a singleton statement or a collapsed run
/// of consecutive `Import` statements (a super-node, spec GLOSSARY).
struct Element {
    indices: Vec<u32>,
    fingerprint: FxHashSet<u32>,
}

/// Clusters the statements left unassigned after passes 1-4 into modules.
/// `statement_module` carries the *temporary* module id of every statement
/// already placed by an earlier pass (`None` for still-unassigned ones).
#[must_use]
pub fn cluster(
    wrap_kinds: &[WrapKind],
    assigned: &[bool],
    statement_module: &[Option<u32>],
    references: &ReferenceGraph,
) -> Vec<PendingModule> {
    let mut modules = Vec::new();

    for run in contiguous_unassigned_runs(assigned) {
        let elements = group_into_elements(&run, wrap_kinds);
        let elements: Vec<Element> = elements
            .into_iter()
            .map(|indices| {
                let fingerprint = fingerprint_of(&indices, statement_module, references);
                Element { indices, fingerprint }
            })
            .collect();
        modules.extend(cluster_run(elements, wrap_kinds));
    }

    modules
}

fn contiguous_unassigned_runs(assigned: &[bool]) -> Vec<Vec<u32>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (i, &is_assigned) in assigned.iter().enumerate() {
        if is_assigned {
            if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(i as u32);
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn group_into_elements(run: &[u32], wrap_kinds: &[WrapKind]) -> Vec<Vec<u32>> {
    let mut elements = Vec::new();
    let mut i = 0;
    while i < run.len() {
        let idx = run[i];
        if wrap_kinds[idx as usize] == WrapKind::Import {
            let mut block = vec![idx];
            let mut j = i + 1;
            while j < run.len() && wrap_kinds[run[j] as usize] == WrapKind::Import {
                block.push(run[j]);
                j += 1;
            }
            elements.push(block);
            i = j;
        } else {
            elements.push(vec![idx]);
            i += 1;
        }
    }
    elements
}

fn fingerprint_of(
    indices: &[u32],
    statement_module: &[Option<u32>],
    references: &ReferenceGraph,
) -> FxHashSet<u32> {
    let mut fp = FxHashSet::default();
    for &idx in indices {
        for &target in references.refs_out(idx) {
            if let Some(module_id) = statement_module[target as usize] {
                fp.insert(module_id);
            }
        }
    }
    fp
}

fn jaccard(a: &FxHashSet<u32>, b: &FxHashSet<u32>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

const THRESHOLD: f64 = 0.5;

fn cluster_run(elements: Vec<Element>, wrap_kinds: &[WrapKind]) -> Vec<PendingModule> {
    let mut modules = Vec::new();
    let mut iter = elements.into_iter();
    let Some(first) = iter.next() else {
        return modules;
    };

    let mut cluster_indices = first.indices;
    let mut cluster_fp = first.fingerprint;

    for element in iter {
        if jaccard(&cluster_fp, &element.fingerprint) >= THRESHOLD {
            cluster_indices.extend(element.indices);
            cluster_fp.extend(element.fingerprint);
        } else {
            modules.push(flush(std::mem::take(&mut cluster_indices), wrap_kinds));
            cluster_indices = element.indices;
            cluster_fp = element.fingerprint;
        }
    }
    modules.push(flush(cluster_indices, wrap_kinds));

    modules
}

fn flush(mut statements: Vec<u32>, wrap_kinds: &[WrapKind]) -> PendingModule {
    statements.sort_unstable();
    let all_import = statements.iter().all(|&i| wrap_kinds[i as usize] == WrapKind::Import);
    let wrap_kind = if all_import { WrapKind::Import } else { WrapKind::None };
    let primary_statement = statements[0];
    PendingModule {
        wrap_kind,
        statements,
        primary_statement,
        is_factory: false,
    }
}
