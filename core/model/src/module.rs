use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::span::LineSpan;
use crate::statement::WrapKind;

/// The bundler fingerprinter's decision (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BundlerKind {
    Esbuild,
    Unknown,
}

impl BundlerKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Esbuild => "esbuild",
            Self::Unknown => "unknown",
        }
    }
}

/// Confidence attached to a [`BundlerKind`] guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Aggregated bundler signals (spec §4.4): which evidence was found, and
/// what it implies.
#[derive(Debug, Clone)]
pub struct Fingerprint {
    pub bundler: BundlerKind,
    pub confidence: Confidence,
    pub signals: Vec<String>,
}

/// A reconstructed module (spec §3): a set of statements that together form
/// one original source module.
///
/// *Invariants* (spec §3):
/// - every statement belongs to exactly one module;
/// - no module is empty;
/// - CJS modules contain exactly one statement (the factory call);
/// - ESM modules contain one `__esm` factory plus zero or more contiguous
///   preceding hoisted statements;
/// - `statements` is a contiguous index range for every module except the
///   `Runtime`-kind module;
/// - final ids equal the sort order by `min(statements)` (a renumbering
///   pass, [`ModuleGraph::renumber`], enforces this).
#[derive(Debug, Clone, Serialize)]
pub struct Module {
    pub id: u32,
    pub wrap_kind: WrapKind,
    /// Ascending statement indices belonging to this module.
    pub statements: Vec<u32>,
    /// The factory call statement for CJS/ESM modules, otherwise the first statement.
    pub primary_statement: u32,
    pub lines: LineSpan,
    pub bytes: u32,
    /// `innerStmts + (|statements| - 1)` when `innerStmts > 0`, else `|statements|`
    /// (spec §4.8's single human-readable size metric).
    pub stmt_count: u32,
    #[serde(skip)]
    pub deps_out: FxHashSet<u32>,
    #[serde(skip)]
    pub deps_in: FxHashSet<u32>,
}

impl Module {
    #[must_use]
    pub fn min_statement(&self) -> u32 {
        self.statements.iter().copied().min().unwrap_or(self.primary_statement)
    }

    #[must_use]
    pub fn sorted_deps_out(&self) -> Vec<u32> {
        let mut v: Vec<u32> = self.deps_out.iter().copied().collect();
        v.sort_unstable();
        v
    }

    #[must_use]
    pub fn sorted_deps_in(&self) -> Vec<u32> {
        let mut v: Vec<u32> = self.deps_in.iter().copied().collect();
        v.sort_unstable();
        v
    }
}

/// The full module-level directed graph: dense ids `0..len`, increasing with
/// `min(statements)` (spec invariant I4).
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    modules: Vec<Module>,
}

impl ModuleGraph {
    #[must_use]
    pub fn new(modules: Vec<Module>) -> Self {
        Self { modules }
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut [Module] {
        &mut self.modules
    }

    #[must_use]
    pub fn into_modules(self) -> Vec<Module> {
        self.modules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Sorts modules by `min(statements)` and reassigns dense ids, updating
    /// every statement's `module_id`. This is the module-identifier
    /// post-pass "Renumber" step (spec §4.8).
    pub fn renumber(&mut self, statement_module: &mut [Option<u32>]) {
        self.modules.sort_by_key(Module::min_statement);
        for (new_id, module) in self.modules.iter_mut().enumerate() {
            let new_id = new_id as u32;
            module.id = new_id;
            for &s in &module.statements {
                statement_module[s as usize] = Some(new_id);
            }
        }
    }
}
