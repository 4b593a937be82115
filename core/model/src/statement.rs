use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::span::{ByteSpan, LineSpan};

/// A statement's role in module wrapping (spec §3/§4.3).
///
/// `IMPORT` is never assigned by the classifier directly; it is produced
/// only by module-identification Pass 4 (spec §4.7/§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum WrapKind {
    Cjs,
    Esm,
    Runtime,
    Import,
    /// No wrapping role. Named `None` (not `Unwrapped`) because that is the
    /// literal token the annotation grammar emits (spec §6): `Wrap<KIND>`
    /// with `<KIND>` in `{CJS, ESM, IMPORT, RUNTIME, None}`.
    None,
}

impl WrapKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cjs => "CJS",
            Self::Esm => "ESM",
            Self::Runtime => "RUNTIME",
            Self::Import => "IMPORT",
            Self::None => "None",
        }
    }
}

impl fmt::Display for WrapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One top-level AST node (spec §3).
///
/// *Invariant*: statements are totally ordered by `index` and by
/// `span.start`; their spans are pairwise disjoint, and
/// `statements[i+1].span.start >= statements[i].span.end`. The pipeline
/// asserts this right after the parser adapter runs (see
/// `deminify_pipeline::assert_statement_order`).
#[derive(Debug, Clone, Serialize)]
pub struct Statement {
    pub index: u32,
    pub span: ByteSpan,
    pub lines: LineSpan,
    /// Raw shape tag reported by the parser adapter (e.g. `"VariableDeclaration"`).
    pub shape: String,
    /// Category string from the closed set described in spec §4.3, e.g.
    /// `"MODULE_FACTORY.__commonJS"` or `"RUNTIME_HELPER.__esm+RUNTIME_HELPER.preamble"`.
    pub category: String,
    pub wrap_kind: WrapKind,
    /// Names this statement defines, in declaration order.
    pub names: Vec<String>,
    /// Assigned once module identification (spec §4.8) has run.
    pub module_id: Option<u32>,
}

impl Statement {
    #[must_use]
    pub fn name_display(&self) -> String {
        if self.names.is_empty() {
            "-".to_owned()
        } else {
            self.names.join(",")
        }
    }
}

/// identifier -> first statement index that binds it (spec §4.5).
///
/// *Invariant*: for each entry `(name, i)`, `statements[i].names` contains
/// `name`. Rebinding the same name later does not overwrite the entry:
/// first-definition-wins.
#[derive(Debug, Clone, Default)]
pub struct DefinitionMap(FxHashMap<String, u32>);

impl DefinitionMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `statement` defines `name`, unless `name` is already bound.
    pub fn define(&mut self, name: impl Into<String>, statement: u32) {
        self.0.entry(name.into()).or_insert(statement);
    }

    #[must_use]
    pub fn owner(&self, name: &str) -> Option<u32> {
        self.0.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The statement-level reference graph (spec §4.6): for each statement `i`,
/// the sets of statements it refers to (`refs_out`) and that refer to it
/// (`refs_in`). Arena-style storage keyed by statement index, per spec §9's
/// "graphs with integer keys" design note — no pointer graph, no ownership
/// cycles.
#[derive(Debug, Clone)]
pub struct ReferenceGraph {
    refs_out: Vec<FxHashSet<u32>>,
    refs_in: Vec<FxHashSet<u32>>,
}

impl ReferenceGraph {
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        Self {
            refs_out: vec![FxHashSet::default(); len],
            refs_in: vec![FxHashSet::default(); len],
        }
    }

    /// Adds the edge `from -> to`. No-ops for `from == to` (spec invariant
    /// I6: no self-loop).
    pub fn add_edge(&mut self, from: u32, to: u32) {
        if from == to {
            return;
        }
        self.refs_out[from as usize].insert(to);
        self.refs_in[to as usize].insert(from);
    }

    #[must_use]
    pub fn refs_out(&self, statement: u32) -> &FxHashSet<u32> {
        &self.refs_out[statement as usize]
    }

    #[must_use]
    pub fn refs_in(&self, statement: u32) -> &FxHashSet<u32> {
        &self.refs_in[statement as usize]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.refs_out.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs_out.is_empty()
    }

    /// Sorted, ascending view of `refs_out(i)`, for deterministic serialization
    /// (spec §5: "all sets serialized to JSON are sorted ascending").
    #[must_use]
    pub fn sorted_refs_out(&self, statement: u32) -> Vec<u32> {
        let mut v: Vec<u32> = self.refs_out(statement).iter().copied().collect();
        v.sort_unstable();
        v
    }

    #[must_use]
    pub fn sorted_refs_in(&self, statement: u32) -> Vec<u32> {
        let mut v: Vec<u32> = self.refs_in(statement).iter().copied().collect();
        v.sort_unstable();
        v
    }
}
