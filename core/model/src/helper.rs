use std::collections::BTreeMap;
use std::fmt;

/// The four runtime helper shapes esbuild (or an esbuild-alike bundler)
/// injects, plus the `preamble` pseudo-kind used for `Object.*` alias
/// bindings that precede the real helpers (spec §4.2–§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HelperKind {
    CommonJs,
    Esm,
    ToEsm,
    CopyProps,
    Preamble,
}

impl HelperKind {
    /// The canonical spec name, e.g. `__commonJS`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CommonJs => "__commonJS",
            Self::Esm => "__esm",
            Self::ToEsm => "__toESM",
            Self::CopyProps => "__copyProps",
            Self::Preamble => "preamble",
        }
    }
}

impl fmt::Display for HelperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A partial function identifier → [`HelperKind`], built once from the AST.
///
/// *Invariant*: the domain contains only top-level variable binding names
/// (spec §3). Backed by a `BTreeMap` rather than a hash map so that
/// iteration order — and therefore the `runtime_helpers` JSON field — is
/// deterministic without an explicit sort step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelperMap(BTreeMap<String, HelperKind>);

impl HelperMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name -> kind`. The first recorded kind for a name wins, matching
    /// "decisions are independent per declarator; the first matching rule wins"
    /// as applied across the whole file.
    pub fn record(&mut self, name: impl Into<String>, kind: HelperKind) {
        self.0.entry(name.into()).or_insert(kind);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<HelperKind> {
        self.0.get(name).copied()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, HelperKind)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any helper of the given kind was detected.
    #[must_use]
    pub fn has_kind(&self, kind: HelperKind) -> bool {
        self.0.values().any(|&k| k == kind)
    }
}
