use thiserror::Error;

/// The three error kinds the engine recognizes (spec §7): input errors,
/// parse errors, and invariant violations discovered during analysis.
///
/// All are fatal: the engine never attempts recovery. `Invariant` carries
/// enough context (the offending statement or module index) to point a
/// diagnostic at the first offending entity, as required by §7.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The input could not be read: missing file, non-UTF-8 content, or a
    /// shebang-only (empty body) file.
    #[error("input error: {detail}")]
    Input { detail: String },

    /// The parser adapter rejected the source.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        message: String,
        line: u32,
        column: u32,
    },

    /// An internal invariant was violated (byte-accounting mismatch, an
    /// unassigned statement after Pass 5, an empty module, a duplicate
    /// module id, ...).
    #[error("invariant violation: {detail}{}{}", .statement.map(|s| format!(" (statement {s})")).unwrap_or_default(), .module.map(|m| format!(" (module {m})")).unwrap_or_default())]
    Invariant {
        detail: String,
        statement: Option<u32>,
        module: Option<u32>,
    },

    /// Wraps an I/O failure from reading the input or writing an output.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    #[must_use]
    pub fn invariant(detail: impl Into<String>) -> Self {
        Self::Invariant {
            detail: detail.into(),
            statement: None,
            module: None,
        }
    }

    #[must_use]
    pub fn invariant_at_statement(detail: impl Into<String>, statement: u32) -> Self {
        Self::Invariant {
            detail: detail.into(),
            statement: Some(statement),
            module: None,
        }
    }

    #[must_use]
    pub fn invariant_at_module(detail: impl Into<String>, module: u32) -> Self {
        Self::Invariant {
            detail: detail.into(),
            statement: None,
            module: Some(module),
        }
    }
}
