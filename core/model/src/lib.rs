//! Data model shared by every pass of the deminify bundle analysis engine.
//!
//! Every type here is a plain, read-only-after-construction value type: the
//! pipeline builds them up pass by pass (see `deminify_pipeline`) and never
//! mutates an entity once a later pass has started reading it.

mod error;
mod helper;
mod module;
mod span;
mod statement;

pub use error::AnalysisError;
pub use helper::{HelperKind, HelperMap};
pub use module::{BundlerKind, Confidence, Fingerprint, Module, ModuleGraph};
pub use span::{ByteSpan, LineSpan};
pub use statement::{DefinitionMap, ReferenceGraph, Statement, WrapKind};

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, AnalysisError>;
