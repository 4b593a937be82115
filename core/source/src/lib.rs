//! Parser adapter (spec §4.1).
//!
//! Produces an ESTree-equivalent AST with byte offsets and line/column info
//! for every top-level statement, stripping and preserving any leading
//! shebang. Everything downstream of this crate treats parsing as done:
//! byte ranges, line ranges and shape tags are computed exactly once, here.

use deminify_model::{AnalysisError, ByteSpan, LineSpan};
use swc_common::{sync::Lrc, FileName, SourceMap, Span, Spanned};
use swc_ecma_ast::{Decl, EsVersion, ModuleDecl, ModuleItem, Stmt};
use swc_ecma_parser::{lexer::Lexer, EsConfig, Parser, StringInput, Syntax};

/// The parsed program: the stripped body plus one parallel entry per
/// top-level statement (span, line range, shape tag).
///
/// *Invariant* (spec §3): `spans[i+1].start >= spans[i].end`, enforced by
/// `deminify_pipeline::assert_statement_order` right after parsing.
#[derive(Debug)]
pub struct ParsedProgram {
    pub shebang: Option<String>,
    pub body: String,
    pub items: Vec<ModuleItem>,
    pub spans: Vec<ByteSpan>,
    pub lines: Vec<LineSpan>,
    pub shapes: Vec<String>,
    /// The parser's `BytePos` base for this file, so callers holding onto
    /// raw `swc_common::Span`s from `items` (e.g. a declarator's
    /// initializer) can slice `body` themselves via [`Self::text`].
    base: u32,
}

impl ParsedProgram {
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The verbatim source slice for a statement's span.
    #[must_use]
    pub fn slice(&self, span: ByteSpan) -> &str {
        &self.body[span.start as usize..span.end as usize]
    }

    /// The verbatim source slice for any `swc_common::Span` belonging to
    /// this program's AST (sub-statement spans included).
    #[must_use]
    pub fn text(&self, span: Span) -> &str {
        let start = (span.lo.0 - self.base) as usize;
        let end = (span.hi.0 - self.base) as usize;
        &self.body[start..end]
    }
}

/// Parses `source` as an ECMAScript module. `ecma_version` selects the
/// parser's target edition (spec default: 2022).
///
/// # Errors
/// Returns [`AnalysisError::Input`] for a shebang-only file, or
/// [`AnalysisError::Parse`] when the parser rejects the source (spec §7:
/// parse failure is fatal, never recovered from).
pub fn parse(source: &str, ecma_version: u16) -> Result<ParsedProgram, AnalysisError> {
    let (shebang, body) = split_shebang(source);

    if shebang.is_some() && body.trim().is_empty() {
        return Err(AnalysisError::Input {
            detail: "file contains only a shebang, no body to analyze".to_owned(),
        });
    }

    let cm: Lrc<SourceMap> = Lrc::default();
    let file = cm.new_source_file(Lrc::new(FileName::Custom("bundle.js".into())), body.clone());

    let syntax = Syntax::Es(EsConfig::default());
    let target = es_version_for(ecma_version);
    let lexer = Lexer::new(syntax, target, StringInput::from(&*file), None);
    let mut parser = Parser::new_from(lexer);

    let module = parser.parse_module().map_err(|e| {
        let span = e.span();
        let loc = cm.lookup_char_pos(span.lo);
        AnalysisError::Parse {
            message: format!("{:?}", e.kind()),
            line: loc.line as u32,
            column: loc.col.0 as u32 + 1,
        }
    })?;

    let base = file.start_pos;
    let count = module.body.len();
    let mut spans = Vec::with_capacity(count);
    let mut lines = Vec::with_capacity(count);
    let mut shapes = Vec::with_capacity(count);

    for item in &module.body {
        let span = item.span();
        let start = (span.lo.0 - base.0) as u32;
        let end = (span.hi.0 - base.0) as u32;
        spans.push(ByteSpan::new(start, end));

        let lo = cm.lookup_char_pos(span.lo);
        let hi = cm.lookup_char_pos(span.hi);
        lines.push(LineSpan::new(lo.line as u32, hi.line as u32));

        shapes.push(shape_of(item).to_owned());
    }

    tracing::debug!(statements = spans.len(), shebang = shebang.is_some(), "parsed bundle");

    Ok(ParsedProgram {
        shebang,
        body,
        items: module.body,
        spans,
        lines,
        shapes,
        base: base.0,
    })
}

fn es_version_for(year: u16) -> EsVersion {
    match year {
        ..=2015 => EsVersion::Es2015,
        2016 => EsVersion::Es2016,
        2017 => EsVersion::Es2017,
        2018 => EsVersion::Es2018,
        2019 => EsVersion::Es2019,
        2020 => EsVersion::Es2020,
        2021 => EsVersion::Es2021,
        2022 => EsVersion::Es2022,
        _ => EsVersion::EsNext,
    }
}

/// Strips a leading `#!...\n` shebang, returning it (without the trailing
/// newline) plus the remaining body. Offsets downstream are always relative
/// to the returned body (spec §4.1).
fn split_shebang(source: &str) -> (Option<String>, String) {
    if let Some(rest) = source.strip_prefix("#!") {
        if let Some(pos) = rest.find('\n') {
            let shebang = format!("#!{}", &rest[..pos]);
            return (Some(shebang), rest[pos + 1..].to_owned());
        }
        // `#!` with no newline: the whole file is the shebang line.
        return (Some(format!("#!{rest}")), String::new());
    }
    (None, source.to_owned())
}

/// Maps a top-level AST node to its ESTree-style shape tag (spec §4.3's
/// closed set, `FUNCTION_DECL`, `CLASS_DECL`, ... are derived from these by
/// the classifier).
fn shape_of(item: &ModuleItem) -> &'static str {
    match item {
        ModuleItem::ModuleDecl(decl) => match decl {
            ModuleDecl::Import(_) => "ImportDeclaration",
            ModuleDecl::ExportDecl(_) => "ExportNamedDeclaration",
            ModuleDecl::ExportNamed(_) => "ExportNamedDeclaration",
            ModuleDecl::ExportDefaultDecl(_) => "ExportDefaultDeclaration",
            ModuleDecl::ExportDefaultExpr(_) => "ExportDefaultDeclaration",
            ModuleDecl::ExportAll(_) => "ExportAllDeclaration",
            ModuleDecl::TsImportEquals(_) => "TSImportEqualsDeclaration",
            ModuleDecl::TsExportAssignment(_) => "TSExportAssignment",
            ModuleDecl::TsNamespaceExport(_) => "TSNamespaceExportDeclaration",
        },
        ModuleItem::Stmt(stmt) => match stmt {
            Stmt::Block(_) => "BlockStatement",
            Stmt::Empty(_) => "EmptyStatement",
            Stmt::Debugger(_) => "DebuggerStatement",
            Stmt::With(_) => "WithStatement",
            Stmt::Return(_) => "ReturnStatement",
            Stmt::Labeled(_) => "LabeledStatement",
            Stmt::Break(_) => "BreakStatement",
            Stmt::Continue(_) => "ContinueStatement",
            Stmt::If(_) => "IfStatement",
            Stmt::Switch(_) => "SwitchStatement",
            Stmt::Throw(_) => "ThrowStatement",
            Stmt::Try(_) => "TryStatement",
            Stmt::While(_) => "WhileStatement",
            Stmt::DoWhile(_) => "DoWhileStatement",
            Stmt::For(_) => "ForStatement",
            Stmt::ForIn(_) => "ForInStatement",
            Stmt::ForOf(_) => "ForOfStatement",
            Stmt::Expr(_) => "ExpressionStatement",
            Stmt::Decl(decl) => match decl {
                Decl::Class(_) => "ClassDeclaration",
                Decl::Fn(_) => "FunctionDeclaration",
                Decl::Var(_) => "VariableDeclaration",
                Decl::Using(_) => "UsingDeclaration",
                Decl::TsInterface(_) => "TSInterfaceDeclaration",
                Decl::TsTypeAlias(_) => "TSTypeAliasDeclaration",
                Decl::TsEnum(_) => "TSEnumDeclaration",
                Decl::TsModule(_) => "TSModuleDeclaration",
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_and_preserves_shebang() {
        let src = "#!/usr/bin/env node\nvar a = 1;\n";
        let parsed = parse(src, 2022).unwrap();
        assert_eq!(parsed.shebang.as_deref(), Some("#!/usr/bin/env node"));
        assert_eq!(parsed.body, "var a = 1;\n");
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn no_shebang_is_identity() {
        let src = "var a = 1;\nvar b = 2;\n";
        let parsed = parse(src, 2022).unwrap();
        assert!(parsed.shebang.is_none());
        assert_eq!(parsed.body, src);
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn spans_are_disjoint_and_ordered() {
        let src = indoc::indoc! {"
            var a = 1; function f(){}
            class C {}
        "};
        let parsed = parse(src, 2022).unwrap();
        for pair in parsed.spans.windows(2) {
            assert!(pair[1].start >= pair[0].end);
        }
    }

    #[test]
    fn shebang_only_file_is_input_error() {
        let src = "#!/usr/bin/env node\n";
        let err = parse(src, 2022).unwrap_err();
        assert!(matches!(err, AnalysisError::Input { .. }));
    }

    #[test]
    fn parse_error_reports_position() {
        let src = "var a = ;";
        let err = parse(src, 2022).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { .. }));
    }
}
