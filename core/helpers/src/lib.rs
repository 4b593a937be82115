//! Runtime helper detector (spec §4.2).
//!
//! Walks only `ast.body` (never recurses into nested scopes): for each
//! top-level variable declarator, applies the detection rules in order and
//! records the first match. Decisions are independent per declarator; the
//! map returned is the union across the whole file.

use deminify_model::{HelperKind, HelperMap};
use swc_common::Spanned;
use swc_ecma_ast::{
    BlockStmtOrExpr, Decl, Expr, ModuleItem, Pat, Stmt, VarDeclarator,
};

/// Detects helper declarations across every top-level statement.
///
/// `text` slices the original source for a given `swc_common::Span`
/// (typically [`deminify_source::ParsedProgram::text`]); whitespace-trimmed
/// substring heuristics (spec §4.2, §9) need the raw characters, not swc's
/// pretty-printed AST.
pub fn detect<'a>(items: &[ModuleItem], text: impl Fn(swc_common::Span) -> &'a str) -> HelperMap {
    let mut map = HelperMap::new();
    for item in items {
        let ModuleItem::Stmt(Stmt::Decl(Decl::Var(var_decl))) = item else {
            continue;
        };
        for declarator in &var_decl.decls {
            if let Some((name, kind)) = classify_declarator(declarator, &text) {
                map.record(name, kind);
            }
        }
    }
    map
}

fn classify_declarator<'a>(
    declarator: &VarDeclarator,
    text: &impl Fn(swc_common::Span) -> &'a str,
) -> Option<(String, HelperKind)> {
    let name = simple_ident(&declarator.name)?;
    let init = declarator.init.as_deref()?;

    // Known name shortcut.
    if let Some(kind) = known_name_kind(name) {
        return Some((name.to_owned(), kind));
    }

    // Curried arrow shape: (a, b) => () => { ... }
    if let Some(kind) = curried_arrow_kind(init, text) {
        return Some((name.to_owned(), kind));
    }

    // Function (arrow or expression) containing `__esModule`/`esModule`.
    if is_function_expr(init) {
        let body_text = text(init.span());
        if body_text.contains("__esModule") || body_text.contains("esModule") {
            return Some((name.to_owned(), HelperKind::ToEsm));
        }
        if body_text.contains("getOwnPropertyNames") && body_text.contains("defineProperty") {
            return Some((name.to_owned(), HelperKind::CopyProps));
        }
    }

    None
}

fn known_name_kind(name: &str) -> Option<HelperKind> {
    match name {
        "__commonJS" => Some(HelperKind::CommonJs),
        "__esm" => Some(HelperKind::Esm),
        "__toESM" => Some(HelperKind::ToEsm),
        "__copyProps" => Some(HelperKind::CopyProps),
        _ => None,
    }
}

/// `(a, b) => () => { ... }`: checks the inner arrow's body, whitespace
/// removed, for the telltale substrings (spec §4.2, §9).
fn curried_arrow_kind<'a>(
    init: &Expr,
    text: &impl Fn(swc_common::Span) -> &'a str,
) -> Option<HelperKind> {
    let outer = init.as_arrow()?;
    if outer.params.len() != 2 {
        return None;
    }
    let BlockStmtOrExpr::Expr(inner_expr) = outer.body.as_ref() else {
        return None;
    };
    let inner = inner_expr.as_arrow()?;
    if !inner.params.is_empty() {
        return None;
    }

    let slice = text(inner.body.span());
    let trimmed: String = slice.chars().filter(|c| !c.is_whitespace()).collect();

    if trimmed.contains("exports") && trimmed.contains("{}") {
        Some(HelperKind::CommonJs)
    } else if trimmed.contains("=0") && !trimmed.contains("exports") {
        Some(HelperKind::Esm)
    } else {
        None
    }
}

fn is_function_expr(expr: &Expr) -> bool {
    matches!(expr, Expr::Arrow(_) | Expr::Fn(_))
}

fn simple_ident(pat: &Pat) -> Option<&str> {
    match pat {
        Pat::Ident(binding) => Some(binding.id.sym.as_ref()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deminify_model::HelperKind;

    fn helpers_for(src: &str) -> HelperMap {
        let parsed = deminify_source::parse(src, 2022).unwrap();
        detect(&parsed.items, |span| parsed.text(span))
    }

    #[test]
    fn detects_common_js_by_known_name() {
        let map = helpers_for("var __commonJS = (a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);");
        assert_eq!(map.get("__commonJS"), Some(HelperKind::CommonJs));
    }

    #[test]
    fn detects_common_js_by_curried_shape() {
        let map = helpers_for("var w=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);");
        assert_eq!(map.get("w"), Some(HelperKind::CommonJs));
    }

    #[test]
    fn detects_esm_by_curried_shape() {
        let map = helpers_for("var v=(a,b)=>()=>(a=0,b());");
        assert_eq!(map.get("v"), Some(HelperKind::Esm));
    }

    #[test]
    fn detects_to_esm_by_esmodule_marker() {
        let map = helpers_for("var t=(m)=>(m&&m.__esModule?m:{default:m});");
        assert_eq!(map.get("t"), Some(HelperKind::ToEsm));
    }

    #[test]
    fn detects_copy_props_by_reflection_calls() {
        let map = helpers_for(
            "var c=(to,from)=>{for (var k of Object.getOwnPropertyNames(from)) Object.defineProperty(to,k,{});return to;};",
        );
        assert_eq!(map.get("c"), Some(HelperKind::CopyProps));
    }

    #[test]
    fn unrelated_declarations_are_not_recorded() {
        let map = helpers_for("var x = 1; let y = foo();");
        assert!(map.is_empty());
    }
}
