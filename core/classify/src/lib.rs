//! Statement classifier and bundler fingerprinter (spec §4.3–§4.4).

mod fingerprint;

pub use fingerprint::fingerprint;

use deminify_model::{HelperKind, HelperMap, WrapKind};
use swc_ecma_ast::{Decl, Expr, MemberProp, ModuleDecl, ModuleItem, Pat, Stmt, VarDeclarator};

/// One statement's classifier output: a joined category string and the
/// WrapKind it implies (spec §4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementClass {
    pub category: String,
    pub wrap_kind: WrapKind,
}

/// Classifies every top-level statement. `index` matters only for the
/// preamble cutoff (`< 10`, spec §4.3); it is the statement's position in
/// `items`, independent of any later module assignment.
#[must_use]
pub fn classify(items: &[ModuleItem], helpers: &HelperMap) -> Vec<StatementClass> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| classify_one(index as u32, item, helpers))
        .collect()
}

fn classify_one(index: u32, item: &ModuleItem, helpers: &HelperMap) -> StatementClass {
    let category = match item {
        ModuleItem::Stmt(Stmt::Decl(Decl::Var(var_decl))) => {
            classify_var_decl(index, &var_decl.decls, helpers)
        }
        other => other_category(other).to_owned(),
    };
    let wrap_kind = wrap_kind_from_category(&category);
    StatementClass { category, wrap_kind }
}

/// The known `Object.*` aliases that count as preamble bindings (spec §4.3).
const PREAMBLE_MEMBERS: &[&str] = &[
    "create",
    "defineProperty",
    "getOwnPropertyDescriptor",
    "getOwnPropertyNames",
    "getPrototypeOf",
];

fn classify_var_decl(index: u32, decls: &[VarDeclarator], helpers: &HelperMap) -> String {
    let mut contributions: Vec<String> = Vec::new();
    let mut has_helper_definition = false;
    let mut has_factory_call = false;

    for decl in decls {
        let Some(name) = simple_ident(&decl.name) else {
            contributions.push("VAR_DECL".to_owned());
            continue;
        };

        if let Some(kind) = helpers.get(name) {
            has_helper_definition = true;
            contributions.push(format!("RUNTIME_HELPER.{}", kind.as_str()));
            continue;
        }

        let Some(init) = decl.init.as_deref() else {
            contributions.push("VAR_DECL".to_owned());
            continue;
        };

        if index < 10 && is_object_alias(init) {
            has_helper_definition = true;
            contributions.push(format!("RUNTIME_HELPER.{}", HelperKind::Preamble.as_str()));
            continue;
        }

        if let Some(category) = factory_call_category(init, helpers) {
            has_factory_call = true;
            contributions.push(category);
            continue;
        }

        contributions.push("VAR_DECL".to_owned());
    }

    // Helper-definition wins when both exist on the same statement (spec §4.3).
    if has_helper_definition && has_factory_call {
        contributions.retain(|c| !is_factory_like(c));
    }

    contributions.sort();
    contributions.dedup();
    contributions.join("+")
}

fn is_factory_like(category: &str) -> bool {
    category.starts_with("MODULE_FACTORY")
        || category.starts_with("ADAPTED_IMPORT")
        || category.starts_with("REEXPORT")
}

fn factory_call_category(init: &Expr, helpers: &HelperMap) -> Option<String> {
    let call = init.as_call()?;
    let callee_ident = call.callee.as_expr()?.as_ident()?;
    let kind = helpers.get(callee_ident.sym.as_ref())?;
    Some(match kind {
        HelperKind::CommonJs => "MODULE_FACTORY.__commonJS".to_owned(),
        HelperKind::Esm => "MODULE_FACTORY.__esm".to_owned(),
        HelperKind::ToEsm => "ADAPTED_IMPORT.__toESM".to_owned(),
        HelperKind::CopyProps => "REEXPORT.__copyProps".to_owned(),
        HelperKind::Preamble => return None,
    })
}

/// `Object.create` / `Object.defineProperty` / ... / `Object.prototype.hasOwnProperty`.
fn is_object_alias(init: &Expr) -> bool {
    let Some(member) = init.as_member() else {
        return false;
    };
    let Some(prop_name) = member_prop_name(&member.prop) else {
        return false;
    };

    if PREAMBLE_MEMBERS.contains(&prop_name) {
        if let Some(obj_ident) = member.obj.as_ident() {
            return obj_ident.sym.as_ref() == "Object";
        }
        return false;
    }

    if prop_name == "hasOwnProperty" {
        if let Some(inner) = member.obj.as_member() {
            if let (Some(obj_ident), Some(inner_prop)) =
                (inner.obj.as_ident(), member_prop_name(&inner.prop))
            {
                return obj_ident.sym.as_ref() == "Object" && inner_prop == "prototype";
            }
        }
    }

    false
}

fn member_prop_name(prop: &MemberProp) -> Option<&str> {
    match prop {
        MemberProp::Ident(ident) => Some(ident.sym.as_ref()),
        _ => None,
    }
}

fn simple_ident(pat: &Pat) -> Option<&str> {
    match pat {
        Pat::Ident(binding) => Some(binding.id.sym.as_ref()),
        _ => None,
    }
}

fn other_category(item: &ModuleItem) -> &'static str {
    match item {
        ModuleItem::ModuleDecl(decl) => match decl {
            ModuleDecl::Import(_) => "IMPORT",
            ModuleDecl::ExportDecl(_) | ModuleDecl::ExportNamed(_) => "EXPORT_NAMED",
            ModuleDecl::ExportDefaultDecl(_) | ModuleDecl::ExportDefaultExpr(_) => "EXPORT_DEFAULT",
            ModuleDecl::ExportAll(_) => "EXPORT_ALL",
            ModuleDecl::TsImportEquals(_) => "TSIMPORTEQUALSDECLARATION",
            ModuleDecl::TsExportAssignment(_) => "TSEXPORTASSIGNMENT",
            ModuleDecl::TsNamespaceExport(_) => "TSNAMESPACEEXPORTDECLARATION",
        },
        ModuleItem::Stmt(stmt) => match stmt {
            Stmt::Decl(Decl::Fn(_)) => "FUNCTION_DECL",
            Stmt::Decl(Decl::Class(_)) => "CLASS_DECL",
            Stmt::Decl(Decl::Var(_)) => unreachable!("handled by classify_var_decl"),
            Stmt::Decl(Decl::Using(_)) => "USINGDECLARATION",
            Stmt::Decl(Decl::TsInterface(_)) => "TSINTERFACEDECLARATION",
            Stmt::Decl(Decl::TsTypeAlias(_)) => "TSTYPEALIASDECLARATION",
            Stmt::Decl(Decl::TsEnum(_)) => "TSENUMDECLARATION",
            Stmt::Decl(Decl::TsModule(_)) => "TSMODULEDECLARATION",
            Stmt::Expr(_) => "EXPRESSION",
            Stmt::If(_) => "IF_STMT",
            Stmt::For(_) | Stmt::ForIn(_) | Stmt::ForOf(_) => "FOR_STMT",
            Stmt::While(_) | Stmt::DoWhile(_) => "WHILE_STMT",
            Stmt::Try(_) => "TRY_STMT",
            Stmt::Switch(_) => "SWITCH_STMT",
            Stmt::Block(_) => "BLOCK_STMT",
            Stmt::Empty(_) => "EMPTY",
            Stmt::Return(_) => "RETURNSTATEMENT",
            Stmt::Labeled(_) => "LABELEDSTATEMENT",
            Stmt::Break(_) => "BREAKSTATEMENT",
            Stmt::Continue(_) => "CONTINUESTATEMENT",
            Stmt::Throw(_) => "THROWSTATEMENT",
            Stmt::Debugger(_) => "DEBUGGERSTATEMENT",
            Stmt::With(_) => "WITHSTATEMENT",
        },
    }
}

fn wrap_kind_from_category(category: &str) -> WrapKind {
    let parts: Vec<&str> = category.split('+').collect();
    if parts.iter().any(|p| *p == "MODULE_FACTORY.__commonJS") {
        WrapKind::Cjs
    } else if parts.iter().any(|p| {
        *p == "MODULE_FACTORY.__esm" || *p == "ADAPTED_IMPORT.__toESM" || *p == "REEXPORT.__copyProps"
    }) {
        WrapKind::Esm
    } else if parts.iter().any(|p| p.starts_with("RUNTIME_HELPER.")) {
        WrapKind::Runtime
    } else {
        WrapKind::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_src(src: &str) -> Vec<StatementClass> {
        let parsed = deminify_source::parse(src, 2022).unwrap();
        let helpers = deminify_helpers::detect(&parsed.items, |span| parsed.text(span));
        classify(&parsed.items, &helpers)
    }

    #[test]
    fn helper_definition_is_runtime() {
        let classes = classify_src("var w=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);");
        assert_eq!(classes[0].wrap_kind, WrapKind::Runtime);
        assert_eq!(classes[0].category, "RUNTIME_HELPER.__commonJS");
    }

    #[test]
    fn factory_call_is_cjs() {
        let src = "var w=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);\nvar r=w((e,m)=>{m.exports=1;});";
        let classes = classify_src(src);
        assert_eq!(classes[1].wrap_kind, WrapKind::Cjs);
        assert_eq!(classes[1].category, "MODULE_FACTORY.__commonJS");
    }

    #[test]
    fn preamble_alias_before_index_ten() {
        let classes = classify_src("var _ = Object.create;");
        assert_eq!(classes[0].category, "RUNTIME_HELPER.preamble");
        assert_eq!(classes[0].wrap_kind, WrapKind::Runtime);
    }

    #[test]
    fn plain_statements_map_to_closed_set() {
        let classes = classify_src("function f(){}\nclass C{}\nif(1){}\n");
        assert_eq!(classes[0].category, "FUNCTION_DECL");
        assert_eq!(classes[1].category, "CLASS_DECL");
        assert_eq!(classes[2].category, "IF_STMT");
        assert!(classes.iter().all(|c| c.wrap_kind == WrapKind::None));
    }

    #[test]
    fn plain_var_decl_is_none() {
        let classes = classify_src("var x = 1;");
        assert_eq!(classes[0].category, "VAR_DECL");
        assert_eq!(classes[0].wrap_kind, WrapKind::None);
    }
}
