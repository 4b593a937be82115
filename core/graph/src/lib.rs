//! Definition map and statement-level reference graph builders (spec §4.5–§4.6).

use deminify_model::{DefinitionMap, ReferenceGraph};
use swc_ecma_ast::{
    ClassDecl, Decl, ExportDecl, FnDecl, Ident, ImportSpecifier, ModuleDecl, ModuleItem, Pat,
    Stmt, VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

/// Names a single top-level statement introduces, in declaration order
/// (spec §4.5). These become both `Statement::names` and the entries fed
/// to [`build_definitions`].
#[must_use]
pub fn statement_names(item: &ModuleItem) -> Vec<String> {
    match item {
        ModuleItem::Stmt(Stmt::Decl(decl)) => decl_names(decl),
        ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(ExportDecl { decl, .. })) => decl_names(decl),
        ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => import
            .specifiers
            .iter()
            .map(|spec| match spec {
                ImportSpecifier::Named(s) => s.local.sym.to_string(),
                ImportSpecifier::Default(s) => s.local.sym.to_string(),
                ImportSpecifier::Namespace(s) => s.local.sym.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn decl_names(decl: &Decl) -> Vec<String> {
    match decl {
        Decl::Fn(FnDecl { ident, .. }) => vec![ident.sym.to_string()],
        Decl::Class(ClassDecl { ident, .. }) => vec![ident.sym.to_string()],
        Decl::Var(var_decl) => var_decl.decls.iter().flat_map(pat_names).collect(),
        _ => Vec::new(),
    }
}

fn pat_names(declarator: &VarDeclarator) -> Vec<String> {
    let mut names = Vec::new();
    collect_pat_names(&declarator.name, &mut names);
    names
}

fn collect_pat_names(pat: &Pat, out: &mut Vec<String>) {
    match pat {
        Pat::Ident(binding) => out.push(binding.id.sym.to_string()),
        Pat::Array(arr) => {
            for elem in arr.elems.iter().flatten() {
                collect_pat_names(elem, out);
            }
        }
        Pat::Object(obj) => {
            for prop in &obj.props {
                match prop {
                    swc_ecma_ast::ObjectPatProp::KeyValue(kv) => collect_pat_names(&kv.value, out),
                    swc_ecma_ast::ObjectPatProp::Assign(a) => out.push(a.key.sym.to_string()),
                    swc_ecma_ast::ObjectPatProp::Rest(r) => collect_pat_names(&r.arg, out),
                }
            }
        }
        Pat::Assign(a) => collect_pat_names(&a.left, out),
        Pat::Rest(r) => collect_pat_names(&r.arg, out),
        Pat::Expr(_) | Pat::Invalid(_) => {}
    }
}

/// Builds the identifier -> defining-statement map (spec §4.5):
/// first-definition-wins across the whole file.
#[must_use]
pub fn build_definitions(names_per_statement: &[Vec<String>]) -> DefinitionMap {
    let mut definitions = DefinitionMap::new();
    for (index, names) in names_per_statement.iter().enumerate() {
        for name in names {
            definitions.define(name.clone(), index as u32);
        }
    }
    definitions
}

/// Builds the statement-level reference graph (spec §4.6): for every
/// identifier `n` encountered anywhere inside statement `i` (declarations and
/// uses alike) that is bound by [`DefinitionMap`] and not itself one of the
/// names `i` defines, adds the edge `i -> owner`.
#[must_use]
pub fn build_references(items: &[ModuleItem], definitions: &DefinitionMap) -> ReferenceGraph {
    let names_per_statement: Vec<Vec<String>> = items.iter().map(statement_names).collect();
    let mut graph = ReferenceGraph::with_len(items.len());
    for (index, item) in items.iter().enumerate() {
        let mut collector = IdentCollector::default();
        item.visit_with(&mut collector);
        for name in collector.idents {
            if names_per_statement[index].contains(&name) {
                continue;
            }
            if let Some(owner) = definitions.owner(&name) {
                graph.add_edge(index as u32, owner);
            }
        }
    }
    graph
}

#[derive(Default)]
struct IdentCollector {
    idents: Vec<String>,
}

impl Visit for IdentCollector {
    fn visit_ident(&mut self, node: &Ident) {
        self.idents.push(node.sym.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(src: &str) -> (Vec<Vec<String>>, DefinitionMap, ReferenceGraph) {
        let parsed = deminify_source::parse(src, 2022).unwrap();
        let names: Vec<Vec<String>> = parsed.items.iter().map(statement_names).collect();
        let definitions = build_definitions(&names);
        let graph = build_references(&parsed.items, &definitions);
        (names, definitions, graph)
    }

    #[test]
    fn var_decl_defines_its_identifier() {
        let (_, defs, _) = build("var a = 1;\nvar b = a;\n");
        assert_eq!(defs.owner("a"), Some(0));
        assert_eq!(defs.owner("b"), Some(1));
    }

    #[test]
    fn reference_creates_edge_to_owner() {
        let (_, _, graph) = build("var a = 1;\nvar b = a;\n");
        assert!(graph.refs_out(1).contains(&0));
        assert!(graph.refs_in(0).contains(&1));
    }

    #[test]
    fn first_definition_wins_on_rebinding() {
        let (_, defs, _) = build("var a = 1;\nvar a = 2;\n");
        assert_eq!(defs.owner("a"), Some(0));
    }

    #[test]
    fn self_reference_is_not_an_edge() {
        let (_, _, graph) = build("function f(){ return f; }\n");
        assert!(graph.refs_out(0).is_empty());
    }

    #[test]
    fn destructuring_binds_every_name() {
        let (names, defs, _) = build("var {a, b: [c]} = x;\n");
        assert_eq!(names[0], vec!["a".to_owned(), "c".to_owned()]);
        assert_eq!(defs.owner("a"), Some(0));
        assert_eq!(defs.owner("c"), Some(0));
    }
}
