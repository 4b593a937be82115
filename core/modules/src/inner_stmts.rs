//! Factory-body statement counting for the `stmt_count` size metric (spec §4.8).

use deminify_model::HelperKind;
use swc_ecma_ast::{BlockStmt, CallExpr, Callee, Decl, Expr, ModuleItem, Stmt};
use swc_ecma_visit::{Visit, VisitWith};

/// Finds the `CallExpr` of the declarator whose initializer invokes a
/// helper of the given `kind`, if this statement is a `VariableDeclaration`.
#[must_use]
pub fn factory_call<'a>(
    item: &'a ModuleItem,
    helpers: &deminify_model::HelperMap,
    kind: HelperKind,
) -> Option<&'a CallExpr> {
    let ModuleItem::Stmt(Stmt::Decl(Decl::Var(var_decl))) = item else {
        return None;
    };
    var_decl.decls.iter().find_map(|decl| {
        let call = decl.init.as_deref()?.as_call()?;
        let name = callee_name(call)?;
        if helpers.get(name) == Some(kind) {
            Some(call)
        } else {
            None
        }
    })
}

#[must_use]
pub fn callee_name(call: &CallExpr) -> Option<&str> {
    match &call.callee {
        Callee::Expr(expr) => expr.as_ident().map(|ident| ident.sym.as_ref()),
        _ => None,
    }
}

/// Sums `stmts.len()` over every `BlockStatement` found inside `expr` (spec
/// §4.8: "walk BlockStatement nodes inside the first argument of the
/// factory call and sum their body.length").
#[must_use]
pub fn count_block_statements(expr: &Expr) -> u32 {
    let mut counter = BlockStmtCounter::default();
    expr.visit_with(&mut counter);
    counter.total
}

#[derive(Default)]
struct BlockStmtCounter {
    total: u32,
}

impl Visit for BlockStmtCounter {
    fn visit_block_stmt(&mut self, node: &BlockStmt) {
        self.total += node.stmts.len() as u32;
        node.visit_children_with(self);
    }
}
