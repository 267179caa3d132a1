//! Read-only traversal.
//!
//! Override a `visit_*` method to intercept a node kind and call the
//! matching `walk_*` function to keep descending.

use crate::expr::{Element, Expr, ExprKind, FnBody, Function, Prop, PropKey, TemplatePart};
use crate::stmt::{ForInit, Stmt, StmtKind, VarDecl};
use crate::{Program, TempBinding};

pub trait Visitor {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_function(&mut self, func: &Function) {
        walk_function(self, func);
    }

    fn visit_temp_binding(&mut self, binding: &TempBinding) {
        for step in &binding.steps {
            self.visit_expr(step);
        }
    }
}

pub fn walk_program<V: Visitor + ?Sized>(v: &mut V, program: &Program) {
    for stmt in &program.body {
        v.visit_stmt(stmt);
    }
}

fn walk_var_decl<V: Visitor + ?Sized>(v: &mut V, decl: &VarDecl) {
    for declarator in &decl.declarators {
        if let Some(init) = &declarator.init {
            v.visit_expr(init);
        }
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(v: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::VarDecl(decl) => walk_var_decl(v, decl),
        StmtKind::FnDecl(func) => v.visit_function(func),
        StmtKind::Block(stmts) | StmtKind::Lowered { stmts, .. } => {
            for s in stmts {
                v.visit_stmt(s);
            }
        }
        StmtKind::Return(expr) => {
            if let Some(e) = expr {
                v.visit_expr(e);
            }
        }
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            v.visit_expr(cond);
            v.visit_stmt(then_branch);
            if let Some(e) = else_branch {
                v.visit_stmt(e);
            }
        }
        StmtKind::While { cond, body } => {
            v.visit_expr(cond);
            v.visit_stmt(body);
        }
        StmtKind::For {
            init,
            test,
            update,
            body,
        } => {
            match init {
                Some(ForInit::VarDecl(decl)) => walk_var_decl(v, decl),
                Some(ForInit::Expr(e)) => v.visit_expr(e),
                None => {}
            }
            if let Some(e) = test {
                v.visit_expr(e);
            }
            if let Some(e) = update {
                v.visit_expr(e);
            }
            v.visit_stmt(body);
        }
        StmtKind::ForOf { iterable, body, .. } => {
            v.visit_expr(iterable);
            v.visit_stmt(body);
        }
        StmtKind::Throw(e) | StmtKind::Expr(e) => v.visit_expr(e),
        StmtKind::TempBinding(binding) => v.visit_temp_binding(binding),
        StmtKind::Break
        | StmtKind::Continue
        | StmtKind::Empty
        | StmtKind::Rejected { .. } => {}
    }
}

pub fn walk_function<V: Visitor + ?Sized>(v: &mut V, func: &Function) {
    match &func.body {
        FnBody::Block(stmts) => {
            for s in stmts {
                v.visit_stmt(s);
            }
        }
        FnBody::Expr(e) => v.visit_expr(e),
    }
}

fn walk_elements<V: Visitor + ?Sized>(v: &mut V, elements: &[Element]) {
    for el in elements {
        v.visit_expr(el.expr());
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(v: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Template(parts) => {
            for part in parts {
                if let TemplatePart::Expr(e) = part {
                    v.visit_expr(e);
                }
            }
        }
        ExprKind::Array(elements) => walk_elements(v, elements),
        ExprKind::Object(props) => {
            for prop in props {
                match prop {
                    Prop::KeyValue { key, value } => {
                        if let PropKey::Computed(k) = key {
                            v.visit_expr(k);
                        }
                        v.visit_expr(value);
                    }
                    Prop::Spread(e) => v.visit_expr(e),
                    Prop::Shorthand(_) => {}
                }
            }
        }
        ExprKind::Member { object, .. } => v.visit_expr(object),
        ExprKind::Index { object, index, .. } => {
            v.visit_expr(object);
            v.visit_expr(index);
        }
        ExprKind::Call { callee, args, .. } => {
            v.visit_expr(callee);
            walk_elements(v, args);
        }
        ExprKind::New { callee, args } => {
            v.visit_expr(callee);
            if let Some(args) = args {
                walk_elements(v, args);
            }
        }
        ExprKind::Function(func) => v.visit_function(func),
        ExprKind::Unary { arg, .. } | ExprKind::Update { arg, .. } => v.visit_expr(arg),
        ExprKind::Binary { lhs, rhs, .. } => {
            v.visit_expr(lhs);
            v.visit_expr(rhs);
        }
        ExprKind::Conditional {
            test,
            consequent,
            alternate,
        } => {
            v.visit_expr(test);
            v.visit_expr(consequent);
            v.visit_expr(alternate);
        }
        ExprKind::Assign { target, value, .. } => {
            v.visit_expr(target);
            v.visit_expr(value);
        }
        ExprKind::Sequence(exprs) => {
            for e in exprs {
                v.visit_expr(e);
            }
        }
        ExprKind::TempBinding(binding) => v.visit_temp_binding(binding),
        ExprKind::Lowered { expr, .. } => v.visit_expr(expr),
        ExprKind::Number(_)
        | ExprKind::Str(_)
        | ExprKind::Bool(_)
        | ExprKind::Null
        | ExprKind::Ident(_)
        | ExprKind::This
        | ExprKind::Rejected { .. }
        | ExprKind::Missing => {}
    }
}

/// Whether `expr` contains `await` outside nested functions.
pub fn contains_await(expr: &Expr) -> bool {
    struct AwaitFinder(bool);

    impl Visitor for AwaitFinder {
        fn visit_expr(&mut self, expr: &Expr) {
            if let ExprKind::Unary {
                op: crate::UnaryOp::Await,
                ..
            } = expr.kind
            {
                self.0 = true;
                return;
            }
            walk_expr(self, expr);
        }

        fn visit_function(&mut self, _func: &Function) {}
    }

    let mut finder = AwaitFinder(false);
    finder.visit_expr(expr);
    finder.0
}

/// Number of temporary-binding nodes still present in `program`.
pub fn count_temp_bindings(program: &Program) -> usize {
    struct Counter(usize);

    impl Visitor for Counter {
        fn visit_temp_binding(&mut self, binding: &TempBinding) {
            self.0 += 1;
            for step in &binding.steps {
                self.visit_expr(step);
            }
        }
    }

    let mut counter = Counter(0);
    walk_program(&mut counter, program);
    counter.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Ident, UnaryOp};
    use tbind_common::span::Span;

    fn sp() -> Span {
        Span::default()
    }

    fn await_expr(arg: Expr) -> Expr {
        Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Await,
                arg: Box::new(arg),
            },
            sp(),
        )
    }

    #[test]
    fn await_is_found_outside_functions_only() {
        let direct = Expr::call(
            Expr::ident("f", sp()),
            vec![Element::Expr(await_expr(Expr::ident("p", sp())))],
            sp(),
        );
        assert!(contains_await(&direct));

        let nested = Expr::new(
            ExprKind::Function(Box::new(Function {
                name: None,
                params: vec![],
                body: FnBody::Expr(Box::new(await_expr(Expr::ident("p", sp())))),
                is_async: true,
                is_arrow: true,
            })),
            sp(),
        );
        assert!(!contains_await(&nested));
    }

    #[test]
    fn counts_nested_temp_bindings() {
        let inner = TempBinding {
            id: crate::ConstructId(1),
            form: crate::ConstructForm::Expression,
            qualifier: crate::DeclKind::Let,
            binding: Ident::new("$", sp()),
            result_name: None,
            steps: vec![Expr::number("1", sp())],
            source: String::new(),
        };
        let outer = TempBinding {
            id: crate::ConstructId(0),
            form: crate::ConstructForm::Declaration,
            qualifier: crate::DeclKind::Const,
            binding: Ident::new("$", sp()),
            result_name: Some(Ident::new("x", sp())),
            steps: vec![Expr::new(ExprKind::TempBinding(Box::new(inner)), sp())],
            source: String::new(),
        };
        let program = Program {
            body: vec![Stmt::new(StmtKind::TempBinding(Box::new(outer)), sp())],
            span: sp(),
        };
        assert_eq!(count_temp_bindings(&program), 2);
    }
}
