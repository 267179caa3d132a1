//! Lowering transform: builds the plain code that replaces a resolved
//! construct.
//!
//! For steps `s1..sn` and synthetic name `B`:
//!
//! ```text
//! const($) x = s1, s2, s3;   =>   let B = s1;
//!                                 const x = (B = s2, B = s3);
//!
//! f(let($) = s1, s2)         =>   f((() => { let B = s1; return B = s2; })())
//! ```
//!
//! Each step appears exactly once in the output, in source order.

use tbind_common::span::Span;
use tbind_hir::{
    ConstructForm, DeclKind, Element, Expr, ExprKind, FnBody, Function, Ident, Stmt, UnaryOp,
};

use crate::config::Target;

/// Replacement code for one construct.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Lowering {
    /// Declaration form: statements spliced into the enclosing list.
    Stmts(Vec<Stmt>),
    /// Expression form: one expression at the construct's position.
    Expr(Expr),
}

/// A construct ready to lower: hygiene is done and steps are plain code.
pub(crate) struct Resolved {
    pub form: ConstructForm,
    pub qualifier: DeclKind,
    pub result_name: Option<Ident>,
    pub steps: Vec<Expr>,
    pub synthetic: String,
    pub span: Span,
}

/// An expression that runs statements in a private scope and evaluates to
/// what they return. The statements' bindings stay invisible outside.
pub trait ScopedExpression {
    fn wrap(&self, body: Vec<Stmt>, span: Span) -> Expr;

    /// How the synthetic binding is declared inside the scope.
    fn binding_kind(&self) -> DeclKind;
}

/// `(() => { ... })()`
pub struct ArrowIife;

/// `await (async () => { ... })()`, for steps that await.
pub struct AsyncArrowIife;

/// `(function () { ... }).call(this)`, optionally async and awaited.
pub struct FunctionIife {
    pub is_async: bool,
}

fn closure(body: Vec<Stmt>, is_async: bool, is_arrow: bool, span: Span) -> Expr {
    Expr::new(
        ExprKind::Function(Box::new(Function {
            name: None,
            params: Vec::new(),
            body: FnBody::Block(body),
            is_async,
            is_arrow,
        })),
        span,
    )
}

fn awaited(expr: Expr, span: Span) -> Expr {
    Expr::new(
        ExprKind::Unary {
            op: UnaryOp::Await,
            arg: Box::new(expr),
        },
        span,
    )
}

impl ScopedExpression for ArrowIife {
    fn wrap(&self, body: Vec<Stmt>, span: Span) -> Expr {
        Expr::call(closure(body, false, true, span), Vec::new(), span)
    }

    fn binding_kind(&self) -> DeclKind {
        DeclKind::Let
    }
}

impl ScopedExpression for AsyncArrowIife {
    fn wrap(&self, body: Vec<Stmt>, span: Span) -> Expr {
        awaited(Expr::call(closure(body, true, true, span), Vec::new(), span), span)
    }

    fn binding_kind(&self) -> DeclKind {
        DeclKind::Let
    }
}

impl ScopedExpression for FunctionIife {
    fn wrap(&self, body: Vec<Stmt>, span: Span) -> Expr {
        // `.call(this)` keeps the caller's `this` inside the function.
        let callee = Expr::new(
            ExprKind::Member {
                object: Box::new(closure(body, self.is_async, false, span)),
                property: "call".to_string(),
                optional: false,
            },
            span,
        );
        let call = Expr::call(callee, vec![Element::Expr(Expr::new(ExprKind::This, span))], span);
        if self.is_async {
            awaited(call, span)
        } else {
            call
        }
    }

    fn binding_kind(&self) -> DeclKind {
        DeclKind::Var
    }
}

/// The scoped expression for a target. `awaits` is set when a step awaits
/// outside nested functions.
pub fn scoped_expression(target: Target, awaits: bool) -> Box<dyn ScopedExpression> {
    match (target, awaits) {
        (Target::Es2015, false) => Box::new(ArrowIife),
        (Target::Es2015, true) => Box::new(AsyncArrowIife),
        (Target::Es5, is_async) => Box::new(FunctionIife { is_async }),
    }
}

fn binding_kind(target: Target) -> DeclKind {
    match target {
        Target::Es5 => DeclKind::Var,
        Target::Es2015 => DeclKind::Let,
    }
}

/// `B`, `B = s2`, or `(B = s2, ..., B = sn)`.
fn sequence(synthetic: &str, rest: Vec<Expr>, span: Span) -> Expr {
    let mut assigns: Vec<Expr> = rest
        .into_iter()
        .map(|step| {
            let step_span = step.span;
            Expr::assign(Expr::ident(synthetic, step_span), step, step_span)
        })
        .collect();
    match assigns.len() {
        0 => Expr::ident(synthetic, span),
        1 => assigns.remove(0),
        _ => Expr::new(ExprKind::Sequence(assigns), span),
    }
}

pub(crate) fn lower(resolved: Resolved, target: Target) -> Lowering {
    let Resolved {
        form,
        qualifier,
        result_name,
        mut steps,
        synthetic,
        span,
    } = resolved;

    let first = if steps.is_empty() {
        Expr::void_zero(span)
    } else {
        steps.remove(0)
    };

    match (form, result_name) {
        (ConstructForm::Declaration, Some(name)) => {
            let binding = Stmt::var(
                binding_kind(target),
                Ident::new(&synthetic, span),
                first,
                span,
            );
            let value = sequence(&synthetic, steps, span);
            // ES5 has no block-scoped declarations.
            let qualifier = match target {
                Target::Es5 => DeclKind::Var,
                Target::Es2015 => qualifier,
            };
            let result = Stmt::var(qualifier, name, value, span);
            Lowering::Stmts(vec![binding, result])
        }
        _ => {
            let awaits = std::iter::once(&first)
                .chain(steps.iter())
                .any(tbind_hir::visit::contains_await);
            let scope = scoped_expression(target, awaits);
            let binding = Stmt::var(scope.binding_kind(), Ident::new(&synthetic, span), first, span);
            let ret = Stmt::ret(sequence(&synthetic, steps, span), span);
            Lowering::Expr(scope.wrap(vec![binding, ret], span))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbind_hir::{AssignOp, StmtKind};

    fn sp() -> Span {
        Span::new(0, 1)
    }

    fn num(n: &str) -> Expr {
        Expr::number(n, sp())
    }

    fn resolved(form: ConstructForm, steps: Vec<Expr>) -> Resolved {
        Resolved {
            form,
            qualifier: DeclKind::Const,
            result_name: match form {
                ConstructForm::Declaration => Some(Ident::new("x", sp())),
                ConstructForm::Expression => None,
            },
            steps,
            synthetic: "__tb1".to_string(),
            span: sp(),
        }
    }

    fn init(stmt: &Stmt) -> (&DeclKind, &str, &Expr) {
        let StmtKind::VarDecl(decl) = &stmt.kind else {
            panic!("expected declaration");
        };
        let d = &decl.declarators[0];
        (&decl.kind, &d.name.name, d.init.as_ref().expect("init"))
    }

    #[test]
    fn declaration_with_three_steps() {
        let Lowering::Stmts(stmts) = lower(
            resolved(ConstructForm::Declaration, vec![num("1"), num("2"), num("3")]),
            Target::Es2015,
        ) else {
            panic!("expected statements");
        };
        assert_eq!(stmts.len(), 2);
        let (kind, name, value) = init(&stmts[0]);
        assert_eq!((*kind, name), (DeclKind::Let, "__tb1"));
        assert_eq!(value.kind, ExprKind::Number("1".to_string()));

        let (kind, name, value) = init(&stmts[1]);
        assert_eq!((*kind, name), (DeclKind::Const, "x"));
        let ExprKind::Sequence(items) = &value.kind else {
            panic!("expected sequence");
        };
        assert_eq!(items.len(), 2);
        for (item, n) in items.iter().zip(["2", "3"]) {
            let ExprKind::Assign { op, target, value } = &item.kind else {
                panic!("expected assignment");
            };
            assert_eq!(*op, AssignOp::Assign);
            assert_eq!(target.as_ident().map(|i| i.name.as_str()), Some("__tb1"));
            assert_eq!(value.kind, ExprKind::Number(n.to_string()));
        }
    }

    #[test]
    fn single_step_declaration_reads_the_binding() {
        let Lowering::Stmts(stmts) =
            lower(resolved(ConstructForm::Declaration, vec![num("7")]), Target::Es2015)
        else {
            panic!("expected statements");
        };
        let (_, _, value) = init(&stmts[1]);
        assert_eq!(value.as_ident().map(|i| i.name.as_str()), Some("__tb1"));
    }

    #[test]
    fn es5_declares_with_var() {
        let Lowering::Stmts(stmts) =
            lower(resolved(ConstructForm::Declaration, vec![num("7")]), Target::Es5)
        else {
            panic!("expected statements");
        };
        assert_eq!(*init(&stmts[0]).0, DeclKind::Var);
        assert_eq!(*init(&stmts[1]).0, DeclKind::Var);
    }

    #[test]
    fn es2015_keeps_the_written_qualifier() {
        let Lowering::Stmts(stmts) =
            lower(resolved(ConstructForm::Declaration, vec![num("7")]), Target::Es2015)
        else {
            panic!("expected statements");
        };
        assert_eq!(*init(&stmts[0]).0, DeclKind::Let);
        assert_eq!(*init(&stmts[1]).0, DeclKind::Const);
    }

    #[test]
    fn expression_form_is_an_arrow_iife() {
        let Lowering::Expr(expr) = lower(
            resolved(ConstructForm::Expression, vec![num("1"), num("2")]),
            Target::Es2015,
        ) else {
            panic!("expected expression");
        };
        let ExprKind::Call { callee, args, .. } = &expr.kind else {
            panic!("expected call");
        };
        assert!(args.is_empty());
        let ExprKind::Function(func) = &callee.kind else {
            panic!("expected function");
        };
        assert!(func.is_arrow && !func.is_async);
        let FnBody::Block(body) = &func.body else {
            panic!("expected block");
        };
        assert!(matches!(body[0].kind, StmtKind::VarDecl(_)));
        assert!(matches!(body[1].kind, StmtKind::Return(Some(_))));
    }

    #[test]
    fn awaiting_step_uses_async_iife() {
        let awaited_step = awaited(Expr::ident("p", sp()), sp());
        let Lowering::Expr(expr) = lower(
            resolved(ConstructForm::Expression, vec![awaited_step, num("2")]),
            Target::Es2015,
        ) else {
            panic!("expected expression");
        };
        assert!(matches!(expr.kind, ExprKind::Unary { op: UnaryOp::Await, .. }));
    }

    #[test]
    fn es5_expression_form_calls_with_this() {
        let Lowering::Expr(expr) =
            lower(resolved(ConstructForm::Expression, vec![num("1")]), Target::Es5)
        else {
            panic!("expected expression");
        };
        let ExprKind::Call { callee, args, .. } = &expr.kind else {
            panic!("expected call");
        };
        assert!(matches!(callee.kind, ExprKind::Member { ref property, .. } if property == "call"));
        assert!(matches!(args[0], Element::Expr(Expr { kind: ExprKind::This, .. })));
    }
}
