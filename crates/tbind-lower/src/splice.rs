//! Emitter adapter: puts replacement code where the construct was.
//!
//! Replacements are wrapped in `Lowered` nodes that carry the construct id
//! and the construct's original span, so the emitter can map generated code
//! back to the user's text. No semantic change happens here.

use tbind_common::span::Span;
use tbind_hir::{ConstructId, Expr, ExprKind, Stmt, StmtKind};

use crate::config::RejectPolicy;
use crate::lower::Lowering;

/// Where a statement sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// An entry of a statement list; it may expand or disappear.
    List,
    /// The single-statement body of `if`, `else`, `while` or `for`.
    Single,
}

/// Whether a statement stays in its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keep {
    Yes,
    Remove,
}

pub(crate) fn lowered_stmt(stmt: &mut Stmt, construct: ConstructId, lowering: Lowering, slot: Slot) {
    let span = stmt.span;
    let kind = match lowering {
        Lowering::Stmts(stmts) => StmtKind::Lowered { construct, stmts },
        Lowering::Expr(expr) => StmtKind::Expr(wrap_expr(construct, expr, span)),
    };
    stmt.kind = match slot {
        Slot::List => kind,
        // Both statements must stay under the same control flow.
        Slot::Single => StmtKind::Block(vec![Stmt::new(kind, span)]),
    };
}

pub(crate) fn lowered_expr(expr: &mut Expr, construct: ConstructId, replacement: Expr) {
    let span = expr.span;
    *expr = wrap_expr(construct, replacement, span);
}

fn wrap_expr(construct: ConstructId, expr: Expr, span: Span) -> Expr {
    Expr::new(
        ExprKind::Lowered {
            construct,
            expr: Box::new(expr),
        },
        span,
    )
}

pub(crate) fn rejected_stmt(
    stmt: &mut Stmt,
    construct: ConstructId,
    source: String,
    policy: RejectPolicy,
    slot: Slot,
) -> Keep {
    match (policy, slot) {
        (RejectPolicy::Keep, _) => {
            stmt.kind = StmtKind::Rejected { construct, source };
            Keep::Yes
        }
        (RejectPolicy::Drop, Slot::List) => Keep::Remove,
        (RejectPolicy::Drop, Slot::Single) => {
            stmt.kind = StmtKind::Empty;
            Keep::Yes
        }
    }
}

pub(crate) fn rejected_expr(
    expr: &mut Expr,
    construct: ConstructId,
    source: String,
    policy: RejectPolicy,
) {
    expr.kind = match policy {
        RejectPolicy::Keep => ExprKind::Rejected { construct, source },
        RejectPolicy::Drop => Expr::void_zero(expr.span).kind,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbind_hir::{DeclKind, Ident};

    fn construct_stmt() -> Stmt {
        Stmt::new(StmtKind::Empty, Span::new(4, 20))
    }

    fn decl() -> Stmt {
        Stmt::var(
            DeclKind::Let,
            Ident::new("__tb1", Span::new(4, 20)),
            Expr::number("1", Span::new(4, 20)),
            Span::new(4, 20),
        )
    }

    #[test]
    fn list_slot_splices_inline() {
        let mut stmt = construct_stmt();
        lowered_stmt(&mut stmt, ConstructId(0), Lowering::Stmts(vec![decl(), decl()]), Slot::List);
        let StmtKind::Lowered { construct, stmts } = &stmt.kind else {
            panic!("expected lowered");
        };
        assert_eq!(*construct, ConstructId(0));
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmt.span, Span::new(4, 20));
    }

    #[test]
    fn single_slot_gets_a_block() {
        let mut stmt = construct_stmt();
        lowered_stmt(&mut stmt, ConstructId(3), Lowering::Stmts(vec![decl(), decl()]), Slot::Single);
        let StmtKind::Block(inner) = &stmt.kind else {
            panic!("expected block");
        };
        assert!(matches!(inner[0].kind, StmtKind::Lowered { construct: ConstructId(3), .. }));
    }

    #[test]
    fn expression_keeps_original_span() {
        let mut expr = Expr::new(ExprKind::Missing, Span::new(7, 30));
        lowered_expr(&mut expr, ConstructId(1), Expr::number("1", Span::new(0, 1)));
        assert_eq!(expr.span, Span::new(7, 30));
        assert!(matches!(expr.kind, ExprKind::Lowered { construct: ConstructId(1), .. }));
    }

    #[test]
    fn reject_policies() {
        let mut stmt = construct_stmt();
        let keep = rejected_stmt(&mut stmt, ConstructId(0), "x".into(), RejectPolicy::Drop, Slot::List);
        assert_eq!(keep, Keep::Remove);

        let keep = rejected_stmt(&mut stmt, ConstructId(0), "x".into(), RejectPolicy::Drop, Slot::Single);
        assert_eq!((keep, &stmt.kind), (Keep::Yes, &StmtKind::Empty));

        let keep = rejected_stmt(&mut stmt, ConstructId(0), "x".into(), RejectPolicy::Keep, Slot::List);
        assert_eq!(keep, Keep::Yes);
        assert!(matches!(stmt.kind, StmtKind::Rejected { .. }));

        let mut expr = Expr::new(ExprKind::Missing, Span::new(1, 2));
        rejected_expr(&mut expr, ConstructId(0), "x".into(), RejectPolicy::Drop);
        assert_eq!(expr, Expr::void_zero(Span::new(1, 2)));
    }
}
