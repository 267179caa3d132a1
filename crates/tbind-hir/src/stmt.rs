//! Statement nodes.

use tbind_common::span::Span;

use crate::expr::{Expr, Function};
use crate::{ConstructId, DeclKind, Ident, TempBinding};

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    VarDecl(VarDecl),
    /// Named function declaration.
    FnDecl(Function),
    Block(Vec<Stmt>),
    Return(Option<Expr>),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<ForInit>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForOf {
        kind: DeclKind,
        name: Ident,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Break,
    Continue,
    Throw(Expr),
    Expr(Expr),
    Empty,
    /// Declaration-form temporary binding, not yet lowered.
    TempBinding(Box<TempBinding>),
    /// Statements replacing a lowered declaration-form construct. They are
    /// printed inline in the enclosing statement list.
    Lowered {
        construct: ConstructId,
        stmts: Vec<Stmt>,
    },
    /// A construct that failed to lower. Printed as its original text.
    Rejected {
        construct: ConstructId,
        source: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: DeclKind,
    pub declarators: Vec<Declarator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: Ident,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    VarDecl(VarDecl),
    Expr(Expr),
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// `<kind> name = init;`
    pub fn var(kind: DeclKind, name: Ident, init: Expr, span: Span) -> Self {
        Self::new(
            StmtKind::VarDecl(VarDecl {
                kind,
                declarators: vec![Declarator {
                    name,
                    init: Some(init),
                }],
            }),
            span,
        )
    }

    pub fn ret(expr: Expr, span: Span) -> Self {
        Self::new(StmtKind::Return(Some(expr)), span)
    }
}
