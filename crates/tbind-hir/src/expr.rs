//! Expression nodes.

use tbind_common::span::Span;

use crate::ops::{AssignOp, BinaryOp, UnaryOp, UpdateOp};
use crate::stmt::Stmt;
use crate::{ConstructId, Ident, TempBinding};

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Number literal, source text kept (`0x1f`, `1_000`, `.5`).
    Number(String),
    /// String literal including its quotes and escapes.
    Str(String),
    Bool(bool),
    Null,
    Template(Vec<TemplatePart>),
    Ident(Ident),
    This,
    Array(Vec<Element>),
    Object(Vec<Prop>),
    Member {
        object: Box<Expr>,
        property: String,
        optional: bool,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Element>,
        optional: bool,
    },
    /// `new C` (no argument list) or `new C(...)`.
    New {
        callee: Box<Expr>,
        args: Option<Vec<Element>>,
    },
    /// Arrow function or function expression.
    Function(Box<Function>),
    Unary {
        op: UnaryOp,
        arg: Box<Expr>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        arg: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Sequence(Vec<Expr>),
    /// Expression-form temporary binding, not yet lowered.
    TempBinding(Box<TempBinding>),
    /// The replacement for a lowered construct. Printed as `expr`; the span
    /// of the enclosing node is the construct's original span.
    Lowered {
        construct: ConstructId,
        expr: Box<Expr>,
    },
    /// A construct that failed to lower. Printed as its original text.
    Rejected {
        construct: ConstructId,
        source: String,
    },
    /// Placeholder for an expression missing from recovered input.
    Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    /// Raw text between delimiters, escapes untouched.
    Text(String),
    Expr(Expr),
}

/// An array element or call argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Expr(Expr),
    Spread(Expr),
}

impl Element {
    pub fn expr(&self) -> &Expr {
        match self {
            Element::Expr(e) | Element::Spread(e) => e,
        }
    }

    pub fn expr_mut(&mut self) -> &mut Expr {
        match self {
            Element::Expr(e) | Element::Spread(e) => e,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Prop {
    KeyValue { key: PropKey, value: Expr },
    /// `{ name }`; the identifier is both key and value reference.
    Shorthand(Ident),
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropKey {
    Ident(String),
    /// String key with quotes.
    Str(String),
    Number(String),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Option<Ident>,
    pub params: Vec<Param>,
    pub body: FnBody,
    pub is_async: bool,
    pub is_arrow: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub rest: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FnBody {
    Block(Vec<Stmt>),
    /// Concise arrow body.
    Expr(Box<Expr>),
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn ident(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Ident(Ident::new(name, span)), span)
    }

    pub fn number(text: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Number(text.into()), span)
    }

    /// `target = value`.
    pub fn assign(target: Expr, value: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Assign {
                op: AssignOp::Assign,
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        )
    }

    pub fn call(callee: Expr, args: Vec<Element>, span: Span) -> Self {
        Self::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
                optional: false,
            },
            span,
        )
    }

    /// `void 0`, the value a dropped expression site evaluates to.
    pub fn void_zero(span: Span) -> Self {
        Self::new(
            ExprKind::Unary {
                op: UnaryOp::Void,
                arg: Box::new(Expr::number("0", span)),
            },
            span,
        )
    }

    /// The identifier name when this is a plain reference.
    pub fn as_ident(&self) -> Option<&Ident> {
        match &self.kind {
            ExprKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }
}
