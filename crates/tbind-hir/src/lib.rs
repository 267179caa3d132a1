//! Owned host syntax tree.
//!
//! The CST from `tbind-parser` is lossless and immutable; the lowering engine
//! needs a tree it can rewrite in place. This crate defines that tree. Every
//! statement and expression carries the [`Span`] of the source text it came
//! from. Nodes the engine synthesizes reuse the span of the construct they
//! replace, so later diagnostics still point at user code.
//!
//! Temporary bindings appear as [`TempBinding`] nodes until the engine
//! replaces them with `Lowered` (success) or `Rejected` (fatal diagnostic)
//! nodes. The emitter never sees a `TempBinding`.

pub mod expr;
pub mod ops;
pub mod stmt;
pub mod visit;

use std::fmt;

use serde::Serialize;
use tbind_common::span::Span;

pub use expr::*;
pub use ops::*;
pub use stmt::*;

/// One compilation unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// An identifier occurrence: a reference or a binder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// `var`, `let` or `const`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

impl DeclKind {
    pub fn from_keyword(text: &str) -> Option<Self> {
        match text {
            "var" => Some(DeclKind::Var),
            "let" => Some(DeclKind::Let),
            "const" => Some(DeclKind::Const),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Var => "var",
            DeclKind::Let => "let",
            DeclKind::Const => "const",
        }
    }

    pub fn is_mutable(self) -> bool {
        !matches!(self, DeclKind::Const)
    }
}

/// Discovery index of a temporary-binding construct within its unit.
/// Constructs are numbered in source pre-order starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConstructId(pub u32);

impl fmt::Display for ConstructId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Surface form of a construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstructForm {
    /// `const($) NAME = steps;`
    Declaration,
    /// `let($) = steps` in expression position.
    Expression,
}

/// A recognized temporary binding whose steps are split and built, waiting
/// for hygiene resolution and lowering.
#[derive(Debug, Clone, PartialEq)]
pub struct TempBinding {
    pub id: ConstructId,
    pub form: ConstructForm,
    /// Keyword in front of the marker. For the declaration form this is the
    /// qualifier of the emitted result declaration.
    pub qualifier: DeclKind,
    /// The surface binding identifier, spanning the identifier in the marker.
    pub binding: Ident,
    /// Declaration form only.
    pub result_name: Option<Ident>,
    /// At least one step.
    pub steps: Vec<Expr>,
    /// Original construct text, emitted when a rejected construct is kept.
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decl_kind_keywords() {
        for kind in [DeclKind::Var, DeclKind::Let, DeclKind::Const] {
            assert_eq!(DeclKind::from_keyword(kind.as_str()), Some(kind));
        }
        assert!(DeclKind::Let.is_mutable());
        assert!(!DeclKind::Const.is_mutable());
        assert_eq!(DeclKind::from_keyword("function"), None);
    }

    #[test]
    fn void_zero_shape() {
        let span = Span::new(3, 9);
        let expr = Expr::void_zero(span);
        let ExprKind::Unary { op, arg } = &expr.kind else {
            panic!("expected unary");
        };
        assert_eq!(*op, UnaryOp::Void);
        assert_eq!(arg.kind, ExprKind::Number("0".to_string()));
        assert_eq!(expr.span, span);
    }
}
