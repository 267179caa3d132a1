//! Typed AST layer on top of the rowan CST.
//!
//! Each wrapper is a newtype around `SyntaxNode` with accessors that walk
//! the tree directly, following the rust-analyzer pattern. Accessors return
//! `Option` because the tree may come from recovered, incomplete input.

pub mod expr;
pub mod stmt;

use tbind_common::span::Span;

use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

pub use expr::*;
pub use stmt::*;

/// A typed wrapper around a `SyntaxNode` of a particular kind.
pub trait AstNode: Sized {
    fn cast(node: SyntaxNode) -> Option<Self>;

    fn syntax(&self) -> &SyntaxNode;

    /// Source span of the node without leading or trailing comments.
    fn span(&self) -> Span {
        node_span(self.syntax())
    }
}

macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone)]
        pub struct $name {
            pub(crate) syntax: SyntaxNode,
        }

        impl AstNode for $name {
            fn cast(node: SyntaxNode) -> Option<Self> {
                if node.kind() == SyntaxKind::$kind {
                    Some(Self { syntax: node })
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.syntax
            }
        }
    };
}

pub(crate) use ast_node;

pub fn child_node<N: AstNode>(parent: &SyntaxNode) -> Option<N> {
    parent.children().find_map(N::cast)
}

pub fn child_nodes<'a, N: AstNode + 'a>(parent: &'a SyntaxNode) -> impl Iterator<Item = N> + 'a {
    parent.children().filter_map(N::cast)
}

pub fn child_token(parent: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    direct_tokens(parent).find(|t| t.kind() == kind)
}

/// Direct token children, comments excluded.
pub fn direct_tokens(parent: &SyntaxNode) -> impl Iterator<Item = SyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(|it| it.into_token())
        .filter(|t| !t.kind().is_trivia())
}

pub fn token_span(token: &SyntaxToken) -> Span {
    let range = token.text_range();
    Span::new(range.start().into(), range.end().into())
}

/// Span from the first to the last non-comment token under `node`. Falls
/// back to the node's own range when it holds only trivia.
pub fn node_span(node: &SyntaxNode) -> Span {
    let mut tokens = node
        .descendants_with_tokens()
        .filter_map(|it| it.into_token())
        .filter(|t| !t.kind().is_trivia() && t.kind() != SyntaxKind::EOF);
    match tokens.next() {
        Some(first) => {
            let last = tokens.last().unwrap_or_else(|| first.clone());
            token_span(&first).merge(token_span(&last))
        }
        None => {
            let range = node.text_range();
            Span::new(range.start().into(), range.end().into())
        }
    }
}

ast_node!(SourceFile, SOURCE_FILE);

impl SourceFile {
    pub fn stmts(&self) -> impl Iterator<Item = Stmt> {
        self.syntax.children().filter_map(Stmt::cast)
    }
}
