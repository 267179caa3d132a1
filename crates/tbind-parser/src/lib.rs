//! Recursive descent parser producing a rowan-based CST.
//!
//! The CST is lossless: every token, comments included, appears in the tree.
//! The temporary-binding productions are parsed leniently (see
//! [`SyntaxKind::BINDING_MARKER`]) so that shape errors become per-construct
//! diagnostics in the lowering engine instead of fatal syntax errors.

pub mod ast;
pub mod cst;
pub mod error;
mod parser;
pub mod syntax_kind;

use std::fmt::Write;

pub use cst::{SyntaxElement, SyntaxNode, SyntaxToken};
pub use error::ParseError;
pub use syntax_kind::SyntaxKind;

use tbind_lexer::Lexer;

/// Result of parsing a source file: the green tree plus every error found.
pub struct Parse {
    green: rowan::GreenNode,
    errors: Vec<ParseError>,
}

impl Parse {
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// Typed root of the tree.
    pub fn tree(&self) -> ast::SourceFile {
        ast::SourceFile {
            syntax: self.syntax(),
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Lex and parse a source file. Lexer errors come first in `errors`.
pub fn parse(source: &str) -> Parse {
    let (tokens, lex_errors) = Lexer::tokenize_with_errors(source);
    let mut p = parser::Parser::new(tokens, source);
    parser::parse_source_file(&mut p);
    let (green, parse_errors) = p.build_tree();

    let mut errors: Vec<ParseError> = lex_errors.into_iter().map(ParseError::from).collect();
    errors.extend(parse_errors);
    Parse { green, errors }
}

/// Render a tree in the indented `KIND@start..end` format used by the
/// snapshot tests and `tbindc cst`. Tokens also print their text.
pub fn debug_tree(node: &SyntaxNode) -> String {
    let mut out = String::new();
    write_node(&mut out, node, 0);
    out
}

fn write_node(out: &mut String, node: &SyntaxNode, depth: usize) {
    let range = node.text_range();
    let _ = writeln!(
        out,
        "{:indent$}{:?}@{}..{}",
        "",
        node.kind(),
        u32::from(range.start()),
        u32::from(range.end()),
        indent = depth * 2
    );
    for child in node.children_with_tokens() {
        match child {
            rowan::NodeOrToken::Node(n) => write_node(out, &n, depth + 1),
            rowan::NodeOrToken::Token(t) => {
                let range = t.text_range();
                let _ = writeln!(
                    out,
                    "{:indent$}{:?}@{}..{} {:?}",
                    "",
                    t.kind(),
                    u32::from(range.start()),
                    u32::from(range.end()),
                    t.text(),
                    indent = (depth + 1) * 2
                );
            }
        }
    }
}
