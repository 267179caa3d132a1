//! Construct recognizer: validates the shape of a matched construct node.
//!
//! The parser accepts any tokens between the marker parentheses and an
//! optional `=`, so shape errors land here and reject only the construct.

use tbind_common::span::Span;
use tbind_hir::{DeclKind, Ident};
use tbind_parser::ast::{token_span, AstNode, StepList, TempBinding};
use tbind_parser::{SyntaxKind, SyntaxToken};

use crate::diagnostics::{Diagnostic, DiagnosticCode};

/// A construct whose marker and `=` are in place.
#[derive(Debug)]
pub(crate) struct Recognized {
    pub qualifier: DeclKind,
    pub binding: Ident,
    pub result_name: Option<Ident>,
    pub eq_span: Span,
    pub step_list: Option<StepList>,
}

pub(crate) fn recognize<T: TempBinding>(
    node: &T,
    result_name: Option<SyntaxToken>,
) -> Result<Recognized, Diagnostic> {
    let span = node.span();
    let qualifier = node
        .keyword()
        .and_then(|kw| DeclKind::from_keyword(kw.text()))
        .unwrap_or(DeclKind::Let);

    let binding = binding_identifier(node, span)?;

    let Some(eq) = node.eq_token() else {
        return Err(Diagnostic::new(
            DiagnosticCode::IncompleteConstruct,
            format!("temporary binding `{}` has no step list", binding.name),
            span,
        )
        .with_label("expected `=` followed by at least one step")
        .with_related("binding introduced here", binding.span));
    };

    Ok(Recognized {
        qualifier,
        binding,
        result_name: result_name.map(|t| Ident::new(t.text(), token_span(&t))),
        eq_span: token_span(&eq),
        step_list: node.step_list(),
    })
}

/// The single identifier inside `( ... )`.
fn binding_identifier<T: TempBinding>(node: &T, construct: Span) -> Result<Ident, Diagnostic> {
    let malformed = |message: String, span: Span| {
        Diagnostic::new(DiagnosticCode::MalformedBindingMarker, message, span)
    };

    let Some(marker) = node.marker() else {
        return Err(malformed("expected a binding marker".to_string(), construct));
    };
    let marker_span = marker.span();

    if !marker.is_closed() {
        let open = marker.l_paren().map(|t| token_span(&t)).unwrap_or(marker_span);
        return Err(malformed("binding marker is not closed".to_string(), marker_span)
            .with_label("expected `)` after the binding identifier")
            .with_related("marker opened here", open));
    }

    let inner = marker.inner_tokens();
    match inner.as_slice() {
        [] => Err(malformed("binding marker is empty".to_string(), marker_span)
            .with_label("expected an identifier between the parentheses")),
        [token] if token.kind() == SyntaxKind::IDENT => {
            Ok(Ident::new(token.text(), token_span(token)))
        }
        [token] => Err(malformed(
            format!("binding marker must contain an identifier, found `{}`", token.text()),
            token_span(token),
        )),
        [first, .., last] => {
            let span = token_span(first).merge(token_span(last));
            Err(malformed(
                "binding marker must contain a single identifier".to_string(),
                span,
            )
            .with_label(format!("found {} tokens", inner.len())))
        }
    }
}
