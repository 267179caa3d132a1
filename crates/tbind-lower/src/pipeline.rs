//! Pipeline parser: splits a step list into its step expressions.
//!
//! Only boundaries are found here; step expressions are handed on as CST
//! nodes and built later. Commas count as separators at nesting depth 0.
//! In a well-formed tree every bracket sits inside a child node, so the
//! depth only moves on recovered input with stray delimiter tokens.

use rowan::NodeOrToken;
use tbind_common::span::Span;
use tbind_parser::ast::{node_span, token_span, AstNode, Expr, StepList};
use tbind_parser::SyntaxKind;

use crate::diagnostics::{Diagnostic, DiagnosticCode};

pub(crate) fn split_steps(
    step_list: Option<&StepList>,
    eq_span: Span,
) -> Result<Vec<Expr>, Diagnostic> {
    let no_steps = || {
        Diagnostic::new(DiagnosticCode::EmptyPipeline, "temporary binding has no steps", eq_span)
            .with_label("expected at least one step after `=`")
    };
    let Some(step_list) = step_list else {
        return Err(no_steps());
    };

    let mut steps = Vec::new();
    let mut slot: Option<Expr> = None;
    let mut slot_start = eq_span.end;
    let mut depth = 0u32;
    let mut seen_anything = false;

    for element in step_list.syntax().children_with_tokens() {
        match element {
            NodeOrToken::Node(node) => {
                seen_anything = true;
                if slot.is_none() {
                    slot = Expr::cast(node);
                }
            }
            NodeOrToken::Token(token) => {
                let kind = token.kind();
                if kind.is_trivia() {
                    continue;
                }
                seen_anything = true;
                match kind {
                    SyntaxKind::L_PAREN
                    | SyntaxKind::L_BRACKET
                    | SyntaxKind::L_BRACE
                    | SyntaxKind::TEMPLATE_START
                    | SyntaxKind::INTERPOLATION_START => depth += 1,
                    SyntaxKind::R_PAREN
                    | SyntaxKind::R_BRACKET
                    | SyntaxKind::R_BRACE
                    | SyntaxKind::TEMPLATE_END
                    | SyntaxKind::INTERPOLATION_END => depth = depth.saturating_sub(1),
                    SyntaxKind::COMMA if depth == 0 => {
                        let comma = token_span(&token);
                        match slot.take() {
                            Some(step) => steps.push(step),
                            None => return Err(empty_slot(steps.len(), slot_start, comma)),
                        }
                        slot_start = comma.end;
                    }
                    _ => {}
                }
            }
        }
    }

    if !seen_anything {
        return Err(no_steps());
    }
    match slot {
        Some(step) => steps.push(step),
        None => {
            let end = node_span(step_list.syntax()).end;
            return Err(Diagnostic::new(
                DiagnosticCode::EmptyPipeline,
                "trailing comma in step list",
                Span::new(slot_start.saturating_sub(1), end.max(slot_start)),
            )
            .with_label("expected a step after this comma"));
        }
    }
    Ok(steps)
}

fn empty_slot(index: usize, start: u32, comma: Span) -> Diagnostic {
    Diagnostic::new(
        DiagnosticCode::EmptyPipeline,
        format!("step {} is empty", index + 1),
        Span::new(start.min(comma.start), comma.end),
    )
    .with_label("expected an expression before this comma")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbind_parser::ast::{TempBinding, TempBindingDecl, TempBindingExpr};

    fn split(source: &str) -> Result<Vec<String>, (String, Span)> {
        let parse = tbind_parser::parse(source);
        let root = parse.syntax();
        let (eq, list) = match root.descendants().find_map(TempBindingDecl::cast) {
            Some(decl) => (decl.eq_token(), decl.step_list()),
            None => {
                let expr = root
                    .descendants()
                    .find_map(TempBindingExpr::cast)
                    .expect("construct");
                (expr.eq_token(), expr.step_list())
            }
        };
        let eq_span = token_span(&eq.expect("eq"));
        split_steps(list.as_ref(), eq_span)
            .map(|steps| {
                steps
                    .iter()
                    .map(|s| s.syntax().text().to_string().trim().to_string())
                    .collect()
            })
            .map_err(|d| (d.message, d.span))
    }

    #[test]
    fn top_level_commas_only() {
        let steps = split("const($) x = f(1, 2), [$, 3], { a: $, b }, `${$},${1}`;").unwrap();
        assert_eq!(steps, vec!["f(1, 2)", "[$, 3]", "{ a: $, b }", "`${$},${1}`"]);
    }

    #[test]
    fn closures_keep_their_commas() {
        let steps = split("let(a) = xs, a.map((x, i) => x + i), a.length").unwrap();
        assert_eq!(steps, vec!["xs", "a.map((x, i) => x + i)", "a.length"]);
    }

    #[test]
    fn single_step() {
        assert_eq!(split("const($) x = 10;").unwrap(), vec!["10"]);
    }

    #[test]
    fn bare_eq_has_no_steps() {
        let (message, span) = split("const($) x = ;").unwrap_err();
        assert_eq!(message, "temporary binding has no steps");
        assert_eq!(span, Span::new(11, 12));
    }

    #[test]
    fn empty_slot_in_the_middle() {
        let (message, span) = split("let(a) = 1, , a;").unwrap_err();
        assert_eq!(message, "step 2 is empty");
        assert_eq!(span, Span::new(11, 13));
    }

    #[test]
    fn leading_empty_slot() {
        let (message, _) = split("let(a) = , a;").unwrap_err();
        assert_eq!(message, "step 1 is empty");
    }

    #[test]
    fn trailing_comma() {
        let (message, _) = split("const($) x = 1, $,;").unwrap_err();
        assert_eq!(message, "trailing comma in step list");
    }

    #[test]
    fn steps_keep_source_order() {
        let steps = split("g((let(t) = 3, t * 2, t - 1));").unwrap();
        assert_eq!(steps, vec!["3", "t * 2", "t - 1"]);
    }
}
