//! Expression parsing: a Pratt loop for binary operators on top of
//! hand-written prefix, postfix, call-chain and primary parsers.
//!
//! Temporary bindings in expression position (`let(a) = s1, s2`) are parsed
//! as primaries. Their step list is greedy and swallows following commas, so
//! they extend to the next `;` or closing delimiter.

use crate::parser::{statements, MarkClosed, Parser};
use crate::syntax_kind::SyntaxKind;

/// Tokens that end an expression without being part of it. The parser does
/// not consume them when reporting a missing expression.
const EXPR_TERMINATORS: &[SyntaxKind] = &[
    SyntaxKind::SEMICOLON,
    SyntaxKind::COMMA,
    SyntaxKind::COLON,
    SyntaxKind::R_PAREN,
    SyntaxKind::R_BRACKET,
    SyntaxKind::R_BRACE,
    SyntaxKind::INTERPOLATION_END,
    SyntaxKind::EOF,
];

/// Binding powers for infix operators. Higher binds tighter; a right power
/// lower than the left one makes the operator right-associative.
fn infix_binding_power(kind: SyntaxKind) -> Option<(u8, u8)> {
    let bp = match kind {
        SyntaxKind::QUESTION_QUESTION => (1, 2),
        SyntaxKind::PIPE_PIPE => (3, 4),
        SyntaxKind::AMP_AMP => (5, 6),
        SyntaxKind::EQ_EQ | SyntaxKind::NOT_EQ | SyntaxKind::EQ_EQ_EQ | SyntaxKind::NOT_EQ_EQ => {
            (7, 8)
        }
        SyntaxKind::LT
        | SyntaxKind::GT
        | SyntaxKind::LT_EQ
        | SyntaxKind::GT_EQ
        | SyntaxKind::INSTANCEOF_KW
        | SyntaxKind::IN_KW => (9, 10),
        SyntaxKind::PLUS | SyntaxKind::MINUS => (11, 12),
        SyntaxKind::STAR | SyntaxKind::SLASH | SyntaxKind::PERCENT => (13, 14),
        SyntaxKind::STAR_STAR => (16, 15),
        _ => return None,
    };
    Some(bp)
}

fn is_assign_op(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::EQ
            | SyntaxKind::PLUS_EQ
            | SyntaxKind::MINUS_EQ
            | SyntaxKind::STAR_EQ
            | SyntaxKind::SLASH_EQ
            | SyntaxKind::PERCENT_EQ
    )
}

fn is_prefix_op(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::BANG
            | SyntaxKind::MINUS
            | SyntaxKind::PLUS
            | SyntaxKind::TYPEOF_KW
            | SyntaxKind::VOID_KW
            | SyntaxKind::DELETE_KW
            | SyntaxKind::AWAIT_KW
            | SyntaxKind::PLUS_PLUS
            | SyntaxKind::MINUS_MINUS
    )
}

fn is_assignable(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::NAME_REF | SyntaxKind::FIELD_EXPR | SyntaxKind::INDEX_EXPR
    )
}

/// Full expression, including the comma operator.
pub(crate) fn expr(p: &mut Parser) -> Option<MarkClosed> {
    let first = assign_expr(p)?;
    if !p.at(SyntaxKind::COMMA) {
        return Some(first);
    }
    let m = p.open_before(first);
    while p.eat(SyntaxKind::COMMA) {
        assign_expr(p);
    }
    Some(p.close(m, SyntaxKind::SEQUENCE_EXPR))
}

/// Assignment-level expression: arrows, assignments, conditionals.
pub(crate) fn assign_expr(p: &mut Parser) -> Option<MarkClosed> {
    if at_arrow_fn(p) {
        return Some(arrow_fn(p));
    }

    let lhs = conditional_expr(p)?;
    if !is_assign_op(p.current()) {
        return Some(lhs);
    }
    if !is_assignable(p.kind_of(lhs)) {
        p.error("invalid assignment target");
    }
    let m = p.open_before(lhs);
    p.advance();
    if assign_expr(p).is_none() {
        p.error("expected expression after assignment operator");
    }
    Some(p.close(m, SyntaxKind::ASSIGN_EXPR))
}

fn conditional_expr(p: &mut Parser) -> Option<MarkClosed> {
    let cond = binary_expr(p, 0)?;
    if !p.at(SyntaxKind::QUESTION) {
        return Some(cond);
    }
    let m = p.open_before(cond);
    p.advance();
    assign_expr(p);
    p.expect(SyntaxKind::COLON);
    assign_expr(p);
    Some(p.close(m, SyntaxKind::CONDITIONAL_EXPR))
}

fn binary_expr(p: &mut Parser, min_bp: u8) -> Option<MarkClosed> {
    let mut lhs = unary_expr(p)?;
    loop {
        let Some((l_bp, r_bp)) = infix_binding_power(p.current()) else {
            break;
        };
        if l_bp < min_bp {
            break;
        }
        let m = p.open_before(lhs);
        p.advance();
        if binary_expr(p, r_bp).is_none() {
            p.error("expected expression after operator");
        }
        lhs = p.close(m, SyntaxKind::BINARY_EXPR);
    }
    Some(lhs)
}

fn unary_expr(p: &mut Parser) -> Option<MarkClosed> {
    let op = p.current();
    if !is_prefix_op(op) {
        return postfix_expr(p);
    }
    let m = p.open();
    p.advance();
    match unary_expr(p) {
        Some(operand) => {
            if matches!(op, SyntaxKind::PLUS_PLUS | SyntaxKind::MINUS_MINUS)
                && !is_assignable(p.kind_of(operand))
            {
                p.error("invalid update target");
            }
        }
        None => p.error("expected operand"),
    }
    Some(p.close(m, SyntaxKind::PREFIX_EXPR))
}

fn postfix_expr(p: &mut Parser) -> Option<MarkClosed> {
    let operand = call_chain(p)?;
    if !p.at_any(&[SyntaxKind::PLUS_PLUS, SyntaxKind::MINUS_MINUS]) {
        return Some(operand);
    }
    if !is_assignable(p.kind_of(operand)) {
        p.error("invalid update target");
    }
    let m = p.open_before(operand);
    p.advance();
    Some(p.close(m, SyntaxKind::POSTFIX_EXPR))
}

/// Member access, indexing, calls and optional chains.
fn call_chain(p: &mut Parser) -> Option<MarkClosed> {
    let mut lhs = if p.at(SyntaxKind::NEW_KW) {
        new_expr(p)
    } else {
        primary(p)?
    };
    loop {
        lhs = match p.current() {
            SyntaxKind::DOT => field_access(p, lhs),
            SyntaxKind::L_BRACKET => index_access(p, lhs),
            SyntaxKind::L_PAREN => {
                let m = p.open_before(lhs);
                arg_list(p);
                p.close(m, SyntaxKind::CALL_EXPR)
            }
            SyntaxKind::QUESTION_DOT => {
                let m = p.open_before(lhs);
                p.advance();
                match p.current() {
                    SyntaxKind::L_BRACKET => {
                        let open_span = p.current_span();
                        p.advance();
                        expr(p);
                        p.expect_closing(SyntaxKind::R_BRACKET, open_span);
                        p.close(m, SyntaxKind::INDEX_EXPR)
                    }
                    SyntaxKind::L_PAREN => {
                        arg_list(p);
                        p.close(m, SyntaxKind::CALL_EXPR)
                    }
                    _ => {
                        property_name(p);
                        p.close(m, SyntaxKind::FIELD_EXPR)
                    }
                }
            }
            _ => break,
        };
    }
    Some(lhs)
}

fn field_access(p: &mut Parser, lhs: MarkClosed) -> MarkClosed {
    let m = p.open_before(lhs);
    p.advance(); // .
    property_name(p);
    p.close(m, SyntaxKind::FIELD_EXPR)
}

fn index_access(p: &mut Parser, lhs: MarkClosed) -> MarkClosed {
    let m = p.open_before(lhs);
    let open_span = p.current_span();
    p.advance(); // [
    p.outside_for_header(|p| expr(p));
    p.expect_closing(SyntaxKind::R_BRACKET, open_span);
    p.close(m, SyntaxKind::INDEX_EXPR)
}

/// Identifier or keyword after `.` / `?.`.
fn property_name(p: &mut Parser) {
    if p.at(SyntaxKind::IDENT) || p.current().is_keyword() {
        p.advance();
    } else {
        p.error("expected property name");
    }
}

/// `new Callee(args)`; the argument list is optional.
fn new_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // new
    let callee = if p.at(SyntaxKind::NEW_KW) {
        Some(new_expr(p))
    } else {
        primary(p)
    };
    if let Some(mut callee) = callee {
        loop {
            callee = match p.current() {
                SyntaxKind::DOT => field_access(p, callee),
                SyntaxKind::L_BRACKET => index_access(p, callee),
                _ => break,
            };
        }
    }
    if p.at(SyntaxKind::L_PAREN) {
        arg_list(p);
    }
    p.close(m, SyntaxKind::NEW_EXPR)
}

pub(crate) fn arg_list(p: &mut Parser) {
    let m = p.open();
    let open_span = p.current_span();
    p.advance(); // (
    p.outside_for_header(|p| {
        while !p.at_any(&[SyntaxKind::R_PAREN, SyntaxKind::EOF]) {
            if p.at(SyntaxKind::DOT_DOT_DOT) {
                spread(p);
            } else if assign_expr(p).is_none() {
                break;
            }
            if !p.eat(SyntaxKind::COMMA) {
                break;
            }
        }
    });
    p.expect_closing(SyntaxKind::R_PAREN, open_span);
    p.close(m, SyntaxKind::ARG_LIST);
}

fn spread(p: &mut Parser) {
    let m = p.open();
    p.advance(); // ...
    if assign_expr(p).is_none() {
        p.error("expected expression after `...`");
    }
    p.close(m, SyntaxKind::SPREAD);
}

// ── Primaries ──────────────────────────────────────────────────────────

fn primary(p: &mut Parser) -> Option<MarkClosed> {
    let kind = p.current();
    match kind {
        SyntaxKind::NUMBER
        | SyntaxKind::STRING
        | SyntaxKind::TRUE_KW
        | SyntaxKind::FALSE_KW
        | SyntaxKind::NULL_KW => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::LITERAL))
        }
        SyntaxKind::IDENT => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::NAME_REF))
        }
        SyntaxKind::THIS_KW => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::THIS_EXPR))
        }
        SyntaxKind::TEMPLATE_START => Some(template_literal(p)),
        SyntaxKind::L_BRACKET => Some(array_literal(p)),
        SyntaxKind::L_BRACE => Some(object_literal(p)),
        SyntaxKind::L_PAREN => Some(paren_expr(p)),
        SyntaxKind::FUNCTION_KW => Some(statements::function(p, SyntaxKind::FN_EXPR)),
        SyntaxKind::ASYNC_KW if p.nth(1) == SyntaxKind::FUNCTION_KW => {
            Some(statements::function(p, SyntaxKind::FN_EXPR))
        }
        k if k.is_decl_keyword() && p.nth(1) == SyntaxKind::L_PAREN => {
            if p.in_for_header() {
                p.error("temporary binding is not allowed in a `for` header");
            }
            Some(temp_binding_expr(p))
        }
        _ => {
            if p.at_any(EXPR_TERMINATORS) {
                p.error("expected expression");
            } else {
                p.advance_with_error("expected expression");
            }
            None
        }
    }
}

fn paren_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    let open_span = p.current_span();
    p.advance(); // (
    expr(p);
    p.expect_closing(SyntaxKind::R_PAREN, open_span);
    p.close(m, SyntaxKind::PAREN_EXPR)
}

fn array_literal(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    let open_span = p.current_span();
    p.advance(); // [
    p.outside_for_header(|p| {
        while !p.at_any(&[SyntaxKind::R_BRACKET, SyntaxKind::EOF]) {
            if p.at(SyntaxKind::DOT_DOT_DOT) {
                spread(p);
            } else if assign_expr(p).is_none() {
                break;
            }
            if !p.eat(SyntaxKind::COMMA) {
                break;
            }
        }
    });
    p.expect_closing(SyntaxKind::R_BRACKET, open_span);
    p.close(m, SyntaxKind::ARRAY_EXPR)
}

fn object_literal(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    let open_span = p.current_span();
    p.advance(); // {
    p.outside_for_header(|p| {
        while !p.at_any(&[SyntaxKind::R_BRACE, SyntaxKind::EOF]) {
            if !object_member(p) {
                break;
            }
            if !p.eat(SyntaxKind::COMMA) {
                break;
            }
        }
    });
    p.expect_closing(SyntaxKind::R_BRACE, open_span);
    p.close(m, SyntaxKind::OBJECT_EXPR)
}

/// One object member. Returns false when nothing could be parsed.
fn object_member(p: &mut Parser) -> bool {
    match p.current() {
        SyntaxKind::DOT_DOT_DOT => spread(p),
        SyntaxKind::L_BRACKET => {
            let m = p.open();
            let key = p.open();
            let open_span = p.current_span();
            p.advance(); // [
            assign_expr(p);
            p.expect_closing(SyntaxKind::R_BRACKET, open_span);
            p.close(key, SyntaxKind::COMPUTED_KEY);
            p.expect(SyntaxKind::COLON);
            assign_expr(p);
            p.close(m, SyntaxKind::PROPERTY);
        }
        SyntaxKind::IDENT if p.nth(1) != SyntaxKind::COLON => {
            let m = p.open();
            p.advance();
            p.close(m, SyntaxKind::SHORTHAND_PROPERTY);
        }
        k if k == SyntaxKind::IDENT
            || k == SyntaxKind::STRING
            || k == SyntaxKind::NUMBER
            || k.is_keyword() =>
        {
            let m = p.open();
            p.advance();
            p.expect(SyntaxKind::COLON);
            assign_expr(p);
            p.close(m, SyntaxKind::PROPERTY);
        }
        _ => {
            p.error("expected property");
            return false;
        }
    }
    true
}

fn template_literal(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // `
    loop {
        match p.current() {
            SyntaxKind::TEMPLATE_CONTENT => p.advance(),
            SyntaxKind::INTERPOLATION_START => {
                let interp = p.open();
                let open_span = p.current_span();
                p.advance();
                p.outside_for_header(|p| expr(p));
                p.expect_closing(SyntaxKind::INTERPOLATION_END, open_span);
                p.close(interp, SyntaxKind::INTERPOLATION);
            }
            SyntaxKind::TEMPLATE_END => {
                p.advance();
                break;
            }
            _ => {
                p.error("expected closing backtick");
                break;
            }
        }
    }
    p.close(m, SyntaxKind::TEMPLATE_LITERAL)
}

// ── Functions ──────────────────────────────────────────────────────────

/// Whether the upcoming tokens start an arrow function.
fn at_arrow_fn(p: &Parser) -> bool {
    match p.current() {
        SyntaxKind::IDENT => p.nth(1) == SyntaxKind::FAT_ARROW,
        SyntaxKind::L_PAREN => p.nth(p.skip_balanced(0)) == SyntaxKind::FAT_ARROW,
        SyntaxKind::ASYNC_KW => match p.nth(1) {
            SyntaxKind::IDENT => p.nth(2) == SyntaxKind::FAT_ARROW,
            SyntaxKind::L_PAREN => p.nth(p.skip_balanced(1)) == SyntaxKind::FAT_ARROW,
            _ => false,
        },
        _ => false,
    }
}

fn arrow_fn(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.eat(SyntaxKind::ASYNC_KW);
    if p.at(SyntaxKind::IDENT) {
        let params = p.open();
        let param = p.open();
        p.advance();
        p.close(param, SyntaxKind::PARAM);
        p.close(params, SyntaxKind::PARAM_LIST);
    } else {
        statements::param_list(p);
    }
    p.expect(SyntaxKind::FAT_ARROW);
    p.outside_for_header(|p| {
        if p.at(SyntaxKind::L_BRACE) {
            statements::block(p);
        } else if assign_expr(p).is_none() {
            p.error("expected arrow function body");
        }
    });
    p.close(m, SyntaxKind::ARROW_FN)
}

// ── Temporary bindings ─────────────────────────────────────────────────

/// Significant offset just past a binding marker whose `(` is at offset
/// `open`. The marker ends at its matching `)`; an `=`, `;`, unmatched
/// closer or end of input ends it early (unclosed).
pub(crate) fn marker_end(p: &Parser, open: usize) -> usize {
    let mut depth = 0u32;
    let mut offset = open + 1;
    loop {
        match p.nth(offset) {
            SyntaxKind::EOF => return offset,
            SyntaxKind::R_PAREN if depth == 0 => return offset + 1,
            SyntaxKind::EQ | SyntaxKind::SEMICOLON if depth == 0 => return offset,
            SyntaxKind::R_BRACKET | SyntaxKind::R_BRACE | SyntaxKind::INTERPOLATION_END
                if depth == 0 =>
            {
                return offset
            }
            SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET | SyntaxKind::L_BRACE => depth += 1,
            SyntaxKind::R_PAREN | SyntaxKind::R_BRACKET | SyntaxKind::R_BRACE => depth -= 1,
            _ => {}
        }
        offset += 1;
    }
}

/// `( tokens... )` after the declaration keyword. Shape is not checked here.
pub(crate) fn binding_marker(p: &mut Parser) {
    let m = p.open();
    let end = marker_end(p, 0);
    for _ in 0..end {
        p.advance();
    }
    p.close(m, SyntaxKind::BINDING_MARKER);
}

/// `= s1, s2, ...` with the `=` already consumed. Empty slots are left empty
/// so the construct can be rejected with a precise span.
pub(crate) fn step_list(p: &mut Parser) {
    let m = p.open();
    loop {
        if !p.at_any(EXPR_TERMINATORS) && assign_expr(p).is_none() {
            break;
        }
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    p.close(m, SyntaxKind::STEP_LIST);
}

fn temp_binding_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // var / let / const
    binding_marker(p);
    if p.eat(SyntaxKind::EQ) {
        step_list(p);
    }
    p.close(m, SyntaxKind::TEMP_BINDING_EXPR)
}
