//! Statement parsing.

use crate::parser::expressions::{self, binding_marker, marker_end, step_list};
use crate::parser::{MarkClosed, Parser};
use crate::syntax_kind::SyntaxKind;

/// Parse one statement of a statement list, resynchronizing after errors.
pub(crate) fn stmt_in_list(p: &mut Parser) {
    let start = p.position();
    stmt(p);
    if p.position() == start && !p.at(SyntaxKind::EOF) {
        p.advance_with_error("expected statement");
    }
    p.recover();
}

pub(crate) fn stmt(p: &mut Parser) {
    match p.current() {
        SyntaxKind::SEMICOLON => {
            let m = p.open();
            p.advance();
            p.close(m, SyntaxKind::EMPTY_STMT);
        }
        SyntaxKind::L_BRACE => block(p),
        k if k.is_decl_keyword() => {
            if p.nth(1) != SyntaxKind::L_PAREN {
                var_decl(p, true);
            } else if p.nth(marker_end(p, 1)) == SyntaxKind::IDENT {
                temp_binding_decl(p);
            } else {
                expr_stmt(p);
            }
        }
        SyntaxKind::FUNCTION_KW => {
            function(p, SyntaxKind::FN_DECL);
        }
        SyntaxKind::ASYNC_KW if p.nth(1) == SyntaxKind::FUNCTION_KW => {
            function(p, SyntaxKind::FN_DECL);
        }
        SyntaxKind::RETURN_KW => return_stmt(p),
        SyntaxKind::IF_KW => if_stmt(p),
        SyntaxKind::WHILE_KW => while_stmt(p),
        SyntaxKind::FOR_KW => for_stmt(p),
        SyntaxKind::BREAK_KW => keyword_stmt(p, SyntaxKind::BREAK_STMT),
        SyntaxKind::CONTINUE_KW => keyword_stmt(p, SyntaxKind::CONTINUE_STMT),
        SyntaxKind::THROW_KW => {
            let m = p.open();
            p.advance();
            if expressions::expr(p).is_none() {
                p.error("expected expression after `throw`");
            }
            p.eat(SyntaxKind::SEMICOLON);
            p.close(m, SyntaxKind::THROW_STMT);
        }
        SyntaxKind::DO_KW => p.advance_with_error("`do ... while` loops are not supported"),
        _ => expr_stmt(p),
    }
}

pub(crate) fn block(p: &mut Parser) {
    let m = p.open();
    let open_span = p.current_span();
    p.expect(SyntaxKind::L_BRACE);
    while !p.at_any(&[SyntaxKind::R_BRACE, SyntaxKind::EOF]) {
        stmt_in_list(p);
    }
    p.expect_closing(SyntaxKind::R_BRACE, open_span);
    p.close(m, SyntaxKind::BLOCK);
}

fn expr_stmt(p: &mut Parser) {
    let m = p.open();
    expressions::expr(p);
    p.eat(SyntaxKind::SEMICOLON);
    p.close(m, SyntaxKind::EXPR_STMT);
}

/// `var|let|const name (= init)? (, name (= init)?)*`
fn var_decl(p: &mut Parser, eat_semicolon: bool) -> MarkClosed {
    let m = p.open();
    p.advance(); // keyword
    loop {
        let d = p.open();
        p.expect(SyntaxKind::IDENT);
        if p.eat(SyntaxKind::EQ) && expressions::assign_expr(p).is_none() {
            p.error("expected initializer");
        }
        p.close(d, SyntaxKind::DECLARATOR);
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    if eat_semicolon {
        p.eat(SyntaxKind::SEMICOLON);
    }
    p.close(m, SyntaxKind::VAR_DECL)
}

/// `const($) name = s1, s2;`. A missing `=` is left for the engine to
/// report against the construct.
fn temp_binding_decl(p: &mut Parser) {
    let m = p.open();
    p.advance(); // keyword
    binding_marker(p);
    p.expect(SyntaxKind::IDENT);
    if p.eat(SyntaxKind::EQ) {
        step_list(p);
    }
    p.eat(SyntaxKind::SEMICOLON);
    p.close(m, SyntaxKind::TEMP_BINDING_DECL);
}

/// `async? function name?(params) { body }` as a declaration or expression.
pub(crate) fn function(p: &mut Parser, kind: SyntaxKind) -> MarkClosed {
    let m = p.open();
    p.eat(SyntaxKind::ASYNC_KW);
    p.advance(); // function
    if kind == SyntaxKind::FN_DECL {
        p.expect(SyntaxKind::IDENT);
    } else {
        p.eat(SyntaxKind::IDENT);
    }
    param_list(p);
    p.outside_for_header(block);
    p.close(m, kind)
}

pub(crate) fn param_list(p: &mut Parser) {
    let m = p.open();
    let open_span = p.current_span();
    if !p.expect(SyntaxKind::L_PAREN) {
        p.close(m, SyntaxKind::PARAM_LIST);
        return;
    }
    while !p.at_any(&[SyntaxKind::R_PAREN, SyntaxKind::EOF]) {
        let param = p.open();
        let rest = p.eat(SyntaxKind::DOT_DOT_DOT);
        let named = p.expect(SyntaxKind::IDENT);
        p.close(param, SyntaxKind::PARAM);
        if !named {
            break;
        }
        if rest && !p.at(SyntaxKind::R_PAREN) {
            p.error("rest parameter must be last");
            break;
        }
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    p.expect_closing(SyntaxKind::R_PAREN, open_span);
    p.close(m, SyntaxKind::PARAM_LIST);
}

fn return_stmt(p: &mut Parser) {
    let m = p.open();
    p.advance();
    if !p.at_any(&[SyntaxKind::SEMICOLON, SyntaxKind::R_BRACE, SyntaxKind::EOF]) {
        expressions::expr(p);
    }
    p.eat(SyntaxKind::SEMICOLON);
    p.close(m, SyntaxKind::RETURN_STMT);
}

fn keyword_stmt(p: &mut Parser, kind: SyntaxKind) {
    let m = p.open();
    p.advance();
    p.eat(SyntaxKind::SEMICOLON);
    p.close(m, kind);
}

/// `( expr )` condition of `if` and `while`.
fn condition(p: &mut Parser) {
    let open_span = p.current_span();
    if p.expect(SyntaxKind::L_PAREN) {
        if expressions::expr(p).is_none() {
            p.error("expected condition");
        }
        p.expect_closing(SyntaxKind::R_PAREN, open_span);
    }
}

fn if_stmt(p: &mut Parser) {
    let m = p.open();
    p.advance(); // if
    condition(p);
    stmt(p);
    if p.at(SyntaxKind::ELSE_KW) {
        let e = p.open();
        p.advance();
        stmt(p);
        p.close(e, SyntaxKind::ELSE_BRANCH);
    }
    p.close(m, SyntaxKind::IF_STMT);
}

fn while_stmt(p: &mut Parser) {
    let m = p.open();
    p.advance(); // while
    condition(p);
    stmt(p);
    p.close(m, SyntaxKind::WHILE_STMT);
}

/// `for (init; test; update) body` or `for (decl x of xs) body`.
fn for_stmt(p: &mut Parser) {
    let m = p.open();
    p.advance(); // for
    let open_span = p.current_span();
    if !p.expect(SyntaxKind::L_PAREN) {
        p.close(m, SyntaxKind::FOR_STMT);
        return;
    }

    let for_of = p.current().is_decl_keyword()
        && p.nth(1) == SyntaxKind::IDENT
        && p.nth(2) == SyntaxKind::IDENT
        && p.nth_text(2) == "of";

    p.enter_for_header();
    let kind = if for_of {
        p.advance(); // keyword
        p.advance(); // name
        p.advance(); // of
        if expressions::assign_expr(p).is_none() {
            p.error("expected iterable expression");
        }
        SyntaxKind::FOR_OF_STMT
    } else {
        let init = p.open();
        if p.current().is_decl_keyword() && p.nth(1) != SyntaxKind::L_PAREN {
            var_decl(p, false);
        } else if !p.at(SyntaxKind::SEMICOLON) {
            expressions::expr(p);
        }
        p.close(init, SyntaxKind::FOR_CLAUSE);
        p.expect(SyntaxKind::SEMICOLON);

        let test = p.open();
        if !p.at(SyntaxKind::SEMICOLON) {
            expressions::expr(p);
        }
        p.close(test, SyntaxKind::FOR_CLAUSE);
        p.expect(SyntaxKind::SEMICOLON);

        let update = p.open();
        if !p.at(SyntaxKind::R_PAREN) {
            expressions::expr(p);
        }
        p.close(update, SyntaxKind::FOR_CLAUSE);
        SyntaxKind::FOR_STMT
    };
    p.exit_for_header();

    p.expect_closing(SyntaxKind::R_PAREN, open_span);
    stmt(p);
    p.close(m, kind);
}
