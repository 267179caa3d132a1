use insta::assert_snapshot;
use tbind_common::token::TokenKind;
use tbind_lexer::Lexer;

/// One line per token: `Kind "text" start..end`.
fn dump(source: &str) -> String {
    Lexer::tokenize(source)
        .into_iter()
        .map(|tok| {
            let text = &source[tok.span.range()];
            format!("{:?} {:?} {}..{}", tok.kind, text, tok.span.start, tok.span.end)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::tokenize(source).into_iter().map(|t| t.kind).collect()
}

// ── Temporary-binding shapes ─────────────────────────────────────────────

#[test]
fn declaration_form_with_pipeline() {
    assert_snapshot!(dump("let($) x = 1, $ + 1;"), @r#"
    Let "let" 0..3
    LParen "(" 3..4
    Ident "$" 4..5
    RParen ")" 5..6
    Ident "x" 7..8
    Eq "=" 9..10
    Number "1" 11..12
    Comma "," 12..13
    Ident "$" 14..15
    Plus "+" 16..17
    Number "1" 18..19
    Semicolon ";" 19..20
    Eof "" 20..20
    "#);
}

#[test]
fn expression_form_inside_call() {
    assert_snapshot!(dump("f(var(_) = a, _)"), @r#"
    Ident "f" 0..1
    LParen "(" 1..2
    Var "var" 2..5
    LParen "(" 5..6
    Ident "_" 6..7
    RParen ")" 7..8
    Eq "=" 9..10
    Ident "a" 11..12
    Comma "," 12..13
    Ident "_" 14..15
    RParen ")" 15..16
    Eof "" 16..16
    "#);
}

#[test]
fn object_shorthand_reference() {
    assert_eq!(
        kinds("{ $ }"),
        vec![TokenKind::LBrace, TokenKind::Ident, TokenKind::RBrace, TokenKind::Eof]
    );
}

// ── Host language ────────────────────────────────────────────────────────

#[test]
fn keywords_and_contextual_of() {
    assert_eq!(
        kinds("for (const k of xs) await async"),
        vec![
            TokenKind::For,
            TokenKind::LParen,
            TokenKind::Const,
            TokenKind::Ident,
            TokenKind::Ident,
            TokenKind::Ident,
            TokenKind::RParen,
            TokenKind::Await,
            TokenKind::Async,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn compound_assignment_and_update_operators() {
    assert_eq!(
        kinds("a += 1; b -= 2; c *= 3; d /= 4; e %= 5; f++; g--; h ** 2"),
        vec![
            TokenKind::Ident,
            TokenKind::PlusEq,
            TokenKind::Number,
            TokenKind::Semicolon,
            TokenKind::Ident,
            TokenKind::MinusEq,
            TokenKind::Number,
            TokenKind::Semicolon,
            TokenKind::Ident,
            TokenKind::StarEq,
            TokenKind::Number,
            TokenKind::Semicolon,
            TokenKind::Ident,
            TokenKind::SlashEq,
            TokenKind::Number,
            TokenKind::Semicolon,
            TokenKind::Ident,
            TokenKind::PercentEq,
            TokenKind::Number,
            TokenKind::Semicolon,
            TokenKind::Ident,
            TokenKind::PlusPlus,
            TokenKind::Semicolon,
            TokenKind::Ident,
            TokenKind::MinusMinus,
            TokenKind::Semicolon,
            TokenKind::Ident,
            TokenKind::StarStar,
            TokenKind::Number,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn numbers() {
    assert_snapshot!(dump("0 42 3.14 .5 1e3 2.5E-2 0xFF 1_000"), @r#"
    Number "0" 0..1
    Number "42" 2..4
    Number "3.14" 5..9
    Number ".5" 10..12
    Number "1e3" 13..16
    Number "2.5E-2" 17..23
    Number "0xFF" 24..28
    Number "1_000" 29..34
    Eof "" 34..34
    "#);
}

#[test]
fn strings_keep_quotes_and_escapes() {
    assert_snapshot!(dump(r#"'it\'s' "a\"b""#), @r#"
    String "'it\\'s'" 0..7
    String "\"a\\\"b\"" 8..14
    Eof "" 14..14
    "#);
}

#[test]
fn template_literal_parts() {
    assert_snapshot!(dump("`x=${x}!`"), @r#"
    TemplateStart "`" 0..1
    TemplateContent "x=" 1..3
    InterpolationStart "${" 3..5
    Ident "x" 5..6
    InterpolationEnd "}" 6..7
    TemplateContent "!" 7..8
    TemplateEnd "`" 8..9
    Eof "" 9..9
    "#);
}

#[test]
fn nested_template_inside_interpolation() {
    assert_eq!(
        kinds("`a${`b${c}`}`"),
        vec![
            TokenKind::TemplateStart,
            TokenKind::TemplateContent,
            TokenKind::InterpolationStart,
            TokenKind::TemplateStart,
            TokenKind::TemplateContent,
            TokenKind::InterpolationStart,
            TokenKind::Ident,
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd,
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn spread_and_optional_chaining() {
    assert_eq!(
        kinds("[...xs, o?.p, o?.[0]]"),
        vec![
            TokenKind::LBracket,
            TokenKind::DotDotDot,
            TokenKind::Ident,
            TokenKind::Comma,
            TokenKind::Ident,
            TokenKind::QuestionDot,
            TokenKind::Ident,
            TokenKind::Comma,
            TokenKind::Ident,
            TokenKind::QuestionDot,
            TokenKind::LBracket,
            TokenKind::Number,
            TokenKind::RBracket,
            TokenKind::RBracket,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn unicode_identifiers_use_byte_offsets() {
    assert_snapshot!(dump("caf\u{e9} = 1"), @r#"
    Ident "café" 0..5
    Eq "=" 6..7
    Number "1" 8..9
    Eof "" 9..9
    "#);
}

// ── Errors ───────────────────────────────────────────────────────────────

#[test]
fn errors_are_collected_not_fatal() {
    let (tokens, errors) = Lexer::tokenize_with_errors("a # b @ c");
    assert_eq!(errors.len(), 2);
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    assert_eq!(
        tokens.iter().filter(|t| t.kind == TokenKind::Ident).count(),
        3
    );
}

#[test]
fn unterminated_block_comment() {
    let (tokens, errors) = Lexer::tokenize_with_errors("a /* never closed");
    assert_eq!(tokens[1].kind, TokenKind::Comment);
    assert_eq!(errors[0].to_string(), "unterminated block comment");
}
