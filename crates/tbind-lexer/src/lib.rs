// Lexer for the temporary-binding host language (a JavaScript subset).

mod cursor;

use cursor::Cursor;
use tbind_common::error::{LexError, LexErrorKind};
use tbind_common::span::Span;
use tbind_common::token::{keyword_from_str, Token, TokenKind};

/// Lexing context. Template literals nest: an interpolation may contain
/// another template, so the lexer keeps a stack of these.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    /// Inside backticks, lexing literal text.
    Template,
    /// Inside `${ ... }`. `depth` counts unmatched `{` so the right `}`
    /// closes the interpolation.
    Interpolation { depth: u32 },
}

/// Converts source text into a stream of tokens.
///
/// Whitespace (including newlines) is skipped; comments are kept as
/// [`TokenKind::Comment`] so tooling can see them. Errors are recorded and
/// also surface as [`TokenKind::Error`] tokens so the parser can recover.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    modes: Vec<Mode>,
    errors: Vec<LexError>,
    emitted_eof: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            modes: Vec::new(),
            errors: Vec::new(),
            emitted_eof: false,
        }
    }

    /// Tokenize the entire source into a `Vec<Token>`, ending with `Eof`.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    /// Tokenize and also return the lexer errors.
    pub fn tokenize_with_errors(source: &str) -> (Vec<Token>, Vec<LexError>) {
        let mut lexer = Lexer::new(source);
        let tokens: Vec<Token> = lexer.by_ref().collect();
        (tokens, lexer.errors)
    }

    fn next_token(&mut self) -> Token {
        if self.modes.last() == Some(&Mode::Template) {
            return self.lex_template_part();
        }

        self.skip_whitespace();
        let start = self.cursor.pos();

        let Some(c) = self.cursor.peek() else {
            if let Some(mode) = self.modes.pop() {
                // End of input inside `${`: the template is unterminated.
                debug_assert!(matches!(mode, Mode::Interpolation { .. }));
                self.modes.clear();
                self.errors.push(LexError::new(
                    LexErrorKind::UnterminatedTemplate,
                    Span::point(start),
                ));
            }
            return Token::new(TokenKind::Eof, start, start);
        };

        match c {
            '(' => self.single(TokenKind::LParen, start),
            ')' => self.single(TokenKind::RParen, start),
            '[' => self.single(TokenKind::LBracket, start),
            ']' => self.single(TokenKind::RBracket, start),
            '{' => {
                if let Some(Mode::Interpolation { depth }) = self.modes.last_mut() {
                    *depth += 1;
                }
                self.single(TokenKind::LBrace, start)
            }
            '}' => self.lex_rbrace(start),
            ',' => self.single(TokenKind::Comma, start),
            ';' => self.single(TokenKind::Semicolon, start),
            ':' => self.single(TokenKind::Colon, start),

            '=' => self.lex_eq(start),
            '!' => self.lex_bang(start),
            '<' => self.with_optional_eq(TokenKind::Lt, TokenKind::LtEq, start),
            '>' => self.with_optional_eq(TokenKind::Gt, TokenKind::GtEq, start),
            '&' => self.lex_doubled('&', TokenKind::AmpAmp, start),
            '|' => self.lex_doubled('|', TokenKind::PipePipe, start),
            '+' => self.lex_plus_minus('+', TokenKind::Plus, TokenKind::PlusPlus, TokenKind::PlusEq, start),
            '-' => self.lex_plus_minus('-', TokenKind::Minus, TokenKind::MinusMinus, TokenKind::MinusEq, start),
            '*' => self.lex_star(start),
            '%' => self.with_optional_eq(TokenKind::Percent, TokenKind::PercentEq, start),
            '?' => self.lex_question(start),
            '.' => self.lex_dot(start),
            '/' => self.lex_slash(start),

            '0'..='9' => self.lex_number(start),
            '"' | '\'' => self.lex_string(c, start),
            '`' => {
                self.cursor.advance();
                self.modes.push(Mode::Template);
                Token::new(TokenKind::TemplateStart, start, self.cursor.pos())
            }

            c if is_ident_start(c) => self.lex_ident(start),

            _ => {
                self.cursor.advance();
                self.errors.push(LexError::new(
                    LexErrorKind::UnexpectedCharacter(c),
                    Span::new(start, self.cursor.pos()),
                ));
                Token::new(TokenKind::Error, start, self.cursor.pos())
            }
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    fn skip_whitespace(&mut self) {
        self.cursor.eat_while(|c| c.is_whitespace());
    }

    fn single(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        Token::new(kind, start, self.cursor.pos())
    }

    fn finish(&self, kind: TokenKind, start: u32) -> Token {
        Token::new(kind, start, self.cursor.pos())
    }

    // ── Operators ────────────────────────────────────────────────────────

    /// `}` closes an interpolation when no `{` opened inside it is pending.
    fn lex_rbrace(&mut self, start: u32) -> Token {
        if let Some(Mode::Interpolation { depth }) = self.modes.last_mut() {
            if *depth == 0 {
                self.modes.pop();
                return self.single(TokenKind::InterpolationEnd, start);
            }
            *depth -= 1;
        }
        self.single(TokenKind::RBrace, start)
    }

    /// `=`, `==`, `===`, `=>`
    fn lex_eq(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.eat('>') {
            return self.finish(TokenKind::FatArrow, start);
        }
        if self.cursor.eat('=') {
            if self.cursor.eat('=') {
                return self.finish(TokenKind::EqEqEq, start);
            }
            return self.finish(TokenKind::EqEq, start);
        }
        self.finish(TokenKind::Eq, start)
    }

    /// `!`, `!=`, `!==`
    fn lex_bang(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.eat('=') {
            if self.cursor.eat('=') {
                return self.finish(TokenKind::NotEqEq, start);
            }
            return self.finish(TokenKind::NotEq, start);
        }
        self.finish(TokenKind::Bang, start)
    }

    fn with_optional_eq(&mut self, plain: TokenKind, with_eq: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.eat('=') {
            self.finish(with_eq, start)
        } else {
            self.finish(plain, start)
        }
    }

    /// `&&` / `||`. Bitwise operators are outside the subset.
    fn lex_doubled(&mut self, c: char, kind: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.eat(c) {
            return self.finish(kind, start);
        }
        self.errors.push(LexError::new(
            LexErrorKind::UnexpectedCharacter(c),
            Span::new(start, self.cursor.pos()),
        ));
        self.finish(TokenKind::Error, start)
    }

    fn lex_plus_minus(
        &mut self,
        c: char,
        plain: TokenKind,
        doubled: TokenKind,
        with_eq: TokenKind,
        start: u32,
    ) -> Token {
        self.cursor.advance();
        if self.cursor.eat(c) {
            self.finish(doubled, start)
        } else if self.cursor.eat('=') {
            self.finish(with_eq, start)
        } else {
            self.finish(plain, start)
        }
    }

    /// `*`, `**`, `*=`
    fn lex_star(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.eat('*') {
            self.finish(TokenKind::StarStar, start)
        } else if self.cursor.eat('=') {
            self.finish(TokenKind::StarEq, start)
        } else {
            self.finish(TokenKind::Star, start)
        }
    }

    /// `?`, `??`, `?.` (but not `?.5`, which is `?` followed by a number).
    fn lex_question(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.eat('?') {
            return self.finish(TokenKind::QuestionQuestion, start);
        }
        if self.cursor.peek() == Some('.')
            && !self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.advance();
            return self.finish(TokenKind::QuestionDot, start);
        }
        self.finish(TokenKind::Question, start)
    }

    /// `.`, `...`, or a number such as `.5`.
    fn lex_dot(&mut self, start: u32) -> Token {
        if self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            return self.lex_number(start);
        }
        if self.cursor.eat_str("...") {
            return self.finish(TokenKind::DotDotDot, start);
        }
        self.single(TokenKind::Dot, start)
    }

    /// `/`, `/=`, or a comment. Regular expression literals are not lexed.
    fn lex_slash(&mut self, start: u32) -> Token {
        if self.cursor.eat_str("//") {
            self.cursor.eat_while(|c| c != '\n');
            return self.finish(TokenKind::Comment, start);
        }
        if self.cursor.eat_str("/*") {
            loop {
                if self.cursor.eat_str("*/") {
                    return self.finish(TokenKind::Comment, start);
                }
                if self.cursor.advance().is_none() {
                    self.errors.push(LexError::new(
                        LexErrorKind::UnterminatedBlockComment,
                        Span::new(start, self.cursor.pos()),
                    ));
                    return self.finish(TokenKind::Comment, start);
                }
            }
        }
        self.with_optional_eq(TokenKind::Slash, TokenKind::SlashEq, start)
    }

    // ── Literals ─────────────────────────────────────────────────────────

    /// Decimal (with fraction and exponent) or `0x`/`0o`/`0b` integers.
    fn lex_number(&mut self, start: u32) -> Token {
        if self.cursor.peek() == Some('0')
            && matches!(self.cursor.peek_nth(1), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B'))
        {
            self.cursor.advance();
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_hexdigit() || c == '_');
            return self.finish(TokenKind::Number, start);
        }

        self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
        if self.cursor.peek() == Some('.')
            && self.cursor.peek_nth(1).map_or(true, |c| !is_ident_start(c) && c != '.')
        {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
        }
        if matches!(self.cursor.peek(), Some('e' | 'E'))
            && self
                .cursor
                .peek_nth(1)
                .is_some_and(|c| c.is_ascii_digit() || c == '+' || c == '-')
        {
            self.cursor.advance();
            if matches!(self.cursor.peek(), Some('+' | '-')) {
                self.cursor.advance();
            }
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }
        self.finish(TokenKind::Number, start)
    }

    /// A complete quoted string, quotes and escapes included.
    fn lex_string(&mut self, quote: char, start: u32) -> Token {
        self.cursor.advance();
        loop {
            match self.cursor.peek() {
                Some(c) if c == quote => {
                    self.cursor.advance();
                    return self.finish(TokenKind::String, start);
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                None | Some('\n') => {
                    self.errors.push(LexError::new(
                        LexErrorKind::UnterminatedString,
                        Span::new(start, self.cursor.pos()),
                    ));
                    return self.finish(TokenKind::Error, start);
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    /// Inside backticks: literal text, `${`, or the closing backtick.
    fn lex_template_part(&mut self) -> Token {
        let start = self.cursor.pos();
        if self.cursor.eat('`') {
            self.modes.pop();
            return self.finish(TokenKind::TemplateEnd, start);
        }
        if self.cursor.eat_str("${") {
            self.modes.push(Mode::Interpolation { depth: 0 });
            return self.finish(TokenKind::InterpolationStart, start);
        }
        loop {
            match self.cursor.peek() {
                None => {
                    self.modes.clear();
                    self.errors.push(LexError::new(
                        LexErrorKind::UnterminatedTemplate,
                        Span::new(start, self.cursor.pos()),
                    ));
                    if self.cursor.pos() == start {
                        return Token::new(TokenKind::Eof, start, start);
                    }
                    return self.finish(TokenKind::Error, start);
                }
                Some('`') => break,
                Some('$') if self.cursor.peek_nth(1) == Some('{') => break,
                Some('\\') => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
        self.finish(TokenKind::TemplateContent, start)
    }

    fn lex_ident(&mut self, start: u32) -> Token {
        self.cursor.advance();
        self.cursor.eat_while(is_ident_continue);
        let text = self.cursor.slice(start, self.cursor.pos());
        let kind = keyword_from_str(text).unwrap_or(TokenKind::Ident);
        self.finish(kind, start)
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

/// Whether a character can start an identifier. `$` and `_` are ordinary
/// identifier characters, which is what makes `const($)` work.
pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

/// Whether a character can continue an identifier.
pub fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lex_declaration_form_marker() {
        assert_eq!(
            kinds("const($) x = 10;"),
            vec![
                TokenKind::Const,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::RParen,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::Number,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn dollar_and_underscore_are_identifiers() {
        assert_eq!(
            kinds("$ _ $el _x1"),
            vec![
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn spans_are_byte_offsets() {
        let tokens = Lexer::tokenize("let(_) = a");
        let spans: Vec<_> = tokens.iter().map(|t| (t.span.start, t.span.end)).collect();
        assert_eq!(spans, vec![(0, 3), (3, 4), (4, 5), (5, 6), (7, 8), (9, 10), (10, 10)]);
    }

    #[test]
    fn equality_and_arrow_operators() {
        assert_eq!(
            kinds("= == === => != !== !"),
            vec![
                TokenKind::Eq,
                TokenKind::EqEq,
                TokenKind::EqEqEq,
                TokenKind::FatArrow,
                TokenKind::NotEq,
                TokenKind::NotEqEq,
                TokenKind::Bang,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn question_forms() {
        assert_eq!(
            kinds("a?.b ?? c ? .5 : d"),
            vec![
                TokenKind::Ident,
                TokenKind::QuestionDot,
                TokenKind::Ident,
                TokenKind::QuestionQuestion,
                TokenKind::Ident,
                TokenKind::Question,
                TokenKind::Number,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn member_access_after_number_fraction() {
        // `1.5.toFixed` : the second dot is member access.
        assert_eq!(
            kinds("1.5.toFixed"),
            vec![TokenKind::Number, TokenKind::Dot, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn template_with_nested_braces_in_interpolation() {
        assert_eq!(
            kinds("`a${ {k: 1}.k }b`"),
            vec![
                TokenKind::TemplateStart,
                TokenKind::TemplateContent,
                TokenKind::InterpolationStart,
                TokenKind::LBrace,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Number,
                TokenKind::RBrace,
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::InterpolationEnd,
                TokenKind::TemplateContent,
                TokenKind::TemplateEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_tokens() {
        assert_eq!(
            kinds("a // line\n/* block */ b"),
            vec![
                TokenKind::Ident,
                TokenKind::Comment,
                TokenKind::Comment,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unterminated_string_is_reported() {
        let (tokens, errors) = Lexer::tokenize_with_errors("'abc");
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::UnterminatedString);
    }

    #[test]
    fn unterminated_template_is_reported() {
        let (_, errors) = Lexer::tokenize_with_errors("`abc ${x");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::UnterminatedTemplate);
    }

    #[test]
    fn single_ampersand_is_an_error() {
        let (tokens, errors) = Lexer::tokenize_with_errors("a & b");
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(errors[0].kind, LexErrorKind::UnexpectedCharacter('&'));
    }
}
