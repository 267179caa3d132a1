use serde::Serialize;

use crate::span::Span;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Create a new token from a kind and byte offsets.
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }
}

/// Every kind of token in the host language.
///
/// The host is a JavaScript subset. The temporary-binding productions reuse
/// existing tokens (`let`, `(`, identifier, `)`, `=`), so the vocabulary has
/// nothing proposal-specific in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // ── Keywords (25) ──────────────────────────────────────────────────
    Async,
    Await,
    Break,
    Const,
    Continue,
    Delete,
    Else,
    False,
    For,
    Function,
    If,
    In,
    Instanceof,
    Let,
    New,
    Null,
    Return,
    This,
    Throw,
    True,
    Typeof,
    Var,
    Void,
    While,
    /// Reserved so `do ... while` is rejected instead of parsed as a call.
    Do,

    // ── Operators (31) ─────────────────────────────────────────────────
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    StarStar,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `===`
    EqEqEq,
    /// `!==`
    NotEqEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `??`
    QuestionQuestion,
    /// `!`
    Bang,
    /// `=`
    Eq,
    /// `+=`
    PlusEq,
    /// `-=`
    MinusEq,
    /// `*=`
    StarEq,
    /// `/=`
    SlashEq,
    /// `%=`
    PercentEq,
    /// `=>`
    FatArrow,
    /// `?`
    Question,
    /// `?.`
    QuestionDot,
    /// `:`
    Colon,
    /// `...`
    DotDotDot,

    // ── Delimiters (6) ─────────────────────────────────────────────────
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,

    // ── Punctuation (3) ────────────────────────────────────────────────
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `;`
    Semicolon,

    // ── Literals (7) ───────────────────────────────────────────────────
    /// Number literal, e.g. `42`, `0xFF`, `1.5e3`.
    Number,
    /// Complete single- or double-quoted string literal, quotes included.
    String,
    /// Opening backtick of a template literal.
    TemplateStart,
    /// Literal text inside a template literal.
    TemplateContent,
    /// Closing backtick of a template literal.
    TemplateEnd,
    /// `${` inside a template literal.
    InterpolationStart,
    /// `}` that closes a template interpolation.
    InterpolationEnd,

    // ── Identifiers and comments (2) ───────────────────────────────────
    /// Identifier, e.g. `foo`, `$`, `_`, `$el`.
    Ident,
    /// `// ...` or `/* ... */`. Trivia for the parser.
    Comment,

    // ── Special (2) ────────────────────────────────────────────────────
    /// End of file.
    Eof,
    /// Invalid/unexpected input. Used for error recovery.
    Error,
}

impl TokenKind {
    /// Whether this token is trivia the parser skips during lookahead.
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::Comment)
    }
}

/// Look up a keyword from its string representation.
///
/// `of` is deliberately absent: it is contextual and the parser checks the
/// identifier text inside `for (... of ...)` headers.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "async" => Some(TokenKind::Async),
        "await" => Some(TokenKind::Await),
        "break" => Some(TokenKind::Break),
        "const" => Some(TokenKind::Const),
        "continue" => Some(TokenKind::Continue),
        "delete" => Some(TokenKind::Delete),
        "do" => Some(TokenKind::Do),
        "else" => Some(TokenKind::Else),
        "false" => Some(TokenKind::False),
        "for" => Some(TokenKind::For),
        "function" => Some(TokenKind::Function),
        "if" => Some(TokenKind::If),
        "in" => Some(TokenKind::In),
        "instanceof" => Some(TokenKind::Instanceof),
        "let" => Some(TokenKind::Let),
        "new" => Some(TokenKind::New),
        "null" => Some(TokenKind::Null),
        "return" => Some(TokenKind::Return),
        "this" => Some(TokenKind::This),
        "throw" => Some(TokenKind::Throw),
        "true" => Some(TokenKind::True),
        "typeof" => Some(TokenKind::Typeof),
        "var" => Some(TokenKind::Var),
        "void" => Some(TokenKind::Void),
        "while" => Some(TokenKind::While),
        _ => None,
    }
}
