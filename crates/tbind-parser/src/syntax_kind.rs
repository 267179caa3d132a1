//! SyntaxKind enum for the host-language CST.
//!
//! Token kinds are mapped 1:1 from [`TokenKind`] into SCREAMING_SNAKE_CASE;
//! composite kinds name the nodes the parser builds.

use tbind_common::token::TokenKind;

/// Every kind of syntax element in the CST.
///
/// The first two values are sentinels used by the event-based parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // ── Sentinels ──────────────────────────────────────────────────────
    /// Placeholder kind for abandoned or forwarded parser events.
    TOMBSTONE = 0,
    /// Wrapper for tokens that couldn't be parsed.
    ERROR_NODE = 1,

    // ── Keywords ───────────────────────────────────────────────────────
    ASYNC_KW,
    AWAIT_KW,
    BREAK_KW,
    CONST_KW,
    CONTINUE_KW,
    DELETE_KW,
    DO_KW,
    ELSE_KW,
    FALSE_KW,
    FOR_KW,
    FUNCTION_KW,
    IF_KW,
    IN_KW,
    INSTANCEOF_KW,
    LET_KW,
    NEW_KW,
    NULL_KW,
    RETURN_KW,
    THIS_KW,
    THROW_KW,
    TRUE_KW,
    TYPEOF_KW,
    VAR_KW,
    VOID_KW,
    WHILE_KW,

    // ── Operators ──────────────────────────────────────────────────────
    PLUS,
    MINUS,
    STAR,
    STAR_STAR,
    SLASH,
    PERCENT,
    PLUS_PLUS,
    MINUS_MINUS,
    EQ_EQ,
    NOT_EQ,
    EQ_EQ_EQ,
    NOT_EQ_EQ,
    LT,
    GT,
    LT_EQ,
    GT_EQ,
    AMP_AMP,
    PIPE_PIPE,
    QUESTION_QUESTION,
    BANG,
    EQ,
    PLUS_EQ,
    MINUS_EQ,
    STAR_EQ,
    SLASH_EQ,
    PERCENT_EQ,
    FAT_ARROW,
    QUESTION,
    QUESTION_DOT,
    COLON,
    DOT_DOT_DOT,

    // ── Delimiters and punctuation ─────────────────────────────────────
    L_PAREN,
    R_PAREN,
    L_BRACKET,
    R_BRACKET,
    L_BRACE,
    R_BRACE,
    COMMA,
    DOT,
    SEMICOLON,

    // ── Literals, identifiers, trivia ──────────────────────────────────
    NUMBER,
    STRING,
    TEMPLATE_START,
    TEMPLATE_CONTENT,
    TEMPLATE_END,
    INTERPOLATION_START,
    INTERPOLATION_END,
    IDENT,
    COMMENT,
    /// Gap between lexer tokens, inserted while building the tree so that
    /// node ranges are source offsets.
    WHITESPACE,
    EOF,
    ERROR,

    // ── Statement nodes ────────────────────────────────────────────────
    /// Root node.
    SOURCE_FILE,
    /// `let a = 1, b;`
    VAR_DECL,
    /// One `name = init` entry of a VAR_DECL.
    DECLARATOR,
    /// `async function name(params) { ... }`
    FN_DECL,
    /// `(a, b, ...rest)`
    PARAM_LIST,
    /// A single parameter, optionally with a leading `...`.
    PARAM,
    /// `{ stmts }`
    BLOCK,
    RETURN_STMT,
    IF_STMT,
    /// `else` branch of an IF_STMT.
    ELSE_BRANCH,
    WHILE_STMT,
    /// `for (init; test; update) body`
    FOR_STMT,
    /// `for (const x of xs) body`
    FOR_OF_STMT,
    /// Init, test, or update clause of a FOR_STMT. Kept as a node so an
    /// empty clause is still visible.
    FOR_CLAUSE,
    BREAK_STMT,
    CONTINUE_STMT,
    THROW_STMT,
    EXPR_STMT,
    /// A lone `;`.
    EMPTY_STMT,
    /// `const($) x = s1, s2;`
    TEMP_BINDING_DECL,

    // ── Expression nodes ───────────────────────────────────────────────
    /// Number, string, `true`, `false`, `null`.
    LITERAL,
    /// `` `a${b}c` ``
    TEMPLATE_LITERAL,
    /// `${ expr }` inside a template.
    INTERPOLATION,
    NAME_REF,
    THIS_EXPR,
    ARRAY_EXPR,
    /// `...expr` in arrays, objects and argument lists.
    SPREAD,
    OBJECT_EXPR,
    /// `key: value`
    PROPERTY,
    /// `{ name }`
    SHORTHAND_PROPERTY,
    /// `[expr]` used as a property key.
    COMPUTED_KEY,
    /// `obj.name` or `obj?.name`
    FIELD_EXPR,
    /// `obj[i]` or `obj?.[i]`
    INDEX_EXPR,
    /// `f(args)` or `f?.(args)`
    CALL_EXPR,
    ARG_LIST,
    /// `new C(args)`
    NEW_EXPR,
    /// `(a) => body`, `a => body`, `async () => body`
    ARROW_FN,
    /// `function name?(params) { ... }` in expression position.
    FN_EXPR,
    /// `!x`, `-x`, `typeof x`, `await x`, `++x`, ...
    PREFIX_EXPR,
    /// `x++`, `x--`
    POSTFIX_EXPR,
    BINARY_EXPR,
    /// `c ? a : b`
    CONDITIONAL_EXPR,
    ASSIGN_EXPR,
    PAREN_EXPR,
    /// `a, b, c` where the comma operator applies.
    SEQUENCE_EXPR,
    /// `let(a) = s1, s2` in expression position.
    TEMP_BINDING_EXPR,
    /// `(ident)` after the declaration keyword of a temporary binding. The
    /// parser accepts any tokens up to the matching `)` so that shape errors
    /// are reported against the construct rather than as syntax errors.
    BINDING_MARKER,
    /// The comma-separated steps after `=` in a temporary binding.
    STEP_LIST,
}

impl SyntaxKind {
    /// Whether this kind is trivia skipped by the parser's lookahead.
    pub fn is_trivia(self) -> bool {
        matches!(self, SyntaxKind::COMMENT | SyntaxKind::WHITESPACE)
    }

    /// `var`, `let` or `const`.
    pub fn is_decl_keyword(self) -> bool {
        matches!(
            self,
            SyntaxKind::VAR_KW | SyntaxKind::LET_KW | SyntaxKind::CONST_KW
        )
    }

    /// Keywords may be used as property names after `.` and as object keys.
    pub fn is_keyword(self) -> bool {
        (self as u16) >= (SyntaxKind::ASYNC_KW as u16) && (self as u16) <= (SyntaxKind::WHILE_KW as u16)
    }
}

impl From<TokenKind> for SyntaxKind {
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Async => SyntaxKind::ASYNC_KW,
            TokenKind::Await => SyntaxKind::AWAIT_KW,
            TokenKind::Break => SyntaxKind::BREAK_KW,
            TokenKind::Const => SyntaxKind::CONST_KW,
            TokenKind::Continue => SyntaxKind::CONTINUE_KW,
            TokenKind::Delete => SyntaxKind::DELETE_KW,
            TokenKind::Do => SyntaxKind::DO_KW,
            TokenKind::Else => SyntaxKind::ELSE_KW,
            TokenKind::False => SyntaxKind::FALSE_KW,
            TokenKind::For => SyntaxKind::FOR_KW,
            TokenKind::Function => SyntaxKind::FUNCTION_KW,
            TokenKind::If => SyntaxKind::IF_KW,
            TokenKind::In => SyntaxKind::IN_KW,
            TokenKind::Instanceof => SyntaxKind::INSTANCEOF_KW,
            TokenKind::Let => SyntaxKind::LET_KW,
            TokenKind::New => SyntaxKind::NEW_KW,
            TokenKind::Null => SyntaxKind::NULL_KW,
            TokenKind::Return => SyntaxKind::RETURN_KW,
            TokenKind::This => SyntaxKind::THIS_KW,
            TokenKind::Throw => SyntaxKind::THROW_KW,
            TokenKind::True => SyntaxKind::TRUE_KW,
            TokenKind::Typeof => SyntaxKind::TYPEOF_KW,
            TokenKind::Var => SyntaxKind::VAR_KW,
            TokenKind::Void => SyntaxKind::VOID_KW,
            TokenKind::While => SyntaxKind::WHILE_KW,

            TokenKind::Plus => SyntaxKind::PLUS,
            TokenKind::Minus => SyntaxKind::MINUS,
            TokenKind::Star => SyntaxKind::STAR,
            TokenKind::StarStar => SyntaxKind::STAR_STAR,
            TokenKind::Slash => SyntaxKind::SLASH,
            TokenKind::Percent => SyntaxKind::PERCENT,
            TokenKind::PlusPlus => SyntaxKind::PLUS_PLUS,
            TokenKind::MinusMinus => SyntaxKind::MINUS_MINUS,
            TokenKind::EqEq => SyntaxKind::EQ_EQ,
            TokenKind::NotEq => SyntaxKind::NOT_EQ,
            TokenKind::EqEqEq => SyntaxKind::EQ_EQ_EQ,
            TokenKind::NotEqEq => SyntaxKind::NOT_EQ_EQ,
            TokenKind::Lt => SyntaxKind::LT,
            TokenKind::Gt => SyntaxKind::GT,
            TokenKind::LtEq => SyntaxKind::LT_EQ,
            TokenKind::GtEq => SyntaxKind::GT_EQ,
            TokenKind::AmpAmp => SyntaxKind::AMP_AMP,
            TokenKind::PipePipe => SyntaxKind::PIPE_PIPE,
            TokenKind::QuestionQuestion => SyntaxKind::QUESTION_QUESTION,
            TokenKind::Bang => SyntaxKind::BANG,
            TokenKind::Eq => SyntaxKind::EQ,
            TokenKind::PlusEq => SyntaxKind::PLUS_EQ,
            TokenKind::MinusEq => SyntaxKind::MINUS_EQ,
            TokenKind::StarEq => SyntaxKind::STAR_EQ,
            TokenKind::SlashEq => SyntaxKind::SLASH_EQ,
            TokenKind::PercentEq => SyntaxKind::PERCENT_EQ,
            TokenKind::FatArrow => SyntaxKind::FAT_ARROW,
            TokenKind::Question => SyntaxKind::QUESTION,
            TokenKind::QuestionDot => SyntaxKind::QUESTION_DOT,
            TokenKind::Colon => SyntaxKind::COLON,
            TokenKind::DotDotDot => SyntaxKind::DOT_DOT_DOT,

            TokenKind::LParen => SyntaxKind::L_PAREN,
            TokenKind::RParen => SyntaxKind::R_PAREN,
            TokenKind::LBracket => SyntaxKind::L_BRACKET,
            TokenKind::RBracket => SyntaxKind::R_BRACKET,
            TokenKind::LBrace => SyntaxKind::L_BRACE,
            TokenKind::RBrace => SyntaxKind::R_BRACE,
            TokenKind::Comma => SyntaxKind::COMMA,
            TokenKind::Dot => SyntaxKind::DOT,
            TokenKind::Semicolon => SyntaxKind::SEMICOLON,

            TokenKind::Number => SyntaxKind::NUMBER,
            TokenKind::String => SyntaxKind::STRING,
            TokenKind::TemplateStart => SyntaxKind::TEMPLATE_START,
            TokenKind::TemplateContent => SyntaxKind::TEMPLATE_CONTENT,
            TokenKind::TemplateEnd => SyntaxKind::TEMPLATE_END,
            TokenKind::InterpolationStart => SyntaxKind::INTERPOLATION_START,
            TokenKind::InterpolationEnd => SyntaxKind::INTERPOLATION_END,
            TokenKind::Ident => SyntaxKind::IDENT,
            TokenKind::Comment => SyntaxKind::COMMENT,
            TokenKind::Eof => SyntaxKind::EOF,
            TokenKind::Error => SyntaxKind::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_kinds_are_first_values() {
        assert_eq!(SyntaxKind::TOMBSTONE as u16, 0);
        assert_eq!(SyntaxKind::ERROR_NODE as u16, 1);
    }

    #[test]
    fn token_kinds_map_to_syntax_kinds() {
        assert_eq!(SyntaxKind::from(TokenKind::Let), SyntaxKind::LET_KW);
        assert_eq!(SyntaxKind::from(TokenKind::Ident), SyntaxKind::IDENT);
        assert_eq!(SyntaxKind::from(TokenKind::QuestionDot), SyntaxKind::QUESTION_DOT);
        assert_eq!(SyntaxKind::from(TokenKind::Eof), SyntaxKind::EOF);
    }

    #[test]
    fn keyword_range_covers_all_keywords() {
        assert!(SyntaxKind::ASYNC_KW.is_keyword());
        assert!(SyntaxKind::NEW_KW.is_keyword());
        assert!(SyntaxKind::WHILE_KW.is_keyword());
        assert!(!SyntaxKind::IDENT.is_keyword());
        assert!(!SyntaxKind::PLUS.is_keyword());
    }

    #[test]
    fn whitespace_and_comments_are_trivia() {
        assert!(SyntaxKind::WHITESPACE.is_trivia());
        assert!(SyntaxKind::COMMENT.is_trivia());
        assert!(!SyntaxKind::IDENT.is_trivia());
    }

    #[test]
    fn decl_keywords() {
        assert!(SyntaxKind::VAR_KW.is_decl_keyword());
        assert!(SyntaxKind::LET_KW.is_decl_keyword());
        assert!(SyntaxKind::CONST_KW.is_decl_keyword());
        assert!(!SyntaxKind::FUNCTION_KW.is_decl_keyword());
    }

    #[test]
    fn last_kind_fits_in_u16() {
        assert!((SyntaxKind::STEP_LIST as u16) < u16::MAX);
    }
}
