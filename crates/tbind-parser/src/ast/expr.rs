//! Typed AST nodes for expressions, including the temporary-binding forms.

use crate::ast::{
    ast_node, child_node, child_token, direct_tokens, AstNode, Block, ParamList,
};
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

/// Any expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    TemplateLiteral(TemplateLiteral),
    NameRef(NameRef),
    ThisExpr(ThisExpr),
    ArrayExpr(ArrayExpr),
    ObjectExpr(ObjectExpr),
    FieldExpr(FieldExpr),
    IndexExpr(IndexExpr),
    CallExpr(CallExpr),
    NewExpr(NewExpr),
    ArrowFn(ArrowFn),
    FnExpr(FnExpr),
    PrefixExpr(PrefixExpr),
    PostfixExpr(PostfixExpr),
    BinaryExpr(BinaryExpr),
    ConditionalExpr(ConditionalExpr),
    AssignExpr(AssignExpr),
    ParenExpr(ParenExpr),
    SequenceExpr(SequenceExpr),
    TempBindingExpr(TempBindingExpr),
}

impl Expr {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        let expr = match node.kind() {
            SyntaxKind::LITERAL => Expr::Literal(Literal { syntax: node }),
            SyntaxKind::TEMPLATE_LITERAL => Expr::TemplateLiteral(TemplateLiteral { syntax: node }),
            SyntaxKind::NAME_REF => Expr::NameRef(NameRef { syntax: node }),
            SyntaxKind::THIS_EXPR => Expr::ThisExpr(ThisExpr { syntax: node }),
            SyntaxKind::ARRAY_EXPR => Expr::ArrayExpr(ArrayExpr { syntax: node }),
            SyntaxKind::OBJECT_EXPR => Expr::ObjectExpr(ObjectExpr { syntax: node }),
            SyntaxKind::FIELD_EXPR => Expr::FieldExpr(FieldExpr { syntax: node }),
            SyntaxKind::INDEX_EXPR => Expr::IndexExpr(IndexExpr { syntax: node }),
            SyntaxKind::CALL_EXPR => Expr::CallExpr(CallExpr { syntax: node }),
            SyntaxKind::NEW_EXPR => Expr::NewExpr(NewExpr { syntax: node }),
            SyntaxKind::ARROW_FN => Expr::ArrowFn(ArrowFn { syntax: node }),
            SyntaxKind::FN_EXPR => Expr::FnExpr(FnExpr { syntax: node }),
            SyntaxKind::PREFIX_EXPR => Expr::PrefixExpr(PrefixExpr { syntax: node }),
            SyntaxKind::POSTFIX_EXPR => Expr::PostfixExpr(PostfixExpr { syntax: node }),
            SyntaxKind::BINARY_EXPR => Expr::BinaryExpr(BinaryExpr { syntax: node }),
            SyntaxKind::CONDITIONAL_EXPR => Expr::ConditionalExpr(ConditionalExpr { syntax: node }),
            SyntaxKind::ASSIGN_EXPR => Expr::AssignExpr(AssignExpr { syntax: node }),
            SyntaxKind::PAREN_EXPR => Expr::ParenExpr(ParenExpr { syntax: node }),
            SyntaxKind::SEQUENCE_EXPR => Expr::SequenceExpr(SequenceExpr { syntax: node }),
            SyntaxKind::TEMP_BINDING_EXPR => Expr::TempBindingExpr(TempBindingExpr { syntax: node }),
            _ => return None,
        };
        Some(expr)
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Expr::Literal(n) => &n.syntax,
            Expr::TemplateLiteral(n) => &n.syntax,
            Expr::NameRef(n) => &n.syntax,
            Expr::ThisExpr(n) => &n.syntax,
            Expr::ArrayExpr(n) => &n.syntax,
            Expr::ObjectExpr(n) => &n.syntax,
            Expr::FieldExpr(n) => &n.syntax,
            Expr::IndexExpr(n) => &n.syntax,
            Expr::CallExpr(n) => &n.syntax,
            Expr::NewExpr(n) => &n.syntax,
            Expr::ArrowFn(n) => &n.syntax,
            Expr::FnExpr(n) => &n.syntax,
            Expr::PrefixExpr(n) => &n.syntax,
            Expr::PostfixExpr(n) => &n.syntax,
            Expr::BinaryExpr(n) => &n.syntax,
            Expr::ConditionalExpr(n) => &n.syntax,
            Expr::AssignExpr(n) => &n.syntax,
            Expr::ParenExpr(n) => &n.syntax,
            Expr::SequenceExpr(n) => &n.syntax,
            Expr::TempBindingExpr(n) => &n.syntax,
        }
    }

    pub fn span(&self) -> tbind_common::span::Span {
        crate::ast::node_span(self.syntax())
    }
}

/// An element of an array literal or argument list.
#[derive(Debug, Clone)]
pub enum Element {
    Expr(Expr),
    Spread(Spread),
}

fn elements(node: &SyntaxNode) -> impl Iterator<Item = Element> {
    node.children().filter_map(|child| match Spread::cast(child.clone()) {
        Some(spread) => Some(Element::Spread(spread)),
        None => Expr::cast(child).map(Element::Expr),
    })
}

/// The first non-comment token, used for operator and literal lookups.
fn first_token(node: &SyntaxNode) -> Option<SyntaxToken> {
    direct_tokens(node).next()
}

// ── Atoms ──────────────────────────────────────────────────────────────

ast_node!(Literal, LITERAL);

impl Literal {
    /// NUMBER, STRING, TRUE_KW, FALSE_KW or NULL_KW.
    pub fn token(&self) -> Option<SyntaxToken> {
        first_token(&self.syntax)
    }
}

ast_node!(NameRef, NAME_REF);

impl NameRef {
    pub fn ident(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    pub fn text(&self) -> Option<String> {
        self.ident().map(|t| t.text().to_string())
    }
}

ast_node!(ThisExpr, THIS_EXPR);

ast_node!(TemplateLiteral, TEMPLATE_LITERAL);

/// A piece of a template literal.
#[derive(Debug, Clone)]
pub enum TemplatePart {
    /// Raw text between backticks and interpolations, escapes untouched.
    Text(SyntaxToken),
    Interpolation(Interpolation),
}

impl TemplateLiteral {
    pub fn parts(&self) -> Vec<TemplatePart> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| match it {
                rowan::NodeOrToken::Token(t) if t.kind() == SyntaxKind::TEMPLATE_CONTENT => {
                    Some(TemplatePart::Text(t))
                }
                rowan::NodeOrToken::Node(n) => Interpolation::cast(n).map(TemplatePart::Interpolation),
                _ => None,
            })
            .collect()
    }
}

ast_node!(Interpolation, INTERPOLATION);

impl Interpolation {
    pub fn expr(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

// ── Literals with children ─────────────────────────────────────────────

ast_node!(ArrayExpr, ARRAY_EXPR);

impl ArrayExpr {
    pub fn elements(&self) -> impl Iterator<Item = Element> {
        elements(&self.syntax)
    }
}

ast_node!(Spread, SPREAD);

impl Spread {
    pub fn expr(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

ast_node!(ObjectExpr, OBJECT_EXPR);

/// A member of an object literal.
#[derive(Debug, Clone)]
pub enum Member {
    Property(Property),
    Shorthand(ShorthandProperty),
    Spread(Spread),
}

impl ObjectExpr {
    pub fn members(&self) -> impl Iterator<Item = Member> {
        self.syntax.children().filter_map(|child| match child.kind() {
            SyntaxKind::PROPERTY => Some(Member::Property(Property { syntax: child })),
            SyntaxKind::SHORTHAND_PROPERTY => {
                Some(Member::Shorthand(ShorthandProperty { syntax: child }))
            }
            SyntaxKind::SPREAD => Some(Member::Spread(Spread { syntax: child })),
            _ => None,
        })
    }
}

ast_node!(Property, PROPERTY);

impl Property {
    /// Key token for `name: v`, `"str": v` and `1: v`. `None` for computed keys.
    pub fn key_token(&self) -> Option<SyntaxToken> {
        if self.computed_key().is_some() {
            return None;
        }
        first_token(&self.syntax)
    }

    pub fn computed_key(&self) -> Option<ComputedKey> {
        child_node(&self.syntax)
    }

    pub fn value(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

ast_node!(ComputedKey, COMPUTED_KEY);

impl ComputedKey {
    pub fn expr(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

ast_node!(ShorthandProperty, SHORTHAND_PROPERTY);

impl ShorthandProperty {
    pub fn ident(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }
}

// ── Access and calls ───────────────────────────────────────────────────

ast_node!(FieldExpr, FIELD_EXPR);

impl FieldExpr {
    pub fn object(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    pub fn is_optional(&self) -> bool {
        child_token(&self.syntax, SyntaxKind::QUESTION_DOT).is_some()
    }

    /// The property name; keywords are allowed (`a.new`).
    pub fn name(&self) -> Option<SyntaxToken> {
        direct_tokens(&self.syntax)
            .find(|t| t.kind() == SyntaxKind::IDENT || t.kind().is_keyword())
    }
}

ast_node!(IndexExpr, INDEX_EXPR);

impl IndexExpr {
    pub fn object(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    pub fn index(&self) -> Option<Expr> {
        self.syntax.children().filter_map(Expr::cast).nth(1)
    }

    pub fn is_optional(&self) -> bool {
        child_token(&self.syntax, SyntaxKind::QUESTION_DOT).is_some()
    }
}

ast_node!(CallExpr, CALL_EXPR);

impl CallExpr {
    pub fn callee(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    pub fn arg_list(&self) -> Option<ArgList> {
        child_node(&self.syntax)
    }

    pub fn is_optional(&self) -> bool {
        child_token(&self.syntax, SyntaxKind::QUESTION_DOT).is_some()
    }
}

ast_node!(ArgList, ARG_LIST);

impl ArgList {
    pub fn args(&self) -> impl Iterator<Item = Element> {
        elements(&self.syntax)
    }
}

ast_node!(NewExpr, NEW_EXPR);

impl NewExpr {
    pub fn callee(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    pub fn arg_list(&self) -> Option<ArgList> {
        child_node(&self.syntax)
    }
}

// ── Functions ──────────────────────────────────────────────────────────

ast_node!(ArrowFn, ARROW_FN);

/// Body of an arrow function.
#[derive(Debug, Clone)]
pub enum ArrowBody {
    Block(Block),
    Expr(Expr),
}

impl ArrowFn {
    pub fn is_async(&self) -> bool {
        child_token(&self.syntax, SyntaxKind::ASYNC_KW).is_some()
    }

    pub fn param_list(&self) -> Option<ParamList> {
        child_node(&self.syntax)
    }

    pub fn body(&self) -> Option<ArrowBody> {
        if let Some(block) = child_node::<Block>(&self.syntax) {
            return Some(ArrowBody::Block(block));
        }
        self.syntax.children().find_map(Expr::cast).map(ArrowBody::Expr)
    }
}

ast_node!(FnExpr, FN_EXPR);

impl FnExpr {
    pub fn is_async(&self) -> bool {
        child_token(&self.syntax, SyntaxKind::ASYNC_KW).is_some()
    }

    pub fn name(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    pub fn param_list(&self) -> Option<ParamList> {
        child_node(&self.syntax)
    }

    pub fn body(&self) -> Option<Block> {
        child_node(&self.syntax)
    }
}

// ── Operators ──────────────────────────────────────────────────────────

ast_node!(PrefixExpr, PREFIX_EXPR);

impl PrefixExpr {
    pub fn op(&self) -> Option<SyntaxToken> {
        first_token(&self.syntax)
    }

    pub fn operand(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

ast_node!(PostfixExpr, POSTFIX_EXPR);

impl PostfixExpr {
    pub fn operand(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    pub fn op(&self) -> Option<SyntaxToken> {
        direct_tokens(&self.syntax).last()
    }
}

ast_node!(BinaryExpr, BINARY_EXPR);

impl BinaryExpr {
    pub fn lhs(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    pub fn rhs(&self) -> Option<Expr> {
        self.syntax.children().filter_map(Expr::cast).nth(1)
    }

    pub fn op(&self) -> Option<SyntaxToken> {
        first_token(&self.syntax)
    }
}

ast_node!(AssignExpr, ASSIGN_EXPR);

impl AssignExpr {
    pub fn target(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    pub fn value(&self) -> Option<Expr> {
        self.syntax.children().filter_map(Expr::cast).nth(1)
    }

    pub fn op(&self) -> Option<SyntaxToken> {
        first_token(&self.syntax)
    }
}

ast_node!(ConditionalExpr, CONDITIONAL_EXPR);

impl ConditionalExpr {
    pub fn condition(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    pub fn then_expr(&self) -> Option<Expr> {
        self.syntax.children().filter_map(Expr::cast).nth(1)
    }

    pub fn else_expr(&self) -> Option<Expr> {
        self.syntax.children().filter_map(Expr::cast).nth(2)
    }
}

ast_node!(ParenExpr, PAREN_EXPR);

impl ParenExpr {
    pub fn expr(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

ast_node!(SequenceExpr, SEQUENCE_EXPR);

impl SequenceExpr {
    pub fn exprs(&self) -> impl Iterator<Item = Expr> {
        self.syntax.children().filter_map(Expr::cast)
    }
}

// ── Temporary bindings ─────────────────────────────────────────────────

/// Shared view of the two temporary-binding forms.
pub trait TempBinding: AstNode {
    /// `var`, `let` or `const`.
    fn keyword(&self) -> Option<SyntaxToken> {
        first_token(self.syntax())
    }

    fn marker(&self) -> Option<BindingMarker> {
        child_node(self.syntax())
    }

    fn eq_token(&self) -> Option<SyntaxToken> {
        child_token(self.syntax(), SyntaxKind::EQ)
    }

    fn step_list(&self) -> Option<StepList> {
        child_node(self.syntax())
    }
}

ast_node!(TempBindingExpr, TEMP_BINDING_EXPR);

impl TempBinding for TempBindingExpr {}

ast_node!(BindingMarker, BINDING_MARKER);

impl BindingMarker {
    pub fn l_paren(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::L_PAREN)
    }

    /// Whether the marker ends with its matching `)`.
    pub fn is_closed(&self) -> bool {
        let mut depth = 0i32;
        for token in direct_tokens(&self.syntax) {
            match token.kind() {
                SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET | SyntaxKind::L_BRACE => depth += 1,
                SyntaxKind::R_PAREN | SyntaxKind::R_BRACKET | SyntaxKind::R_BRACE => {
                    depth -= 1;
                    if depth == 0 {
                        return true;
                    }
                }
                _ => {}
            }
        }
        false
    }

    /// Tokens between the parentheses.
    pub fn inner_tokens(&self) -> Vec<SyntaxToken> {
        let mut tokens: Vec<_> = direct_tokens(&self.syntax).skip(1).collect();
        if self.is_closed() {
            tokens.pop();
        }
        tokens
    }
}

ast_node!(StepList, STEP_LIST);

impl StepList {
    /// Step expressions in order. Empty slots are skipped; the engine's
    /// pipeline splitter sees them through the raw children.
    pub fn exprs(&self) -> impl Iterator<Item = Expr> {
        self.syntax.children().filter_map(Expr::cast)
    }
}
