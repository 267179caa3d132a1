//! Typed AST nodes for statements and function pieces.

use crate::ast::{
    ast_node, child_node, child_nodes, child_token, direct_tokens, AstNode, Expr, TempBinding,
};
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

/// Any statement node.
#[derive(Debug, Clone)]
pub enum Stmt {
    VarDecl(VarDecl),
    FnDecl(FnDecl),
    Block(Block),
    ReturnStmt(ReturnStmt),
    IfStmt(IfStmt),
    WhileStmt(WhileStmt),
    ForStmt(ForStmt),
    ForOfStmt(ForOfStmt),
    BreakStmt(BreakStmt),
    ContinueStmt(ContinueStmt),
    ThrowStmt(ThrowStmt),
    ExprStmt(ExprStmt),
    EmptyStmt(EmptyStmt),
    TempBindingDecl(TempBindingDecl),
}

impl Stmt {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        let stmt = match node.kind() {
            SyntaxKind::VAR_DECL => Stmt::VarDecl(VarDecl { syntax: node }),
            SyntaxKind::FN_DECL => Stmt::FnDecl(FnDecl { syntax: node }),
            SyntaxKind::BLOCK => Stmt::Block(Block { syntax: node }),
            SyntaxKind::RETURN_STMT => Stmt::ReturnStmt(ReturnStmt { syntax: node }),
            SyntaxKind::IF_STMT => Stmt::IfStmt(IfStmt { syntax: node }),
            SyntaxKind::WHILE_STMT => Stmt::WhileStmt(WhileStmt { syntax: node }),
            SyntaxKind::FOR_STMT => Stmt::ForStmt(ForStmt { syntax: node }),
            SyntaxKind::FOR_OF_STMT => Stmt::ForOfStmt(ForOfStmt { syntax: node }),
            SyntaxKind::BREAK_STMT => Stmt::BreakStmt(BreakStmt { syntax: node }),
            SyntaxKind::CONTINUE_STMT => Stmt::ContinueStmt(ContinueStmt { syntax: node }),
            SyntaxKind::THROW_STMT => Stmt::ThrowStmt(ThrowStmt { syntax: node }),
            SyntaxKind::EXPR_STMT => Stmt::ExprStmt(ExprStmt { syntax: node }),
            SyntaxKind::EMPTY_STMT => Stmt::EmptyStmt(EmptyStmt { syntax: node }),
            SyntaxKind::TEMP_BINDING_DECL => Stmt::TempBindingDecl(TempBindingDecl { syntax: node }),
            _ => return None,
        };
        Some(stmt)
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Stmt::VarDecl(n) => &n.syntax,
            Stmt::FnDecl(n) => &n.syntax,
            Stmt::Block(n) => &n.syntax,
            Stmt::ReturnStmt(n) => &n.syntax,
            Stmt::IfStmt(n) => &n.syntax,
            Stmt::WhileStmt(n) => &n.syntax,
            Stmt::ForStmt(n) => &n.syntax,
            Stmt::ForOfStmt(n) => &n.syntax,
            Stmt::BreakStmt(n) => &n.syntax,
            Stmt::ContinueStmt(n) => &n.syntax,
            Stmt::ThrowStmt(n) => &n.syntax,
            Stmt::ExprStmt(n) => &n.syntax,
            Stmt::EmptyStmt(n) => &n.syntax,
            Stmt::TempBindingDecl(n) => &n.syntax,
        }
    }
}

fn expr_child(node: &SyntaxNode) -> Option<Expr> {
    node.children().find_map(Expr::cast)
}

fn stmt_child(node: &SyntaxNode) -> Option<Stmt> {
    node.children().find_map(Stmt::cast)
}

// ── Declarations ───────────────────────────────────────────────────────

ast_node!(VarDecl, VAR_DECL);

impl VarDecl {
    pub fn keyword(&self) -> Option<SyntaxToken> {
        direct_tokens(&self.syntax).next()
    }

    pub fn declarators(&self) -> impl Iterator<Item = Declarator> + '_ {
        child_nodes(&self.syntax)
    }
}

ast_node!(Declarator, DECLARATOR);

impl Declarator {
    pub fn name(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    pub fn init(&self) -> Option<Expr> {
        expr_child(&self.syntax)
    }
}

ast_node!(TempBindingDecl, TEMP_BINDING_DECL);

impl TempBinding for TempBindingDecl {}

impl TempBindingDecl {
    /// The declared result name after the marker.
    pub fn name(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }
}

ast_node!(FnDecl, FN_DECL);

impl FnDecl {
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

ast_node!(ParamList, PARAM_LIST);

impl ParamList {
    pub fn params(&self) -> impl Iterator<Item = Param> + '_ {
        child_nodes(&self.syntax)
    }
}

ast_node!(Param, PARAM);

impl Param {
    pub fn name(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    pub fn is_rest(&self) -> bool {
        child_token(&self.syntax, SyntaxKind::DOT_DOT_DOT).is_some()
    }
}

// ── Control flow ───────────────────────────────────────────────────────

ast_node!(Block, BLOCK);

impl Block {
    pub fn stmts(&self) -> impl Iterator<Item = Stmt> {
        self.syntax.children().filter_map(Stmt::cast)
    }
}

ast_node!(ReturnStmt, RETURN_STMT);

impl ReturnStmt {
    pub fn expr(&self) -> Option<Expr> {
        expr_child(&self.syntax)
    }
}

ast_node!(IfStmt, IF_STMT);

impl IfStmt {
    pub fn condition(&self) -> Option<Expr> {
        expr_child(&self.syntax)
    }

    pub fn then_branch(&self) -> Option<Stmt> {
        stmt_child(&self.syntax)
    }

    pub fn else_branch(&self) -> Option<Stmt> {
        let branch = self
            .syntax
            .children()
            .find(|n| n.kind() == SyntaxKind::ELSE_BRANCH)?;
        stmt_child(&branch)
    }
}

ast_node!(WhileStmt, WHILE_STMT);

impl WhileStmt {
    pub fn condition(&self) -> Option<Expr> {
        expr_child(&self.syntax)
    }

    pub fn body(&self) -> Option<Stmt> {
        stmt_child(&self.syntax)
    }
}

ast_node!(ForStmt, FOR_STMT);

impl ForStmt {
    /// The init, test and update clauses, in order.
    pub fn clauses(&self) -> Vec<ForClause> {
        child_nodes(&self.syntax).collect()
    }

    pub fn body(&self) -> Option<Stmt> {
        stmt_child(&self.syntax)
    }
}

ast_node!(ForClause, FOR_CLAUSE);

impl ForClause {
    pub fn var_decl(&self) -> Option<VarDecl> {
        child_node(&self.syntax)
    }

    pub fn expr(&self) -> Option<Expr> {
        expr_child(&self.syntax)
    }
}

ast_node!(ForOfStmt, FOR_OF_STMT);

impl ForOfStmt {
    pub fn keyword(&self) -> Option<SyntaxToken> {
        direct_tokens(&self.syntax).find(|t| t.kind().is_decl_keyword())
    }

    /// The loop variable (the first identifier; the second is `of`).
    pub fn name(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    pub fn iterable(&self) -> Option<Expr> {
        expr_child(&self.syntax)
    }

    pub fn body(&self) -> Option<Stmt> {
        stmt_child(&self.syntax)
    }
}

ast_node!(BreakStmt, BREAK_STMT);

ast_node!(ContinueStmt, CONTINUE_STMT);

ast_node!(ThrowStmt, THROW_STMT);

impl ThrowStmt {
    pub fn expr(&self) -> Option<Expr> {
        expr_child(&self.syntax)
    }
}

ast_node!(ExprStmt, EXPR_STMT);

impl ExprStmt {
    pub fn expr(&self) -> Option<Expr> {
        expr_child(&self.syntax)
    }
}

ast_node!(EmptyStmt, EMPTY_STMT);
