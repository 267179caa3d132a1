//! CST to HIR.
//!
//! Walks the typed AST once. Temporary-binding nodes go through the
//! recognizer and the pipeline splitter as they are met, so constructs are
//! registered in source pre-order: an outer construct gets its id before
//! any construct inside its steps. Pieces missing from recovered input
//! become `Missing` expressions or empty statements; the parse errors
//! already describe them.

use tbind_common::span::Span;
use tbind_hir::{
    self as hir, AssignOp, BinaryOp, ConstructForm, ConstructId, DeclKind, Element, ExprKind,
    FnBody, ForInit, Function, Ident, Param, Prop, PropKey, StmtKind, TemplatePart, UnaryOp,
    UpdateOp,
};
use tbind_parser::ast::{self, token_span, AstNode, TempBinding};
use tbind_parser::{SyntaxKind, SyntaxToken};

use crate::construct::{ConstructState, Ledger};
use crate::diagnostics::Diagnostic;
use crate::pipeline::split_steps;
use crate::recognize::recognize;

pub(crate) struct Builder<'a> {
    source: &'a str,
    ledger: &'a mut Ledger,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> Builder<'a> {
    pub(crate) fn new(
        source: &'a str,
        ledger: &'a mut Ledger,
        diagnostics: &'a mut Vec<Diagnostic>,
    ) -> Self {
        Self {
            source,
            ledger,
            diagnostics,
        }
    }

    pub(crate) fn program(&mut self, file: &ast::SourceFile) -> hir::Program {
        let body = file.stmts().map(|s| self.stmt(&s)).collect();
        hir::Program {
            body,
            span: Span::new(0, self.source.len() as u32),
        }
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn stmt(&mut self, stmt: &ast::Stmt) -> hir::Stmt {
        let span = ast::node_span(stmt.syntax());
        let kind = match stmt {
            ast::Stmt::VarDecl(decl) => StmtKind::VarDecl(self.var_decl(decl)),
            ast::Stmt::FnDecl(func) => StmtKind::FnDecl(Function {
                name: func.name().map(|t| ident(&t)),
                params: self.params(func.param_list()),
                body: FnBody::Block(self.opt_block(func.body())),
                is_async: func.is_async(),
                is_arrow: false,
            }),
            ast::Stmt::Block(block) => StmtKind::Block(self.block(block)),
            ast::Stmt::ReturnStmt(ret) => StmtKind::Return(ret.expr().map(|e| self.expr(&e))),
            ast::Stmt::IfStmt(stmt) => StmtKind::If {
                cond: self.opt_expr(stmt.condition(), span),
                then_branch: Box::new(self.opt_stmt(stmt.then_branch(), span)),
                else_branch: stmt.else_branch().map(|s| Box::new(self.stmt(&s))),
            },
            ast::Stmt::WhileStmt(stmt) => StmtKind::While {
                cond: self.opt_expr(stmt.condition(), span),
                body: Box::new(self.opt_stmt(stmt.body(), span)),
            },
            ast::Stmt::ForStmt(stmt) => {
                let clauses = stmt.clauses();
                let init = clauses.first().and_then(|clause| {
                    if let Some(decl) = clause.var_decl() {
                        Some(ForInit::VarDecl(self.var_decl(&decl)))
                    } else {
                        clause.expr().map(|e| ForInit::Expr(self.expr(&e)))
                    }
                });
                let test = clauses.get(1).and_then(|c| c.expr()).map(|e| self.expr(&e));
                let update = clauses.get(2).and_then(|c| c.expr()).map(|e| self.expr(&e));
                StmtKind::For {
                    init,
                    test,
                    update,
                    body: Box::new(self.opt_stmt(stmt.body(), span)),
                }
            }
            ast::Stmt::ForOfStmt(stmt) => StmtKind::ForOf {
                kind: decl_kind(stmt.keyword()),
                name: stmt
                    .name()
                    .map(|t| ident(&t))
                    .unwrap_or_else(|| Ident::new("", span)),
                iterable: self.opt_expr(stmt.iterable(), span),
                body: Box::new(self.opt_stmt(stmt.body(), span)),
            },
            ast::Stmt::BreakStmt(_) => StmtKind::Break,
            ast::Stmt::ContinueStmt(_) => StmtKind::Continue,
            ast::Stmt::ThrowStmt(stmt) => StmtKind::Throw(self.opt_expr(stmt.expr(), span)),
            ast::Stmt::ExprStmt(stmt) => StmtKind::Expr(self.opt_expr(stmt.expr(), span)),
            ast::Stmt::EmptyStmt(_) => StmtKind::Empty,
            ast::Stmt::TempBindingDecl(decl) => {
                match self.temp_binding(decl, ConstructForm::Declaration, decl.name()) {
                    Ok(binding) => StmtKind::TempBinding(Box::new(binding)),
                    Err((construct, source)) => StmtKind::Rejected { construct, source },
                }
            }
        };
        hir::Stmt::new(kind, span)
    }

    fn opt_stmt(&mut self, stmt: Option<ast::Stmt>, fallback: Span) -> hir::Stmt {
        match stmt {
            Some(s) => self.stmt(&s),
            None => hir::Stmt::new(StmtKind::Empty, Span::point(fallback.end)),
        }
    }

    fn block(&mut self, block: &ast::Block) -> Vec<hir::Stmt> {
        block.stmts().map(|s| self.stmt(&s)).collect()
    }

    fn opt_block(&mut self, block: Option<ast::Block>) -> Vec<hir::Stmt> {
        block.map(|b| self.block(&b)).unwrap_or_default()
    }

    fn var_decl(&mut self, decl: &ast::VarDecl) -> hir::VarDecl {
        let declarators = decl
            .declarators()
            .filter_map(|d| {
                let name = d.name()?;
                Some(hir::Declarator {
                    name: ident(&name),
                    init: d.init().map(|e| self.expr(&e)),
                })
            })
            .collect();
        hir::VarDecl {
            kind: decl_kind(decl.keyword()),
            declarators,
        }
    }

    fn params(&mut self, list: Option<ast::ParamList>) -> Vec<Param> {
        let Some(list) = list else {
            return Vec::new();
        };
        list.params()
            .filter_map(|p| {
                Some(Param {
                    name: ident(&p.name()?),
                    rest: p.is_rest(),
                })
            })
            .collect()
    }

    // ── Expressions ────────────────────────────────────────────────────

    fn opt_expr(&mut self, expr: Option<ast::Expr>, fallback: Span) -> hir::Expr {
        match expr {
            Some(e) => self.expr(&e),
            None => hir::Expr::new(ExprKind::Missing, Span::point(fallback.end)),
        }
    }

    fn boxed(&mut self, expr: Option<ast::Expr>, fallback: Span) -> Box<hir::Expr> {
        Box::new(self.opt_expr(expr, fallback))
    }

    fn expr(&mut self, expr: &ast::Expr) -> hir::Expr {
        let span = expr.span();
        let kind = match expr {
            ast::Expr::Literal(lit) => literal(lit.token()),
            ast::Expr::TemplateLiteral(tpl) => ExprKind::Template(
                tpl.parts()
                    .into_iter()
                    .map(|part| match part {
                        ast::TemplatePart::Text(token) => TemplatePart::Text(token.text().to_string()),
                        ast::TemplatePart::Interpolation(interp) => {
                            let interp_span = interp.span();
                            TemplatePart::Expr(self.opt_expr(interp.expr(), interp_span))
                        }
                    })
                    .collect(),
            ),
            ast::Expr::NameRef(name) => match name.ident() {
                Some(token) => ExprKind::Ident(ident(&token)),
                None => ExprKind::Missing,
            },
            ast::Expr::ThisExpr(_) => ExprKind::This,
            ast::Expr::ArrayExpr(array) => ExprKind::Array(self.elements(array.elements())),
            ast::Expr::ObjectExpr(object) => {
                let props = object.members().map(|m| self.member(m, span)).collect();
                ExprKind::Object(props)
            }
            ast::Expr::FieldExpr(field) => ExprKind::Member {
                object: self.boxed(field.object(), span),
                property: field.name().map(|t| t.text().to_string()).unwrap_or_default(),
                optional: field.is_optional(),
            },
            ast::Expr::IndexExpr(index) => ExprKind::Index {
                object: self.boxed(index.object(), span),
                index: self.boxed(index.index(), span),
                optional: index.is_optional(),
            },
            ast::Expr::CallExpr(call) => ExprKind::Call {
                callee: self.boxed(call.callee(), span),
                args: call
                    .arg_list()
                    .map(|list| self.elements(list.args()))
                    .unwrap_or_default(),
                optional: call.is_optional(),
            },
            ast::Expr::NewExpr(new) => ExprKind::New {
                callee: self.boxed(new.callee(), span),
                args: new.arg_list().map(|list| self.elements(list.args())),
            },
            ast::Expr::ArrowFn(arrow) => {
                let body = match arrow.body() {
                    Some(ast::ArrowBody::Block(block)) => FnBody::Block(self.block(&block)),
                    Some(ast::ArrowBody::Expr(e)) => FnBody::Expr(Box::new(self.expr(&e))),
                    None => FnBody::Block(Vec::new()),
                };
                ExprKind::Function(Box::new(Function {
                    name: None,
                    params: self.params(arrow.param_list()),
                    body,
                    is_async: arrow.is_async(),
                    is_arrow: true,
                }))
            }
            ast::Expr::FnExpr(func) => ExprKind::Function(Box::new(Function {
                name: func.name().map(|t| ident(&t)),
                params: self.params(func.param_list()),
                body: FnBody::Block(self.opt_block(func.body())),
                is_async: func.is_async(),
                is_arrow: false,
            })),
            ast::Expr::PrefixExpr(prefix) => {
                let op = prefix.op();
                let op = op.as_ref().map(|t| t.text()).unwrap_or_default();
                let arg = self.boxed(prefix.operand(), span);
                if let Some(op) = UpdateOp::from_token(op) {
                    ExprKind::Update {
                        op,
                        prefix: true,
                        arg,
                    }
                } else if let Some(op) = UnaryOp::from_token(op) {
                    ExprKind::Unary { op, arg }
                } else {
                    ExprKind::Missing
                }
            }
            ast::Expr::PostfixExpr(postfix) => {
                match postfix.op().and_then(|t| UpdateOp::from_token(t.text())) {
                    Some(op) => ExprKind::Update {
                        op,
                        prefix: false,
                        arg: self.boxed(postfix.operand(), span),
                    },
                    None => ExprKind::Missing,
                }
            }
            ast::Expr::BinaryExpr(binary) => {
                match binary.op().and_then(|t| BinaryOp::from_token(t.text())) {
                    Some(op) => ExprKind::Binary {
                        op,
                        lhs: self.boxed(binary.lhs(), span),
                        rhs: self.boxed(binary.rhs(), span),
                    },
                    None => ExprKind::Missing,
                }
            }
            ast::Expr::ConditionalExpr(cond) => ExprKind::Conditional {
                test: self.boxed(cond.condition(), span),
                consequent: self.boxed(cond.then_expr(), span),
                alternate: self.boxed(cond.else_expr(), span),
            },
            ast::Expr::AssignExpr(assign) => {
                match assign.op().and_then(|t| AssignOp::from_token(t.text())) {
                    Some(op) => ExprKind::Assign {
                        op,
                        target: self.boxed(assign.target(), span),
                        value: self.boxed(assign.value(), span),
                    },
                    None => ExprKind::Missing,
                }
            }
            // Grouping is recomputed by the emitter from precedence.
            ast::Expr::ParenExpr(paren) => return self.opt_expr(paren.expr(), span),
            ast::Expr::SequenceExpr(seq) => {
                ExprKind::Sequence(seq.exprs().map(|e| self.expr(&e)).collect())
            }
            ast::Expr::TempBindingExpr(node) => {
                match self.temp_binding(node, ConstructForm::Expression, None) {
                    Ok(binding) => ExprKind::TempBinding(Box::new(binding)),
                    Err((construct, source)) => ExprKind::Rejected { construct, source },
                }
            }
        };
        hir::Expr::new(kind, span)
    }

    fn elements(&mut self, elements: impl Iterator<Item = ast::Element>) -> Vec<Element> {
        elements
            .map(|el| match el {
                ast::Element::Expr(e) => Element::Expr(self.expr(&e)),
                ast::Element::Spread(spread) => {
                    let span = spread.span();
                    Element::Spread(self.opt_expr(spread.expr(), span))
                }
            })
            .collect()
    }

    fn member(&mut self, member: ast::Member, object_span: Span) -> Prop {
        match member {
            ast::Member::Property(prop) => {
                let span = prop.span();
                let key = match prop.computed_key() {
                    Some(key) => PropKey::Computed(self.boxed(key.expr(), span)),
                    None => prop_key(prop.key_token()),
                };
                Prop::KeyValue {
                    key,
                    value: self.opt_expr(prop.value(), span),
                }
            }
            ast::Member::Shorthand(short) => match short.ident() {
                Some(token) => Prop::Shorthand(ident(&token)),
                None => Prop::Spread(hir::Expr::new(ExprKind::Missing, object_span)),
            },
            ast::Member::Spread(spread) => {
                let span = spread.span();
                Prop::Spread(self.opt_expr(spread.expr(), span))
            }
        }
    }

    // ── Temporary bindings ─────────────────────────────────────────────

    /// Register, recognize and split one construct, then build its steps.
    /// A fatal shape error yields the construct id and original text.
    fn temp_binding<T: TempBinding>(
        &mut self,
        node: &T,
        form: ConstructForm,
        result_name: Option<SyntaxToken>,
    ) -> Result<hir::TempBinding, (ConstructId, String)> {
        let span = node.span();
        let id = self.ledger.matched(form, span);
        let source = self.source.get(span.range()).unwrap_or_default().to_string();

        let recognized = match recognize(node, result_name) {
            Ok(r) => r,
            Err(diag) => return Err(self.reject(id, diag, source)),
        };
        self.ledger.set_binding(id, &recognized.binding.name);

        let steps = match split_steps(recognized.step_list.as_ref(), recognized.eq_span) {
            Ok(steps) => steps,
            Err(diag) => return Err(self.reject(id, diag, source)),
        };
        self.ledger.advance(id, ConstructState::Parsed);

        let steps = steps.iter().map(|s| self.expr(s)).collect();
        Ok(hir::TempBinding {
            id,
            form,
            qualifier: recognized.qualifier,
            binding: recognized.binding,
            result_name: recognized.result_name,
            steps,
            source,
        })
    }

    fn reject(&mut self, id: ConstructId, diag: Diagnostic, source: String) -> (ConstructId, String) {
        self.diagnostics.push(diag.for_construct(id));
        self.ledger.advance(id, ConstructState::Rejected);
        (id, source)
    }
}

fn ident(token: &SyntaxToken) -> Ident {
    Ident::new(token.text(), token_span(token))
}

fn decl_kind(keyword: Option<SyntaxToken>) -> DeclKind {
    keyword
        .and_then(|k| DeclKind::from_keyword(k.text()))
        .unwrap_or(DeclKind::Let)
}

fn literal(token: Option<SyntaxToken>) -> ExprKind {
    let Some(token) = token else {
        return ExprKind::Missing;
    };
    match token.kind() {
        SyntaxKind::NUMBER => ExprKind::Number(token.text().to_string()),
        SyntaxKind::STRING => ExprKind::Str(token.text().to_string()),
        SyntaxKind::TRUE_KW => ExprKind::Bool(true),
        SyntaxKind::FALSE_KW => ExprKind::Bool(false),
        SyntaxKind::NULL_KW => ExprKind::Null,
        _ => ExprKind::Missing,
    }
}

fn prop_key(token: Option<SyntaxToken>) -> PropKey {
    match token {
        Some(t) if t.kind() == SyntaxKind::STRING => PropKey::Str(t.text().to_string()),
        Some(t) if t.kind() == SyntaxKind::NUMBER => PropKey::Number(t.text().to_string()),
        Some(t) => PropKey::Ident(t.text().to_string()),
        None => PropKey::Ident(String::new()),
    }
}
