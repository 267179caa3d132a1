//! HIR to format IR.
//!
//! Expressions are printed by precedence: each child states the minimum
//! level it may have, and a child below it gets parentheses. The levels
//! mirror the parser's binding powers, so emitted code parses back to the
//! same tree.

use tbind_common::span::Span;
use tbind_hir::{
    BinaryOp, ConstructId, Element, Expr, ExprKind, FnBody, ForInit, Function, Program, Prop,
    PropKey, Stmt, StmtKind, TempBinding, TemplatePart, UnaryOp, VarDecl,
};

use crate::ir::{concat, delimited, hardline, indent, join, text, FormatIR};

const SEQ: u8 = 0;
const ASSIGN: u8 = 1;
const COND: u8 = 2;
const UNARY: u8 = 11;
const POSTFIX: u8 = 12;
const CALL: u8 = 13;
const PRIMARY: u8 = 14;

fn binary_prec(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Nullish => 3,
        BinaryOp::Or => 4,
        BinaryOp::And => 5,
        BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::StrictEq | BinaryOp::StrictNotEq => 6,
        BinaryOp::Lt
        | BinaryOp::Gt
        | BinaryOp::LtEq
        | BinaryOp::GtEq
        | BinaryOp::InstanceOf
        | BinaryOp::In => 7,
        BinaryOp::Add | BinaryOp::Sub => 8,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 9,
        BinaryOp::Exp => 10,
    }
}

fn prec(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::Sequence(_) | ExprKind::TempBinding(_) | ExprKind::Rejected { .. } => SEQ,
        ExprKind::Assign { .. } => ASSIGN,
        ExprKind::Function(f) if f.is_arrow => ASSIGN,
        ExprKind::Conditional { .. } => COND,
        ExprKind::Binary { op, .. } => binary_prec(*op),
        ExprKind::Unary { .. } | ExprKind::Missing => UNARY,
        ExprKind::Update { prefix: true, .. } => UNARY,
        ExprKind::Update { prefix: false, .. } => POSTFIX,
        ExprKind::New { args: None, .. } => POSTFIX,
        ExprKind::New { .. } | ExprKind::Member { .. } | ExprKind::Index { .. } => CALL,
        ExprKind::Call { .. } => CALL,
        ExprKind::Lowered { expr, .. } => prec(expr),
        ExprKind::Number(_)
        | ExprKind::Str(_)
        | ExprKind::Bool(_)
        | ExprKind::Null
        | ExprKind::Template(_)
        | ExprKind::Ident(_)
        | ExprKind::This
        | ExprKind::Array(_)
        | ExprKind::Object(_)
        | ExprKind::Function(_) => PRIMARY,
    }
}

fn is_plain_function(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Function(f) => !f.is_arrow,
        ExprKind::Lowered { expr, .. } => is_plain_function(expr),
        _ => false,
    }
}

/// Whether `expr` would begin with `{` or `function`, which a statement
/// or a concise arrow body cannot start with.
fn starts_ambiguously(expr: &Expr) -> bool {
    let leftmost =
        |child: &Expr, required: u8| prec(child) >= required && starts_ambiguously(child);
    match &expr.kind {
        ExprKind::Object(_) => true,
        ExprKind::Function(f) => !f.is_arrow,
        ExprKind::Member { object, .. } | ExprKind::Index { object, .. } => {
            !is_plain_function(object) && leftmost(object, CALL)
        }
        ExprKind::Call { callee, .. } => !is_plain_function(callee) && leftmost(callee, CALL),
        ExprKind::Binary { op, lhs, .. } => leftmost(lhs, binary_prec(*op)),
        ExprKind::Conditional { test, .. } => leftmost(test, COND + 1),
        ExprKind::Assign { target, .. } => leftmost(target, CALL),
        ExprKind::Sequence(items) => items.first().is_some_and(|e| leftmost(e, ASSIGN)),
        ExprKind::Update {
            prefix: false, arg, ..
        } => leftmost(arg, CALL),
        ExprKind::Lowered { expr, .. } => starts_ambiguously(expr),
        _ => false,
    }
}

fn paren(ir: FormatIR) -> FormatIR {
    concat(vec![text("("), ir, text(")")])
}

fn braces(body: FormatIR, empty: bool) -> FormatIR {
    if empty {
        return text("{}");
    }
    concat(vec![text("{"), indent(concat(vec![hardline(), body])), hardline(), text("}")])
}

/// Walks one program. Each lowered node gets a pair of marks, `2k` before
/// and `2k + 1` after, for entry `k` of `lowered`.
#[derive(Default)]
pub(crate) struct Walker {
    pub(crate) lowered: Vec<(ConstructId, Span)>,
}

impl Walker {
    pub(crate) fn program(&mut self, program: &Program) -> FormatIR {
        self.stmt_list(&program.body)
    }

    fn marked(&mut self, construct: ConstructId, span: Span, inner: FormatIR) -> FormatIR {
        let k = self.lowered.len();
        self.lowered.push((construct, span));
        concat(vec![FormatIR::Mark(2 * k), inner, FormatIR::Mark(2 * k + 1)])
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn stmt_list(&mut self, stmts: &[Stmt]) -> FormatIR {
        let items = stmts.iter().map(|s| self.stmt(s)).collect();
        join(items, hardline)
    }

    fn block(&mut self, stmts: &[Stmt]) -> FormatIR {
        let body = self.stmt_list(stmts);
        braces(body, stmts.is_empty())
    }

    /// The body of `if`, `else`, `while` or `for`, with its leading gap.
    fn body(&mut self, stmt: &Stmt) -> FormatIR {
        match &stmt.kind {
            StmtKind::Block(stmts) => concat(vec![text(" "), self.block(stmts)]),
            _ => indent(concat(vec![hardline(), self.stmt(stmt)])),
        }
    }

    fn stmt(&mut self, stmt: &Stmt) -> FormatIR {
        match &stmt.kind {
            StmtKind::VarDecl(decl) => concat(vec![self.var_decl(decl), text(";")]),
            StmtKind::FnDecl(func) => self.function(func),
            StmtKind::Block(stmts) => self.block(stmts),
            StmtKind::Return(expr) => self.keyword_stmt("return", expr.as_ref()),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let mut parts = vec![
                    text("if ("),
                    self.expr(cond, SEQ),
                    text(")"),
                    self.body(then_branch),
                ];
                if let Some(alt) = else_branch {
                    parts.push(if matches!(then_branch.kind, StmtKind::Block(_)) {
                        text(" else")
                    } else {
                        concat(vec![hardline(), text("else")])
                    });
                    parts.push(match &alt.kind {
                        StmtKind::If { .. } => concat(vec![text(" "), self.stmt(alt)]),
                        _ => self.body(alt),
                    });
                }
                concat(parts)
            }
            StmtKind::While { cond, body } => concat(vec![
                text("while ("),
                self.expr(cond, SEQ),
                text(")"),
                self.body(body),
            ]),
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                let mut parts = vec![text("for (")];
                match init {
                    Some(ForInit::VarDecl(decl)) => parts.push(self.var_decl(decl)),
                    Some(ForInit::Expr(e)) => parts.push(self.expr(e, SEQ)),
                    None => {}
                }
                parts.push(text(";"));
                if let Some(e) = test {
                    parts.push(text(" "));
                    parts.push(self.expr(e, SEQ));
                }
                parts.push(text(";"));
                if let Some(e) = update {
                    parts.push(text(" "));
                    parts.push(self.expr(e, SEQ));
                }
                parts.push(text(")"));
                parts.push(self.body(body));
                concat(parts)
            }
            StmtKind::ForOf {
                kind,
                name,
                iterable,
                body,
            } => concat(vec![
                text(format!("for ({} {} of ", kind.as_str(), name.name)),
                self.expr(iterable, ASSIGN),
                text(")"),
                self.body(body),
            ]),
            StmtKind::Break => text("break;"),
            StmtKind::Continue => text("continue;"),
            StmtKind::Throw(expr) => self.keyword_stmt("throw", Some(expr)),
            StmtKind::Expr(expr) => {
                let ir = self.expr(expr, SEQ);
                let ir = if starts_ambiguously(expr) { paren(ir) } else { ir };
                concat(vec![ir, text(";")])
            }
            StmtKind::Empty => text(";"),
            StmtKind::TempBinding(tb) => concat(vec![self.temp_binding(tb), text(";")]),
            StmtKind::Lowered { construct, stmts } => {
                let inner = self.stmt_list(stmts);
                self.marked(*construct, stmt.span, inner)
            }
            StmtKind::Rejected { source, .. } => text(source.as_str()),
        }
    }

    fn keyword_stmt(&mut self, keyword: &str, expr: Option<&Expr>) -> FormatIR {
        match expr {
            Some(e) => concat(vec![text(format!("{keyword} ")), self.expr(e, SEQ), text(";")]),
            None => text(format!("{keyword};")),
        }
    }

    /// Declaration without the terminating semicolon.
    fn var_decl(&mut self, decl: &VarDecl) -> FormatIR {
        let declarators = decl
            .declarators
            .iter()
            .map(|d| match &d.init {
                Some(init) => concat(vec![
                    text(format!("{} = ", d.name.name)),
                    self.expr(init, ASSIGN),
                ]),
                None => text(d.name.name.as_str()),
            })
            .collect();
        concat(vec![
            text(format!("{} ", decl.kind.as_str())),
            join(declarators, || text(", ")),
        ])
    }

    /// Surface syntax of a construct that has not been lowered.
    fn temp_binding(&mut self, tb: &TempBinding) -> FormatIR {
        let marker = format!("{}({})", tb.qualifier.as_str(), tb.binding.name);
        let head = match &tb.result_name {
            Some(name) => format!("{marker} {} = ", name.name),
            None => format!("{marker} = "),
        };
        let steps = tb.steps.iter().map(|s| self.expr(s, ASSIGN)).collect();
        concat(vec![text(head), join(steps, || text(", "))])
    }

    // ── Functions ──────────────────────────────────────────────────────

    fn function(&mut self, func: &Function) -> FormatIR {
        let params = func
            .params
            .iter()
            .map(|p| {
                if p.rest {
                    format!("...{}", p.name.name)
                } else {
                    p.name.name.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        let prefix = if func.is_async { "async " } else { "" };
        let head = if func.is_arrow {
            format!("{prefix}({params}) => ")
        } else {
            match &func.name {
                Some(name) => format!("{prefix}function {}({params}) ", name.name),
                None => format!("{prefix}function ({params}) "),
            }
        };
        let body = match &func.body {
            FnBody::Block(stmts) => self.block(stmts),
            FnBody::Expr(e) => {
                let ir = self.expr(e, ASSIGN);
                if starts_ambiguously(e) {
                    paren(ir)
                } else {
                    ir
                }
            }
        };
        concat(vec![text(head), body])
    }

    // ── Expressions ────────────────────────────────────────────────────

    /// Print `expr`, parenthesized when its level is below `required`.
    fn expr(&mut self, expr: &Expr, required: u8) -> FormatIR {
        let ir = self.expr_inner(expr);
        if prec(expr) < required {
            paren(ir)
        } else {
            ir
        }
    }

    /// Object of a member access or callee of a call.
    fn operand(&mut self, expr: &Expr) -> FormatIR {
        let ir = self.expr(expr, CALL);
        let integer =
            matches!(&expr.kind, ExprKind::Number(n) if n.bytes().all(|b| b.is_ascii_digit()));
        if (is_plain_function(expr) || integer) && prec(expr) >= CALL {
            paren(ir)
        } else {
            ir
        }
    }

    fn elements(&mut self, elements: &[Element]) -> Vec<FormatIR> {
        elements
            .iter()
            .map(|el| match el {
                Element::Expr(e) => self.expr(e, ASSIGN),
                Element::Spread(e) => concat(vec![text("..."), self.expr(e, ASSIGN)]),
            })
            .collect()
    }

    fn expr_inner(&mut self, expr: &Expr) -> FormatIR {
        match &expr.kind {
            ExprKind::Number(n) => text(n.as_str()),
            ExprKind::Str(s) => text(s.as_str()),
            ExprKind::Bool(b) => text(if *b { "true" } else { "false" }),
            ExprKind::Null => text("null"),
            ExprKind::This => text("this"),
            ExprKind::Missing => text("void 0"),
            ExprKind::Ident(ident) => text(ident.name.as_str()),
            ExprKind::Template(parts) => {
                let mut out = vec![text("`")];
                for part in parts {
                    match part {
                        TemplatePart::Text(raw) => out.push(text(raw.as_str())),
                        TemplatePart::Expr(e) => {
                            out.push(text("${"));
                            out.push(self.expr(e, SEQ));
                            out.push(text("}"));
                        }
                    }
                }
                out.push(text("`"));
                concat(out)
            }
            ExprKind::Array(elements) => {
                let items = self.elements(elements);
                delimited("[", items, "]", false)
            }
            ExprKind::Object(props) => {
                let items = props.iter().map(|p| self.prop(p)).collect();
                delimited("{", items, "}", true)
            }
            ExprKind::Member {
                object,
                property,
                optional,
            } => {
                let dot = if *optional { "?." } else { "." };
                concat(vec![self.operand(object), text(format!("{dot}{property}"))])
            }
            ExprKind::Index {
                object,
                index,
                optional,
            } => concat(vec![
                self.operand(object),
                text(if *optional { "?.[" } else { "[" }),
                self.expr(index, SEQ),
                text("]"),
            ]),
            ExprKind::Call {
                callee,
                args,
                optional,
            } => {
                let callee = self.operand(callee);
                let items = self.elements(args);
                let open = if *optional { "?.(" } else { "(" };
                concat(vec![callee, delimited(open, items, ")", false)])
            }
            ExprKind::New { callee, args } => {
                let callee_ir = self.operand(callee);
                // `new f()()` would construct `f`, not its result.
                let callee_ir = if matches!(callee.kind, ExprKind::Call { .. }) {
                    paren(callee_ir)
                } else {
                    callee_ir
                };
                let mut parts = vec![text("new "), callee_ir];
                if let Some(args) = args {
                    let items = self.elements(args);
                    parts.push(delimited("(", items, ")", false));
                }
                concat(parts)
            }
            ExprKind::Function(func) => self.function(func),
            ExprKind::Unary { op, arg } => {
                let gap = op.is_word()
                    || (matches!(op, UnaryOp::Neg | UnaryOp::Plus)
                        && matches!(
                            arg.kind,
                            ExprKind::Unary {
                                op: UnaryOp::Neg | UnaryOp::Plus,
                                ..
                            } | ExprKind::Update { prefix: true, .. }
                        ));
                let op_text = if gap {
                    format!("{} ", op.as_str())
                } else {
                    op.as_str().to_string()
                };
                concat(vec![text(op_text), self.expr(arg, UNARY)])
            }
            ExprKind::Update { op, prefix, arg } => {
                let op_text = text(op.as_str());
                if *prefix {
                    concat(vec![op_text, self.expr(arg, UNARY)])
                } else {
                    concat(vec![self.expr(arg, CALL), op_text])
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let level = binary_prec(*op);
                let (left_min, right_min) = if *op == BinaryOp::Exp {
                    (POSTFIX, level)
                } else {
                    (level, level + 1)
                };
                let lhs_ir = self.logical_operand(*op, lhs, left_min);
                let rhs_ir = self.logical_operand(*op, rhs, right_min);
                concat(vec![lhs_ir, text(format!(" {} ", op.as_str())), rhs_ir])
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => concat(vec![
                self.expr(test, COND + 1),
                text(" ? "),
                self.expr(consequent, ASSIGN),
                text(" : "),
                self.expr(alternate, ASSIGN),
            ]),
            ExprKind::Assign { op, target, value } => concat(vec![
                self.expr(target, CALL),
                text(format!(" {} ", op.as_str())),
                self.expr(value, ASSIGN),
            ]),
            ExprKind::Sequence(items) => {
                let items = items.iter().map(|e| self.expr(e, ASSIGN)).collect();
                join(items, || text(", "))
            }
            ExprKind::TempBinding(tb) => self.temp_binding(tb),
            ExprKind::Lowered { construct, expr: inner } => {
                let ir = self.expr_inner(inner);
                self.marked(*construct, expr.span, ir)
            }
            ExprKind::Rejected { source, .. } => text(source.as_str()),
        }
    }

    /// `??` cannot mix with `&&`/`||` without parentheses.
    fn logical_operand(&mut self, op: BinaryOp, operand: &Expr, required: u8) -> FormatIR {
        let mixes = match &operand.kind {
            ExprKind::Binary { op: inner, .. } => {
                inner.is_logical()
                    && op.is_logical()
                    && (*inner == BinaryOp::Nullish) != (op == BinaryOp::Nullish)
            }
            _ => false,
        };
        let ir = self.expr(operand, required);
        if mixes && prec(operand) >= required {
            paren(ir)
        } else {
            ir
        }
    }

    fn prop(&mut self, prop: &Prop) -> FormatIR {
        match prop {
            Prop::KeyValue { key, value } => {
                let key = match key {
                    PropKey::Ident(name) => text(name.as_str()),
                    PropKey::Str(s) => text(s.as_str()),
                    PropKey::Number(n) => text(n.as_str()),
                    PropKey::Computed(e) => concat(vec![text("["), self.expr(e, ASSIGN), text("]")]),
                };
                concat(vec![key, text(": "), self.expr(value, ASSIGN)])
            }
            Prop::Shorthand(ident) => text(ident.name.as_str()),
            Prop::Spread(e) => concat(vec![text("..."), self.expr(e, ASSIGN)]),
        }
    }
}
