//! The rewriting walk over the HIR.
//!
//! One `Lowerer` handles one unit. It owns the name allocator, the scope
//! stack and the per-construct bookkeeping. Constructs are entered in
//! pre-order (the synthetic name is allocated on entry) and replaced in
//! post-order (inner constructs are spliced while the outer one's steps are
//! visited, so the outer lowering only sees plain code).

use rustc_hash::{FxHashMap, FxHashSet};
use tbind_common::span::Span;
use tbind_hir::{
    Element, Expr, ExprKind, FnBody, ForInit, Function, Program, Prop, PropKey, Stmt, StmtKind,
    TempBinding, TemplatePart, VarDecl,
};
use tracing::{debug, trace};

use crate::config::LowerOptions;
use crate::construct::{ConstructState, Ledger};
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::hygiene::{self, NameAllocator, Resolution, Scopes};
use crate::lower::{self, Lowering, Resolved};
use crate::splice::{self, Keep, Slot};

/// Result of processing one construct node.
enum Outcome {
    Lowered(tbind_hir::ConstructId, Lowering),
    Rejected(tbind_hir::ConstructId, String),
}

pub(crate) struct Lowerer<'a> {
    options: &'a LowerOptions,
    names: NameAllocator,
    scopes: Scopes,
    ledger: &'a mut Ledger,
    diagnostics: &'a mut Vec<Diagnostic>,
    /// References read before their construct's binding holds a value.
    unresolved: FxHashMap<tbind_hir::ConstructId, Vec<Span>>,
}

impl<'a> Lowerer<'a> {
    pub(crate) fn new(
        options: &'a LowerOptions,
        taken: FxHashSet<String>,
        ledger: &'a mut Ledger,
        diagnostics: &'a mut Vec<Diagnostic>,
    ) -> Self {
        Self {
            options,
            names: NameAllocator::new(options.synthetic_prefix.clone(), taken),
            scopes: Scopes::new(options.globals.iter().cloned()),
            ledger,
            diagnostics,
            unresolved: FxHashMap::default(),
        }
    }

    pub(crate) fn run(mut self, program: &mut Program) {
        self.scopes.push_function(hygiene::program_names(&program.body));
        self.stmt_list(&mut program.body);
        self.scopes.pop();
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn stmt_list(&mut self, stmts: &mut Vec<Stmt>) {
        let mut i = 0;
        while i < stmts.len() {
            match self.stmt(&mut stmts[i], Slot::List) {
                Keep::Yes => i += 1,
                Keep::Remove => {
                    stmts.remove(i);
                }
            }
        }
    }

    fn block(&mut self, stmts: &mut Vec<Stmt>) {
        self.scopes.push_block(hygiene::block_names(stmts));
        self.stmt_list(stmts);
        self.scopes.pop();
    }

    fn slot(&mut self, stmt: &mut Stmt) {
        // A single slot is never removed; a dropped construct leaves `;`.
        let _ = self.stmt(stmt, Slot::Single);
    }

    fn stmt(&mut self, stmt: &mut Stmt, slot: Slot) -> Keep {
        if matches!(
            stmt.kind,
            StmtKind::TempBinding(_) | StmtKind::Rejected { .. }
        ) {
            return self.construct_stmt(stmt, slot);
        }

        match &mut stmt.kind {
            StmtKind::VarDecl(decl) => self.var_decl(decl),
            StmtKind::FnDecl(func) => self.function(func, false),
            StmtKind::Block(stmts) => self.block(stmts),
            StmtKind::Return(expr) => {
                if let Some(e) = expr {
                    self.expr(e);
                }
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.expr(cond);
                self.slot(then_branch);
                if let Some(e) = else_branch {
                    self.slot(e);
                }
            }
            StmtKind::While { cond, body } => {
                self.expr(cond);
                self.slot(body);
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                let mut names = FxHashMap::default();
                if let Some(ForInit::VarDecl(decl)) = init {
                    for d in &decl.declarators {
                        names.insert(d.name.name.clone(), d.name.span);
                    }
                }
                self.scopes.push_block(names);
                match init {
                    Some(ForInit::VarDecl(decl)) => self.var_decl(decl),
                    Some(ForInit::Expr(e)) => self.expr(e),
                    None => {}
                }
                if let Some(e) = test {
                    self.expr(e);
                }
                if let Some(e) = update {
                    self.expr(e);
                }
                self.slot(body);
                self.scopes.pop();
            }
            StmtKind::ForOf {
                name,
                iterable,
                body,
                ..
            } => {
                self.expr(iterable);
                let mut names = FxHashMap::default();
                names.insert(name.name.clone(), name.span);
                self.scopes.push_block(names);
                self.slot(body);
                self.scopes.pop();
            }
            StmtKind::Throw(e) | StmtKind::Expr(e) => self.expr(e),
            StmtKind::Lowered { stmts, .. } => self.stmt_list(stmts),
            StmtKind::Break
            | StmtKind::Continue
            | StmtKind::Empty
            | StmtKind::TempBinding(_)
            | StmtKind::Rejected { .. } => {}
        }
        Keep::Yes
    }

    fn var_decl(&mut self, decl: &mut VarDecl) {
        for d in &mut decl.declarators {
            if let Some(init) = &mut d.init {
                self.expr(init);
            }
        }
    }

    fn function(&mut self, func: &mut Function, own_name: bool) {
        self.scopes.push_function(hygiene::function_names(func, own_name));
        match &mut func.body {
            FnBody::Block(stmts) => self.stmt_list(stmts),
            FnBody::Expr(e) => self.expr(e),
        }
        self.scopes.pop();
    }

    fn construct_stmt(&mut self, stmt: &mut Stmt, slot: Slot) -> Keep {
        let outcome = match std::mem::replace(&mut stmt.kind, StmtKind::Empty) {
            StmtKind::TempBinding(tb) => self.temp_binding(*tb, stmt.span),
            StmtKind::Rejected { construct, source } => Outcome::Rejected(construct, source),
            other => {
                stmt.kind = other;
                return Keep::Yes;
            }
        };
        match outcome {
            Outcome::Lowered(id, lowering) => {
                splice::lowered_stmt(stmt, id, lowering, slot);
                self.ledger.advance(id, ConstructState::Spliced);
                Keep::Yes
            }
            Outcome::Rejected(id, source) => {
                splice::rejected_stmt(stmt, id, source, self.options.on_reject, slot)
            }
        }
    }

    // ── Expressions ────────────────────────────────────────────────────

    fn expr(&mut self, expr: &mut Expr) {
        if matches!(
            expr.kind,
            ExprKind::TempBinding(_) | ExprKind::Rejected { .. }
        ) {
            self.construct_expr(expr);
            return;
        }

        match &mut expr.kind {
            ExprKind::Ident(ident) => {
                if let Some(synthetic) = self.reference(&ident.name, ident.span) {
                    ident.name = synthetic;
                }
            }
            ExprKind::Template(parts) => {
                for part in parts {
                    if let TemplatePart::Expr(e) = part {
                        self.expr(e);
                    }
                }
            }
            ExprKind::Array(elements) => self.elements(elements),
            ExprKind::Object(props) => {
                for prop in props {
                    self.prop(prop);
                }
            }
            ExprKind::Member { object, .. } => self.expr(object),
            ExprKind::Index { object, index, .. } => {
                self.expr(object);
                self.expr(index);
            }
            ExprKind::Call { callee, args, .. } => {
                self.expr(callee);
                self.elements(args);
            }
            ExprKind::New { callee, args } => {
                self.expr(callee);
                if let Some(args) = args {
                    self.elements(args);
                }
            }
            ExprKind::Function(func) => {
                let own_name = !func.is_arrow;
                self.function(func, own_name);
            }
            ExprKind::Unary { arg, .. } | ExprKind::Update { arg, .. } => self.expr(arg),
            ExprKind::Binary { lhs, rhs, .. } => {
                self.expr(lhs);
                self.expr(rhs);
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.expr(test);
                self.expr(consequent);
                self.expr(alternate);
            }
            ExprKind::Assign { target, value, .. } => {
                self.expr(target);
                self.expr(value);
            }
            ExprKind::Sequence(exprs) => {
                for e in exprs {
                    self.expr(e);
                }
            }
            ExprKind::Lowered { expr, .. } => self.expr(expr),
            ExprKind::Number(_)
            | ExprKind::Str(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::This
            | ExprKind::Missing
            | ExprKind::TempBinding(_)
            | ExprKind::Rejected { .. } => {}
        }
    }

    fn elements(&mut self, elements: &mut [Element]) {
        for el in elements {
            self.expr(el.expr_mut());
        }
    }

    fn prop(&mut self, prop: &mut Prop) {
        match prop {
            Prop::KeyValue { key, value } => {
                if let PropKey::Computed(k) = key {
                    self.expr(k);
                }
                self.expr(value);
            }
            Prop::Spread(e) => self.expr(e),
            Prop::Shorthand(ident) => {
                // `{ $ }` keeps its key and reads the synthetic binding.
                if let Some(synthetic) = self.reference(&ident.name, ident.span) {
                    let (key, span) = (ident.name.clone(), ident.span);
                    *prop = Prop::KeyValue {
                        key: PropKey::Ident(key),
                        value: Expr::ident(synthetic, span),
                    };
                }
            }
        }
    }

    /// Resolve an identifier use. Returns the synthetic name when it refers
    /// to a live construct binding.
    fn reference(&mut self, name: &str, span: Span) -> Option<String> {
        match self.scopes.resolve(name) {
            Resolution::Construct { id, synthetic, .. } => {
                trace!(construct = %id, name, %synthetic, start = span.start, "rename");
                Some(synthetic)
            }
            Resolution::Unbound { pending: Some(id) } => {
                self.unresolved.entry(id).or_default().push(span);
                None
            }
            _ => None,
        }
    }

    fn construct_expr(&mut self, expr: &mut Expr) {
        let outcome = match std::mem::replace(&mut expr.kind, ExprKind::Missing) {
            ExprKind::TempBinding(tb) => self.temp_binding(*tb, expr.span),
            ExprKind::Rejected { construct, source } => Outcome::Rejected(construct, source),
            other => {
                expr.kind = other;
                return;
            }
        };
        match outcome {
            Outcome::Lowered(id, Lowering::Expr(replacement)) => {
                splice::lowered_expr(expr, id, replacement);
                self.ledger.advance(id, ConstructState::Spliced);
            }
            Outcome::Lowered(id, Lowering::Stmts(_)) => {
                // Declaration forms only occur in statement position.
                debug!(construct = %id, "declaration form in expression position");
                self.ledger.advance(id, ConstructState::Rejected);
                splice::rejected_expr(expr, id, String::new(), self.options.on_reject);
            }
            Outcome::Rejected(id, source) => {
                splice::rejected_expr(expr, id, source, self.options.on_reject);
            }
        }
    }

    // ── Constructs ─────────────────────────────────────────────────────

    fn temp_binding(&mut self, tb: TempBinding, span: Span) -> Outcome {
        let TempBinding {
            id,
            form,
            qualifier,
            binding,
            result_name,
            mut steps,
            source,
        } = tb;

        let synthetic = self.names.fresh();
        self.ledger.set_synthetic(id, &synthetic);
        debug!(construct = %id, binding = %binding, %synthetic, "enter");

        self.check_shadow(id, &binding);

        self.scopes
            .push_construct(id, &binding.name, &synthetic, binding.span);
        if let Some((first, rest)) = steps.split_first_mut() {
            self.expr(first);
            self.scopes.go_live();
            for step in rest {
                self.expr(step);
            }
        }
        self.scopes.pop();

        if let Some(spans) = self.unresolved.remove(&id) {
            let mut diag = Diagnostic::new(
                DiagnosticCode::UnresolvedBindingReference,
                format!(
                    "`{}` is read in the first step, before the binding has a value",
                    binding.name
                ),
                spans[0],
            )
            .with_label(format!("no enclosing binding named `{}`", binding.name))
            .with_related("binding introduced here", binding.span)
            .for_construct(id);
            for extra in &spans[1..] {
                diag = diag.with_related("also read here", *extra);
            }
            self.diagnostics.push(diag);
            self.ledger.advance(id, ConstructState::Rejected);
            return Outcome::Rejected(id, source);
        }
        self.ledger.advance(id, ConstructState::Resolved);

        let lowering = lower::lower(
            Resolved {
                form,
                qualifier,
                result_name,
                steps,
                synthetic,
                span,
            },
            self.options.target,
        );
        self.ledger.advance(id, ConstructState::Lowered);
        Outcome::Lowered(id, lowering)
    }

    /// Warn when the binding identifier already means something here.
    fn check_shadow(&mut self, id: tbind_hir::ConstructId, binding: &tbind_hir::Ident) {
        let diag = match self.scopes.resolve(&binding.name) {
            Resolution::Construct { binding_span, .. } => Diagnostic::new(
                DiagnosticCode::ShadowWarning,
                format!(
                    "`{}` shadows the binding of an enclosing temporary binding",
                    binding.name
                ),
                binding.span,
            )
            .with_related("enclosing binding introduced here", binding_span),
            Resolution::Declared(declared) => Diagnostic::new(
                DiagnosticCode::ShadowWarning,
                format!("`{}` shadows a variable of the enclosing scope", binding.name),
                binding.span,
            )
            .with_related("shadowed declaration", declared),
            Resolution::Global => Diagnostic::new(
                DiagnosticCode::ShadowWarning,
                format!("`{}` shadows a global", binding.name),
                binding.span,
            ),
            Resolution::Unbound { .. } => return,
        };
        self.diagnostics
            .push(diag.with_label("references in later steps use this binding").for_construct(id));
    }
}
