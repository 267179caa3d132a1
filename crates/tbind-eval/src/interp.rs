//! Tree-walking evaluator over the HIR.
//!
//! Statements produce a [`Completion`]; `throw` and run-time faults travel
//! as [`EvalError`]. The grammar has no `try`, so nothing catches them.
//!
//! A `TempBinding` node still present in the tree is evaluated directly:
//! step 1 in the enclosing scope, then each later step in a block scope
//! where the binding holds the previous step's value. That is the
//! reference meaning a lowered program must reproduce.

use std::cmp::Ordering;
use std::rc::Rc;

use tbind_common::span::Span;
use tbind_hir::{
    BinaryOp, DeclKind, Element, Expr, ExprKind, FnBody, ForInit, Function, Ident, Program, Prop,
    PropKey, Stmt, StmtKind, TempBinding, TemplatePart, UnaryOp, UpdateOp, VarDecl,
};
use tracing::trace;

use crate::builtins::{self, Native};
use crate::env::{AssignError, Env};
use crate::error::{EvalError, Result};
use crate::value::{number_to_string, Closure, Object, Value};
use crate::EvalConfig;

/// Arrays grow densely; writes further out than this are refused.
const MAX_DENSE_INDEX: usize = 1 << 24;

pub(crate) enum Completion {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// Target of an assignment or update, evaluated once.
enum Place {
    Binding(Ident),
    Property(Value, String),
}

pub(crate) struct Interpreter<'a> {
    config: &'a EvalConfig,
    steps: u64,
    depth: usize,
    output: Vec<String>,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(config: &'a EvalConfig) -> Self {
        Self {
            config,
            steps: 0,
            depth: 0,
            output: Vec::new(),
        }
    }

    pub(crate) fn print(&mut self, line: String) {
        trace!(%line, "console.log");
        self.output.push(line);
    }

    pub(crate) fn into_output(self) -> Vec<String> {
        self.output
    }

    /// Run a program; the value is that of the last top-level expression
    /// statement.
    pub(crate) fn run(&mut self, program: &Program, env: &Env) -> Result<Value> {
        hoist_vars(&program.body, env);
        hoist_functions(&program.body, env);
        let mut last = Value::Undefined;
        for stmt in &program.body {
            if let StmtKind::Expr(expr) = &stmt.kind {
                self.tick()?;
                last = self.eval(expr, env)?;
                continue;
            }
            if !matches!(self.exec(stmt, env)?, Completion::Normal) {
                break;
            }
        }
        Ok(last)
    }

    fn tick(&mut self) -> Result<()> {
        self.steps += 1;
        if self.steps > self.config.max_steps {
            return Err(EvalError::StepLimit);
        }
        Ok(())
    }

    // ── Statements ───────────────────────────────────────────────────────

    fn exec_block(&mut self, stmts: &[Stmt], env: &Env) -> Result<Completion> {
        hoist_functions(stmts, env);
        self.exec_list(stmts, env)
    }

    fn exec_list(&mut self, stmts: &[Stmt], env: &Env) -> Result<Completion> {
        for stmt in stmts {
            match self.exec(stmt, env)? {
                Completion::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Completion::Normal)
    }

    fn exec(&mut self, stmt: &Stmt, env: &Env) -> Result<Completion> {
        self.tick()?;
        match &stmt.kind {
            StmtKind::VarDecl(decl) => {
                self.declare(decl, env)?;
                Ok(Completion::Normal)
            }
            StmtKind::FnDecl(_) | StmtKind::Empty => Ok(Completion::Normal),
            StmtKind::Block(stmts) => self.exec_block(stmts, &env.block()),
            StmtKind::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval(cond, env)?.is_truthy() {
                    self.exec(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.exec(else_branch, env)
                } else {
                    Ok(Completion::Normal)
                }
            }
            StmtKind::While { cond, body } => {
                while self.eval(cond, env)?.is_truthy() {
                    match self.exec(body, env)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                }
                Ok(Completion::Normal)
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => self.exec_for(init.as_ref(), test.as_ref(), update.as_ref(), body, env),
            StmtKind::ForOf {
                kind,
                name,
                iterable,
                body,
            } => {
                let items = match self.eval(iterable, env)? {
                    Value::Array(items) => items.borrow().clone(),
                    Value::Str(s) => s.chars().map(|c| Value::str(&c.to_string())).collect(),
                    other => {
                        return Err(EvalError::type_error(
                            format!("{} is not iterable", other.display()),
                            iterable.span,
                        ))
                    }
                };
                for item in items {
                    let scope = env.block();
                    bind(*kind, name, Some(item), &scope);
                    match self.exec(body, &scope)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                }
                Ok(Completion::Normal)
            }
            StmtKind::Break => Ok(Completion::Break),
            StmtKind::Continue => Ok(Completion::Continue),
            StmtKind::Throw(expr) => Err(EvalError::Thrown(self.eval(expr, env)?)),
            StmtKind::Expr(expr) => {
                self.eval(expr, env)?;
                Ok(Completion::Normal)
            }
            StmtKind::TempBinding(temp) => {
                let value = self.temp_binding(temp, env)?;
                if let Some(name) = &temp.result_name {
                    bind(temp.qualifier, name, Some(value), env);
                }
                Ok(Completion::Normal)
            }
            // Spliced declarations belong to the enclosing list.
            StmtKind::Lowered { stmts, .. } => self.exec_list(stmts, env),
            StmtKind::Rejected { construct, .. } => Err(EvalError::Rejected(*construct)),
        }
    }

    fn declare(&mut self, decl: &VarDecl, env: &Env) -> Result<()> {
        for declarator in &decl.declarators {
            let value = match &declarator.init {
                Some(init) => Some(self.eval(init, env)?),
                None => None,
            };
            bind(decl.kind, &declarator.name, value, env);
        }
        Ok(())
    }

    /// `let`/`const` loop variables get a fresh copy per iteration, so
    /// closures created in the body keep the value they saw.
    fn exec_for(
        &mut self,
        init: Option<&ForInit>,
        test: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
        env: &Env,
    ) -> Result<Completion> {
        let mut scope = env.block();
        let mut per_iteration = Vec::new();
        match init {
            Some(ForInit::VarDecl(decl)) => {
                self.declare(decl, &scope)?;
                if decl.kind != DeclKind::Var {
                    per_iteration = decl
                        .declarators
                        .iter()
                        .map(|d| (d.name.name.clone(), decl.kind.is_mutable()))
                        .collect();
                }
            }
            Some(ForInit::Expr(expr)) => {
                self.eval(expr, &scope)?;
            }
            None => {}
        }

        loop {
            if let Some(test) = test {
                if !self.eval(test, &scope)?.is_truthy() {
                    break;
                }
            }
            match self.exec(body, &scope)? {
                Completion::Break => break,
                Completion::Return(value) => return Ok(Completion::Return(value)),
                Completion::Normal | Completion::Continue => {}
            }
            if !per_iteration.is_empty() {
                let next = env.block();
                for (name, mutable) in &per_iteration {
                    let value = scope.lookup(name).unwrap_or(Value::Undefined);
                    next.declare(name, value, *mutable);
                }
                scope = next;
            }
            if let Some(update) = update {
                self.eval(update, &scope)?;
            }
        }
        Ok(Completion::Normal)
    }

    fn temp_binding(&mut self, temp: &TempBinding, env: &Env) -> Result<Value> {
        let Some((first, rest)) = temp.steps.split_first() else {
            return Ok(Value::Undefined);
        };
        let mut value = self.eval(first, env)?;
        let scope = env.block();
        scope.declare(&temp.binding.name, value.clone(), true);
        for step in rest {
            value = self.eval(step, &scope)?;
            scope.declare(&temp.binding.name, value.clone(), true);
        }
        Ok(value)
    }

    // ── Expressions ──────────────────────────────────────────────────────

    pub(crate) fn eval(&mut self, expr: &Expr, env: &Env) -> Result<Value> {
        match &expr.kind {
            ExprKind::Number(text) => Ok(Value::Number(parse_number(text))),
            ExprKind::Str(text) => Ok(Value::str(&decode_string(text))),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Text(raw) => out.push_str(&unescape(raw)),
                        TemplatePart::Expr(expr) => {
                            out.push_str(&self.eval(expr, env)?.to_js_string());
                        }
                    }
                }
                Ok(Value::str(&out))
            }
            ExprKind::Ident(ident) => lookup(ident, env),
            ExprKind::This => Ok(env.this()),
            ExprKind::Array(elements) => Ok(Value::array(self.elements(elements, env)?)),
            ExprKind::Object(props) => self.object(props, env),
            ExprKind::Member {
                object,
                property,
                optional,
            } => {
                let object = self.eval(object, env)?;
                if *optional && object.is_nullish() {
                    return Ok(Value::Undefined);
                }
                get_property(&object, property, expr.span)
            }
            ExprKind::Index {
                object,
                index,
                optional,
            } => {
                let object = self.eval(object, env)?;
                if *optional && object.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let key = self.eval(index, env)?.to_js_string();
                get_property(&object, &key, expr.span)
            }
            ExprKind::Call {
                callee,
                args,
                optional,
            } => self.call_expr(callee, args, *optional, expr.span, env),
            ExprKind::New { callee, args } => self.new_expr(callee, args.as_deref(), expr.span, env),
            ExprKind::Function(func) => Ok(closure(func, env)),
            ExprKind::Unary { op, arg } => self.unary(*op, arg, env),
            ExprKind::Update { op, prefix, arg } => {
                let place = self.place(arg, env)?;
                let old = self.read(&place, env, arg.span)?.to_number();
                let new = match op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                write(&place, Value::Number(new), env, expr.span)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs, env)?;
                match op {
                    BinaryOp::And if !lhs.is_truthy() => return Ok(lhs),
                    BinaryOp::Or if lhs.is_truthy() => return Ok(lhs),
                    BinaryOp::Nullish if !lhs.is_nullish() => return Ok(lhs),
                    _ => {}
                }
                let rhs = self.eval(rhs, env)?;
                binary(*op, &lhs, &rhs, expr.span)
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, env)?.is_truthy() {
                    self.eval(consequent, env)
                } else {
                    self.eval(alternate, env)
                }
            }
            ExprKind::Assign { op, target, value } => {
                let place = self.place(target, env)?;
                let value = match op.binary() {
                    None => self.eval(value, env)?,
                    Some(op) => {
                        let current = self.read(&place, env, target.span)?;
                        let rhs = self.eval(value, env)?;
                        binary(op, &current, &rhs, expr.span)?
                    }
                };
                write(&place, value.clone(), env, expr.span)?;
                Ok(value)
            }
            ExprKind::Sequence(exprs) => {
                let mut last = Value::Undefined;
                for expr in exprs {
                    last = self.eval(expr, env)?;
                }
                Ok(last)
            }
            ExprKind::TempBinding(temp) => self.temp_binding(temp, env),
            ExprKind::Lowered { expr: inner, .. } => self.eval(inner, env),
            ExprKind::Rejected { construct, .. } => Err(EvalError::Rejected(*construct)),
            ExprKind::Missing => Ok(Value::Undefined),
        }
    }

    fn elements(&mut self, elements: &[Element], env: &Env) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                Element::Expr(expr) => values.push(self.eval(expr, env)?),
                Element::Spread(expr) => match self.eval(expr, env)? {
                    Value::Array(items) => values.extend(items.borrow().iter().cloned()),
                    Value::Str(s) => values.extend(s.chars().map(|c| Value::str(&c.to_string()))),
                    other => {
                        return Err(EvalError::type_error(
                            format!("{} is not iterable", other.display()),
                            expr.span,
                        ))
                    }
                },
            }
        }
        Ok(values)
    }

    fn object(&mut self, props: &[Prop], env: &Env) -> Result<Value> {
        let mut object = Object::new();
        for prop in props {
            match prop {
                Prop::KeyValue { key, value } => {
                    let key = match key {
                        PropKey::Ident(name) => name.clone(),
                        PropKey::Str(quoted) => decode_string(quoted),
                        PropKey::Number(text) => number_to_string(parse_number(text)),
                        PropKey::Computed(expr) => self.eval(expr, env)?.to_js_string(),
                    };
                    let value = self.eval(value, env)?;
                    object.set(key, value);
                }
                Prop::Shorthand(ident) => object.set(ident.name.clone(), lookup(ident, env)?),
                Prop::Spread(expr) => match self.eval(expr, env)? {
                    Value::Object(source) => {
                        for (key, value) in source.borrow().entries() {
                            object.set(key, value.clone());
                        }
                    }
                    Value::Array(items) => {
                        for (i, value) in items.borrow().iter().enumerate() {
                            object.set(i.to_string(), value.clone());
                        }
                    }
                    _ => {}
                },
            }
        }
        Ok(Value::object(object))
    }

    fn unary(&mut self, op: UnaryOp, arg: &Expr, env: &Env) -> Result<Value> {
        match op {
            UnaryOp::Typeof => {
                if let ExprKind::Ident(ident) = &arg.kind {
                    if env.lookup(&ident.name).is_none() {
                        return Ok(Value::str("undefined"));
                    }
                }
                Ok(Value::str(self.eval(arg, env)?.type_of()))
            }
            UnaryOp::Delete => {
                if matches!(arg.kind, ExprKind::Member { .. } | ExprKind::Index { .. }) {
                    if let Place::Property(object, key) = self.place(arg, env)? {
                        delete_property(&object, &key);
                    }
                } else {
                    self.eval(arg, env)?;
                }
                Ok(Value::Bool(true))
            }
            UnaryOp::Void => {
                self.eval(arg, env)?;
                Ok(Value::Undefined)
            }
            UnaryOp::Await => Ok(match self.eval(arg, env)? {
                Value::Promise(settled) => (*settled).clone(),
                other => other,
            }),
            UnaryOp::Not => Ok(Value::Bool(!self.eval(arg, env)?.is_truthy())),
            UnaryOp::Neg => Ok(Value::Number(-self.eval(arg, env)?.to_number())),
            UnaryOp::Plus => Ok(Value::Number(self.eval(arg, env)?.to_number())),
        }
    }

    fn place(&mut self, target: &Expr, env: &Env) -> Result<Place> {
        match &target.kind {
            ExprKind::Ident(ident) => Ok(Place::Binding(ident.clone())),
            ExprKind::Member {
                object, property, ..
            } => Ok(Place::Property(self.eval(object, env)?, property.clone())),
            ExprKind::Index { object, index, .. } => {
                let object = self.eval(object, env)?;
                let key = self.eval(index, env)?.to_js_string();
                Ok(Place::Property(object, key))
            }
            _ => Err(EvalError::type_error(
                "invalid assignment target",
                target.span,
            )),
        }
    }

    fn read(&mut self, place: &Place, env: &Env, span: Span) -> Result<Value> {
        match place {
            Place::Binding(ident) => lookup(ident, env),
            Place::Property(object, key) => get_property(object, key, span),
        }
    }

    // ── Calls ────────────────────────────────────────────────────────────

    fn call_expr(
        &mut self,
        callee: &Expr,
        args: &[Element],
        optional: bool,
        span: Span,
        env: &Env,
    ) -> Result<Value> {
        // A member callee supplies `this`.
        let (func, this) = match &callee.kind {
            ExprKind::Member {
                object,
                property,
                optional: short,
            } => {
                let object = self.eval(object, env)?;
                if *short && object.is_nullish() {
                    return Ok(Value::Undefined);
                }
                (get_property(&object, property, callee.span)?, object)
            }
            ExprKind::Index {
                object,
                index,
                optional: short,
            } => {
                let object = self.eval(object, env)?;
                if *short && object.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let key = self.eval(index, env)?.to_js_string();
                (get_property(&object, &key, callee.span)?, object)
            }
            _ => (self.eval(callee, env)?, Value::Undefined),
        };
        if optional && func.is_nullish() {
            return Ok(Value::Undefined);
        }
        if !matches!(func, Value::Function(_) | Value::Native(_)) {
            return Err(EvalError::type_error(
                format!("{} is not a function", callee_name(callee)),
                callee.span,
            ));
        }
        let args = self.elements(args, env)?;
        self.call_value(&func, this, args, span)
    }

    fn new_expr(
        &mut self,
        callee: &Expr,
        args: Option<&[Element]>,
        span: Span,
        env: &Env,
    ) -> Result<Value> {
        let func = self.eval(callee, env)?;
        let args = match args {
            Some(args) => self.elements(args, env)?,
            None => Vec::new(),
        };
        match &func {
            Value::Function(ctor) if !ctor.func.is_arrow && !ctor.func.is_async => {
                let mut object = Object::new();
                object.constructor = Some(ctor.clone());
                let this = Value::object(object);
                let result = self.call_closure(ctor, this.clone(), args, span)?;
                Ok(match result {
                    Value::Object(_) | Value::Array(_) | Value::Function(_) => result,
                    _ => this,
                })
            }
            Value::Native(Native::Error) => {
                let message = args.into_iter().next().unwrap_or(Value::Undefined);
                Ok(builtins::make_error(&message))
            }
            _ => Err(EvalError::type_error(
                format!("{} is not a constructor", callee_name(callee)),
                callee.span,
            )),
        }
    }

    pub(crate) fn call_value(
        &mut self,
        func: &Value,
        this: Value,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value> {
        match func {
            Value::Function(closure) => self.call_closure(closure, this, args, span),
            Value::Native(native) => builtins::call(self, *native, this, args, span),
            other => Err(EvalError::type_error(
                format!("{} is not a function", other.display()),
                span,
            )),
        }
    }

    fn call_closure(
        &mut self,
        closure: &Rc<Closure>,
        this: Value,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value> {
        if self.depth >= self.config.max_depth {
            return Err(EvalError::StackOverflow);
        }
        self.tick()?;
        trace!(name = ?closure.name(), depth = self.depth, ?span, "call");
        self.depth += 1;
        let result = self.invoke(closure, this, args);
        self.depth -= 1;
        let value = result?;
        // Async functions settle before returning.
        if closure.func.is_async && !matches!(value, Value::Promise(_)) {
            return Ok(Value::Promise(Rc::new(value)));
        }
        Ok(value)
    }

    fn invoke(&mut self, closure: &Rc<Closure>, this: Value, args: Vec<Value>) -> Result<Value> {
        let func = &closure.func;
        let scope = closure
            .env
            .function(if func.is_arrow { None } else { Some(this) });
        if let Some(name) = &func.name {
            scope.declare(&name.name, Value::Function(closure.clone()), true);
        }
        let mut args = args.into_iter();
        for param in &func.params {
            let value = if param.rest {
                Value::array(args.by_ref().collect())
            } else {
                args.next().unwrap_or(Value::Undefined)
            };
            scope.declare(&param.name.name, value, true);
        }
        match &func.body {
            FnBody::Expr(expr) => self.eval(expr, &scope),
            FnBody::Block(stmts) => {
                hoist_vars(stmts, &scope);
                match self.exec_block(stmts, &scope)? {
                    Completion::Return(value) => Ok(value),
                    _ => Ok(Value::Undefined),
                }
            }
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn closure(func: &Function, env: &Env) -> Value {
    Value::Function(Rc::new(Closure {
        func: Rc::new(func.clone()),
        env: env.clone(),
    }))
}

fn bind(kind: DeclKind, name: &Ident, value: Option<Value>, env: &Env) {
    match kind {
        DeclKind::Var => env.declare_var(&name.name, value),
        _ => env.declare(
            &name.name,
            value.unwrap_or(Value::Undefined),
            kind.is_mutable(),
        ),
    }
}

fn lookup(ident: &Ident, env: &Env) -> Result<Value> {
    env.lookup(&ident.name)
        .ok_or_else(|| EvalError::Reference {
            name: ident.name.clone(),
            span: ident.span,
        })
}

fn write(place: &Place, value: Value, env: &Env, span: Span) -> Result<()> {
    match place {
        Place::Binding(ident) => env.assign(&ident.name, value).map_err(|err| match err {
            AssignError::Unbound => EvalError::Reference {
                name: ident.name.clone(),
                span: ident.span,
            },
            AssignError::Const => EvalError::ConstAssign {
                name: ident.name.clone(),
                span,
            },
        }),
        Place::Property(object, key) => set_property(object, key, value, span),
    }
}

fn callee_name(callee: &Expr) -> String {
    match &callee.kind {
        ExprKind::Ident(ident) => ident.name.clone(),
        ExprKind::Member {
            object, property, ..
        } => match &object.kind {
            ExprKind::Ident(ident) => format!("{}.{property}", ident.name),
            _ => property.clone(),
        },
        _ => "expression".to_string(),
    }
}

/// Declare every `var` of a function body in its scope, without descending
/// into nested functions.
fn hoist_vars(stmts: &[Stmt], env: &Env) {
    for stmt in stmts {
        hoist_stmt(stmt, env);
    }
}

fn hoist_stmt(stmt: &Stmt, env: &Env) {
    match &stmt.kind {
        StmtKind::VarDecl(decl) if decl.kind == DeclKind::Var => {
            for declarator in &decl.declarators {
                env.declare_var(&declarator.name.name, None);
            }
        }
        StmtKind::Block(stmts) | StmtKind::Lowered { stmts, .. } => hoist_vars(stmts, env),
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            hoist_stmt(then_branch, env);
            if let Some(else_branch) = else_branch {
                hoist_stmt(else_branch, env);
            }
        }
        StmtKind::While { body, .. } => hoist_stmt(body, env),
        StmtKind::For { init, body, .. } => {
            if let Some(ForInit::VarDecl(decl)) = init {
                if decl.kind == DeclKind::Var {
                    for declarator in &decl.declarators {
                        env.declare_var(&declarator.name.name, None);
                    }
                }
            }
            hoist_stmt(body, env);
        }
        StmtKind::ForOf {
            kind, name, body, ..
        } => {
            if *kind == DeclKind::Var {
                env.declare_var(&name.name, None);
            }
            hoist_stmt(body, env);
        }
        StmtKind::TempBinding(temp) if temp.qualifier == DeclKind::Var => {
            if let Some(name) = &temp.result_name {
                env.declare_var(&name.name, None);
            }
        }
        _ => {}
    }
}

/// Function declarations are usable anywhere in their statement list.
fn hoist_functions(stmts: &[Stmt], env: &Env) {
    for stmt in stmts {
        if let StmtKind::FnDecl(func) = &stmt.kind {
            if let Some(name) = &func.name {
                env.declare(&name.name, closure(func, env), true);
            }
        }
    }
}

fn array_index(key: &str) -> Option<usize> {
    let index: usize = key.parse().ok()?;
    (index.to_string() == key).then_some(index)
}

fn get_property(object: &Value, key: &str, span: Span) -> Result<Value> {
    let value = match object {
        Value::Undefined | Value::Null => {
            return Err(EvalError::type_error(
                format!(
                    "cannot read properties of {} (reading '{key}')",
                    object.display()
                ),
                span,
            ))
        }
        Value::Object(object) => object.borrow().get(key).cloned().unwrap_or(Value::Undefined),
        Value::Array(items) => {
            let items = items.borrow();
            if key == "length" {
                Value::Number(items.len() as f64)
            } else if let Some(i) = array_index(key) {
                items.get(i).cloned().unwrap_or(Value::Undefined)
            } else {
                builtins::array_method(key).map_or(Value::Undefined, Value::Native)
            }
        }
        Value::Str(s) => {
            if key == "length" {
                Value::Number(s.chars().count() as f64)
            } else if let Some(i) = array_index(key) {
                s.chars()
                    .nth(i)
                    .map_or(Value::Undefined, |c| Value::str(&c.to_string()))
            } else {
                builtins::string_method(key).map_or(Value::Undefined, Value::Native)
            }
        }
        Value::Number(_) if key == "toFixed" => Value::Native(Native::ToFixed),
        Value::Function(_) | Value::Native(_) if key == "call" => Value::Native(Native::Call),
        Value::Function(closure) if key == "name" => Value::str(closure.name().unwrap_or("")),
        Value::Native(native) if key == "name" => Value::str(native.name()),
        _ => Value::Undefined,
    };
    Ok(value)
}

fn set_property(object: &Value, key: &str, value: Value, span: Span) -> Result<()> {
    match object {
        Value::Undefined | Value::Null => Err(EvalError::type_error(
            format!(
                "cannot set properties of {} (setting '{key}')",
                object.display()
            ),
            span,
        )),
        Value::Object(object) => {
            object.borrow_mut().set(key, value);
            Ok(())
        }
        Value::Array(items) => {
            let mut items = items.borrow_mut();
            if key == "length" {
                let len = value.to_number();
                if len < 0.0 || len.fract() != 0.0 || len as usize > MAX_DENSE_INDEX {
                    return Err(EvalError::type_error("invalid array length", span));
                }
                items.resize(len as usize, Value::Undefined);
                return Ok(());
            }
            // Named properties on arrays are not kept.
            let Some(index) = array_index(key) else {
                return Ok(());
            };
            if index > MAX_DENSE_INDEX {
                return Err(EvalError::type_error("sparse arrays are not supported", span));
            }
            if index >= items.len() {
                items.resize(index + 1, Value::Undefined);
            }
            items[index] = value;
            Ok(())
        }
        // Writes to primitives are dropped.
        _ => Ok(()),
    }
}

fn delete_property(object: &Value, key: &str) {
    match object {
        Value::Object(object) => {
            object.borrow_mut().remove(key);
        }
        Value::Array(items) => {
            if let Some(i) = array_index(key) {
                if let Some(slot) = items.borrow_mut().get_mut(i) {
                    *slot = Value::Undefined;
                }
            }
        }
        _ => {}
    }
}

/// Values that turn `+` into concatenation.
fn concatenates(value: &Value) -> bool {
    !matches!(
        value,
        Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_)
    )
}

fn power(base: f64, exp: f64) -> f64 {
    if exp.is_nan() || (base.abs() == 1.0 && exp.is_infinite()) {
        f64::NAN
    } else {
        base.powf(exp)
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => lhs.to_number().partial_cmp(&rhs.to_number()),
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value, span: Span) -> Result<Value> {
    let (a, b) = (lhs.to_number(), rhs.to_number());
    let value = match op {
        BinaryOp::Add if concatenates(lhs) || concatenates(rhs) => {
            Value::str(&format!("{}{}", lhs.to_js_string(), rhs.to_js_string()))
        }
        BinaryOp::Add => Value::Number(a + b),
        BinaryOp::Sub => Value::Number(a - b),
        BinaryOp::Mul => Value::Number(a * b),
        BinaryOp::Div => Value::Number(a / b),
        BinaryOp::Rem => Value::Number(a % b),
        BinaryOp::Exp => Value::Number(power(a, b)),
        BinaryOp::Eq => Value::Bool(lhs.loose_equals(rhs)),
        BinaryOp::NotEq => Value::Bool(!lhs.loose_equals(rhs)),
        BinaryOp::StrictEq => Value::Bool(lhs.strict_equals(rhs)),
        BinaryOp::StrictNotEq => Value::Bool(!lhs.strict_equals(rhs)),
        BinaryOp::Lt => Value::Bool(compare(lhs, rhs) == Some(Ordering::Less)),
        BinaryOp::Gt => Value::Bool(compare(lhs, rhs) == Some(Ordering::Greater)),
        BinaryOp::LtEq => Value::Bool(matches!(
            compare(lhs, rhs),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::GtEq => Value::Bool(matches!(
            compare(lhs, rhs),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::InstanceOf => match rhs {
            Value::Function(ctor) => Value::Bool(match lhs {
                Value::Object(object) => object
                    .borrow()
                    .constructor
                    .as_ref()
                    .is_some_and(|c| Rc::ptr_eq(c, ctor)),
                _ => false,
            }),
            Value::Native(Native::Error) => Value::Bool(builtins::is_error(lhs)),
            _ => {
                return Err(EvalError::type_error(
                    "right-hand side of 'instanceof' is not callable",
                    span,
                ))
            }
        },
        BinaryOp::In => {
            let key = lhs.to_js_string();
            match rhs {
                Value::Object(object) => Value::Bool(object.borrow().get(&key).is_some()),
                Value::Array(items) => Value::Bool(
                    key == "length" || array_index(&key).is_some_and(|i| i < items.borrow().len()),
                ),
                other => {
                    return Err(EvalError::type_error(
                        format!("cannot use 'in' to search for '{key}' in {}", other.display()),
                        span,
                    ))
                }
            }
        }
        // Reached only when the left side did not short-circuit.
        BinaryOp::And | BinaryOp::Or | BinaryOp::Nullish => rhs.clone(),
    };
    Ok(value)
}

/// Numeric value of a literal as written: separators, hex, octal, binary.
pub(crate) fn parse_number(text: &str) -> f64 {
    let text: String = text.chars().filter(|c| *c != '_').collect();
    let radix = |digits: &str, radix: u32| {
        u64::from_str_radix(digits, radix).map_or(f64::NAN, |n| n as f64)
    };
    match text.get(..2) {
        Some("0x" | "0X") => radix(&text[2..], 16),
        Some("0o" | "0O") => radix(&text[2..], 8),
        Some("0b" | "0B") => radix(&text[2..], 2),
        _ => text.parse().unwrap_or(f64::NAN),
    }
}

/// Contents of a quoted string literal.
pub(crate) fn decode_string(quoted: &str) -> String {
    let inner = quoted.get(1..quoted.len().saturating_sub(1)).unwrap_or("");
    unescape(inner)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                push_code_point(&mut out, &hex);
            }
            Some('u') => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                push_code_point(&mut out, &hex);
            }
            // Line continuation.
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some('\n' | '\u{2028}' | '\u{2029}') => {}
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn push_code_point(out: &mut String, hex: &str) {
    let c = u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER);
    out.push(c);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_literals() {
        assert_eq!(parse_number("1_000"), 1000.0);
        assert_eq!(parse_number("0x1f"), 31.0);
        assert_eq!(parse_number("0b101"), 5.0);
        assert_eq!(parse_number("0o17"), 15.0);
        assert_eq!(parse_number(".5"), 0.5);
        assert_eq!(parse_number("1e3"), 1000.0);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(decode_string(r#""a\nb""#), "a\nb");
        assert_eq!(decode_string(r"'it\'s'"), "it's");
        assert_eq!(decode_string(r#""\x41B\u{43}""#), "ABC");
        assert_eq!(unescape(r"\`\${x}"), "`${x}");
    }

    #[test]
    fn arithmetic_edges() {
        let eval = |op, lhs: Value, rhs: Value| binary(op, &lhs, &rhs, Span::default()).unwrap();
        let one_pow_nan = eval(BinaryOp::Exp, Value::Number(1.0), Value::Number(f64::NAN));
        assert!(one_pow_nan.to_number().is_nan());
        let rem = eval(BinaryOp::Rem, Value::Number(-7.0), Value::Number(3.0));
        assert_eq!(rem.to_number(), -1.0);
        assert_eq!(eval(BinaryOp::Add, Value::str("a"), Value::Number(1.0)).display(), "a1");
        assert_eq!(eval(BinaryOp::Add, Value::Bool(true), Value::Null).to_number(), 1.0);
    }

    #[test]
    fn string_comparison_is_lexicographic() {
        let span = Span::default();
        let lt = binary(BinaryOp::Lt, &Value::str("10"), &Value::str("9"), span).unwrap();
        assert!(lt.is_truthy());
        let lt = binary(BinaryOp::Lt, &Value::Number(10.0), &Value::str("9"), span).unwrap();
        assert!(!lt.is_truthy());
    }

    #[test]
    fn array_keys_are_canonical() {
        assert_eq!(array_index("3"), Some(3));
        assert_eq!(array_index("03"), None);
        assert_eq!(array_index("-1"), None);
        assert_eq!(array_index("length"), None);
    }
}
