//! Hygiene: synthetic name allocation and lexical scope resolution.
//!
//! The resolver keeps a stack of frames. Function and block frames hold the
//! names declared in them; construct frames hold one surface identifier and
//! the synthetic name it maps to. A construct frame is *pending* while its
//! first step is visited (the binding has no value yet, so references skip
//! it) and *live* for the remaining steps.

use rustc_hash::{FxHashMap, FxHashSet};
use tbind_common::span::Span;
use tbind_hir::{ConstructId, FnBody, ForInit, Function, Stmt, StmtKind};

/// Hands out `<prefix><n>` names that occur nowhere in the unit.
#[derive(Debug)]
pub struct NameAllocator {
    prefix: String,
    next: u32,
    taken: FxHashSet<String>,
}

impl NameAllocator {
    /// `taken` holds every identifier of the unit; candidates in it are
    /// skipped. Counting starts at 1.
    pub fn new(prefix: impl Into<String>, taken: FxHashSet<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
            taken,
        }
    }

    pub fn fresh(&mut self) -> String {
        loop {
            let candidate = format!("{}{}", self.prefix, self.next);
            self.next += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

#[derive(Debug)]
enum Frame {
    /// Function body or program: parameters, hoisted `var`s and top-level
    /// declarations.
    Function(FxHashMap<String, Span>),
    Block(FxHashMap<String, Span>),
    Construct {
        id: ConstructId,
        surface: String,
        synthetic: String,
        binding_span: Span,
        live: bool,
    },
}

/// What an identifier refers to at the current position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// A live construct binding.
    Construct {
        id: ConstructId,
        synthetic: String,
        binding_span: Span,
    },
    /// An ordinary declaration or parameter.
    Declared(Span),
    /// A configured global.
    Global,
    /// Nothing. `pending` is the innermost construct still on its first
    /// step whose binding has this name; such a reference is an error.
    Unbound { pending: Option<ConstructId> },
}

#[derive(Debug, Default)]
pub(crate) struct Scopes {
    frames: Vec<Frame>,
    globals: FxHashSet<String>,
}

impl Scopes {
    pub(crate) fn new(globals: impl IntoIterator<Item = String>) -> Self {
        Self {
            frames: Vec::new(),
            globals: globals.into_iter().collect(),
        }
    }

    pub(crate) fn push_function(&mut self, names: FxHashMap<String, Span>) {
        self.frames.push(Frame::Function(names));
    }

    pub(crate) fn push_block(&mut self, names: FxHashMap<String, Span>) {
        self.frames.push(Frame::Block(names));
    }

    /// Push a construct frame in its pending state.
    pub(crate) fn push_construct(
        &mut self,
        id: ConstructId,
        surface: &str,
        synthetic: &str,
        binding_span: Span,
    ) {
        self.frames.push(Frame::Construct {
            id,
            surface: surface.to_string(),
            synthetic: synthetic.to_string(),
            binding_span,
            live: false,
        });
    }

    /// Mark the innermost construct frame live.
    pub(crate) fn go_live(&mut self) {
        if let Some(Frame::Construct { live, .. }) = self.frames.last_mut() {
            *live = true;
        }
    }

    pub(crate) fn pop(&mut self) {
        self.frames.pop();
    }

    pub(crate) fn resolve(&self, name: &str) -> Resolution {
        let mut pending = None;
        for frame in self.frames.iter().rev() {
            match frame {
                Frame::Construct {
                    id,
                    surface,
                    synthetic,
                    binding_span,
                    live,
                } if surface == name => {
                    if *live {
                        return Resolution::Construct {
                            id: *id,
                            synthetic: synthetic.clone(),
                            binding_span: *binding_span,
                        };
                    }
                    pending.get_or_insert(*id);
                }
                Frame::Function(names) | Frame::Block(names) => {
                    if let Some(span) = names.get(name) {
                        return Resolution::Declared(*span);
                    }
                }
                Frame::Construct { .. } => {}
            }
        }
        if self.globals.contains(name) {
            Resolution::Global
        } else {
            Resolution::Unbound { pending }
        }
    }
}

// ── Declared names ─────────────────────────────────────────────────────

/// Names a function frame binds: parameters, its own name for function
/// expressions, `var`s anywhere in the body outside nested functions, and
/// the body's top-level declarations.
pub(crate) fn function_names(func: &Function, own_name: bool) -> FxHashMap<String, Span> {
    let mut names = FxHashMap::default();
    if own_name {
        if let Some(name) = &func.name {
            names.insert(name.name.clone(), name.span);
        }
    }
    for param in &func.params {
        names.insert(param.name.name.clone(), param.name.span);
    }
    if let FnBody::Block(stmts) = &func.body {
        collect_hoisted(stmts, &mut names);
        collect_lexical(stmts, &mut names);
    }
    names
}

/// Names a program frame binds.
pub(crate) fn program_names(stmts: &[Stmt]) -> FxHashMap<String, Span> {
    let mut names = FxHashMap::default();
    collect_hoisted(stmts, &mut names);
    collect_lexical(stmts, &mut names);
    names
}

/// Names declared directly in a block.
pub(crate) fn block_names(stmts: &[Stmt]) -> FxHashMap<String, Span> {
    let mut names = FxHashMap::default();
    collect_lexical(stmts, &mut names);
    names
}

/// Declarations directly in `stmts`: `let`/`const`/`var`, function
/// declarations and declaration-form result names.
fn collect_lexical(stmts: &[Stmt], names: &mut FxHashMap<String, Span>) {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::VarDecl(decl) => {
                for d in &decl.declarators {
                    names.insert(d.name.name.clone(), d.name.span);
                }
            }
            StmtKind::FnDecl(func) => {
                if let Some(name) = &func.name {
                    names.insert(name.name.clone(), name.span);
                }
            }
            StmtKind::TempBinding(tb) => {
                if let Some(name) = &tb.result_name {
                    names.insert(name.name.clone(), name.span);
                }
            }
            _ => {}
        }
    }
}

/// `var` declarations at any block depth, not crossing functions.
fn collect_hoisted(stmts: &[Stmt], names: &mut FxHashMap<String, Span>) {
    for stmt in stmts {
        collect_hoisted_stmt(stmt, names);
    }
}

fn collect_hoisted_stmt(stmt: &Stmt, names: &mut FxHashMap<String, Span>) {
    match &stmt.kind {
        StmtKind::VarDecl(decl) if decl.kind == tbind_hir::DeclKind::Var => {
            for d in &decl.declarators {
                names.insert(d.name.name.clone(), d.name.span);
            }
        }
        StmtKind::TempBinding(tb) if tb.qualifier == tbind_hir::DeclKind::Var => {
            if let Some(name) = &tb.result_name {
                names.insert(name.name.clone(), name.span);
            }
        }
        StmtKind::Block(stmts) => collect_hoisted(stmts, names),
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            collect_hoisted_stmt(then_branch, names);
            if let Some(e) = else_branch {
                collect_hoisted_stmt(e, names);
            }
        }
        StmtKind::While { body, .. } => collect_hoisted_stmt(body, names),
        StmtKind::For { init, body, .. } => {
            if let Some(ForInit::VarDecl(decl)) = init {
                if decl.kind == tbind_hir::DeclKind::Var {
                    for d in &decl.declarators {
                        names.insert(d.name.name.clone(), d.name.span);
                    }
                }
            }
            collect_hoisted_stmt(body, names);
        }
        StmtKind::ForOf {
            kind, name, body, ..
        } => {
            if *kind == tbind_hir::DeclKind::Var {
                names.insert(name.name.clone(), name.span);
            }
            collect_hoisted_stmt(body, names);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbind_hir::{Declarator, DeclKind, Ident, Param, VarDecl};

    fn sp(n: u32) -> Span {
        Span::new(n, n + 1)
    }

    fn names(pairs: &[(&str, u32)]) -> FxHashMap<String, Span> {
        pairs.iter().map(|(n, s)| (n.to_string(), sp(*s))).collect()
    }

    #[test]
    fn allocator_counts_up_and_skips_taken_names() {
        let taken: FxHashSet<String> = ["__tb2".to_string()].into_iter().collect();
        let mut names = NameAllocator::new("__tb", taken);
        assert_eq!(names.fresh(), "__tb1");
        assert_eq!(names.fresh(), "__tb3");
        assert_eq!(names.fresh(), "__tb4");
    }

    #[test]
    fn pending_construct_is_skipped() {
        let mut scopes = Scopes::new(Vec::new());
        scopes.push_function(names(&[("x", 0)]));
        scopes.push_construct(ConstructId(0), "$", "__tb1", sp(5));
        assert_eq!(
            scopes.resolve("$"),
            Resolution::Unbound {
                pending: Some(ConstructId(0))
            }
        );
        scopes.go_live();
        assert_eq!(
            scopes.resolve("$"),
            Resolution::Construct {
                id: ConstructId(0),
                synthetic: "__tb1".to_string(),
                binding_span: sp(5),
            }
        );
        assert_eq!(scopes.resolve("x"), Resolution::Declared(sp(0)));
        assert_eq!(scopes.resolve("y"), Resolution::Unbound { pending: None });
    }

    #[test]
    fn step_one_reference_reaches_outer_construct() {
        let mut scopes = Scopes::new(Vec::new());
        scopes.push_construct(ConstructId(0), "$", "__tb1", sp(1));
        scopes.go_live();
        scopes.push_construct(ConstructId(1), "$", "__tb2", sp(2));
        assert!(matches!(
            scopes.resolve("$"),
            Resolution::Construct { id: ConstructId(0), .. }
        ));
        scopes.go_live();
        assert!(matches!(
            scopes.resolve("$"),
            Resolution::Construct { id: ConstructId(1), .. }
        ));
        scopes.pop();
        assert!(matches!(
            scopes.resolve("$"),
            Resolution::Construct { id: ConstructId(0), .. }
        ));
    }

    #[test]
    fn inner_declaration_shadows_construct() {
        let mut scopes = Scopes::new(Vec::new());
        scopes.push_construct(ConstructId(0), "$", "__tb1", sp(1));
        scopes.go_live();
        scopes.push_function(names(&[("$", 9)]));
        assert_eq!(scopes.resolve("$"), Resolution::Declared(sp(9)));
    }

    #[test]
    fn globals_resolve_last() {
        let mut scopes = Scopes::new(vec!["$".to_string()]);
        scopes.push_construct(ConstructId(0), "$", "__tb1", sp(1));
        assert_eq!(scopes.resolve("$"), Resolution::Global);
    }

    #[test]
    fn function_frame_collects_params_and_hoisted_vars() {
        let var = |name: &str, at: u32| {
            Stmt::new(
                StmtKind::VarDecl(VarDecl {
                    kind: DeclKind::Var,
                    declarators: vec![Declarator {
                        name: Ident::new(name, sp(at)),
                        init: None,
                    }],
                }),
                sp(at),
            )
        };
        let nested = Stmt::new(
            StmtKind::If {
                cond: tbind_hir::Expr::ident("c", sp(0)),
                then_branch: Box::new(Stmt::new(StmtKind::Block(vec![var("deep", 7)]), sp(7))),
                else_branch: None,
            },
            sp(6),
        );
        let func = Function {
            name: Some(Ident::new("f", sp(1))),
            params: vec![Param {
                name: Ident::new("a", sp(2)),
                rest: false,
            }],
            body: FnBody::Block(vec![var("top", 4), nested]),
            is_async: false,
            is_arrow: false,
        };
        let names = function_names(&func, true);
        let mut keys: Vec<_> = names.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["a", "deep", "f", "top"]);
        assert!(!function_names(&func, false).contains_key("f"));
    }
}
