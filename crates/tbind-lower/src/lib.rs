//! The temporary-binding lowering engine.
//!
//! [`lower_source`] runs one compilation unit through the whole pipeline:
//!
//! 1. parse into a lossless CST (`tbind-parser`),
//! 2. build the owned HIR, recognizing each construct and splitting its
//!    step list on the way,
//! 3. walk the HIR once, allocating synthetic names, renaming references,
//!    lowering constructs innermost first and splicing the replacements.
//!
//! Every construct succeeds or fails on its own. The result carries the
//! rewritten program, the diagnostics and the final state of each construct.

pub mod config;
pub mod construct;
pub mod diagnostics;
pub mod hygiene;
pub mod lower;

mod build;
mod pipeline;
mod recognize;
mod splice;
mod transform;

use rustc_hash::FxHashSet;
use tbind_hir::Program;
use tbind_parser::{ParseError, SyntaxKind};
use tracing::debug_span;

pub use config::{Config, ConfigError, LowerOptions, RejectPolicy, Target};
pub use construct::{ConstructReport, ConstructState};
pub use diagnostics::{Diagnostic, DiagnosticCode, Related, Severity};
pub use hygiene::NameAllocator;
pub use lower::{scoped_expression, ScopedExpression};

/// Everything produced for one unit.
#[derive(Debug)]
pub struct LowerResult {
    pub parse_errors: Vec<ParseError>,
    /// The program with every construct spliced or rejected.
    pub program: Program,
    /// Parse errors (as P0001) and engine diagnostics, by source position.
    pub diagnostics: Vec<Diagnostic>,
    pub constructs: Vec<ConstructReport>,
}

impl LowerResult {
    /// No parse errors and no error-severity diagnostics.
    pub fn ok(&self) -> bool {
        self.parse_errors.is_empty() && !self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning)
    }
}

/// Lower one compilation unit. Each call uses a fresh name allocator.
pub fn lower_source(source: &str, options: &LowerOptions) -> LowerResult {
    let _span = debug_span!("lower_source", len = source.len()).entered();

    let parse = tbind_parser::parse(source);
    let mut diagnostics: Vec<Diagnostic> = parse
        .errors()
        .iter()
        .map(Diagnostic::from_parse_error)
        .collect();

    // Every identifier spelled in the unit, so synthetic names never collide.
    let mut taken: FxHashSet<String> = parse
        .syntax()
        .descendants_with_tokens()
        .filter_map(|el| el.into_token())
        .filter(|tok| tok.kind() == SyntaxKind::IDENT)
        .map(|tok| tok.text().to_string())
        .collect();
    taken.extend(options.globals.iter().cloned());

    let mut ledger = construct::Ledger::default();
    let mut program = build::Builder::new(source, &mut ledger, &mut diagnostics).program(&parse.tree());

    transform::Lowerer::new(options, taken, &mut ledger, &mut diagnostics).run(&mut program);

    diagnostics.sort_by_key(|d| (d.span.start, d.span.end));

    LowerResult {
        parse_errors: parse.errors().to_vec(),
        program,
        diagnostics,
        constructs: ledger.into_reports(),
    }
}

/// Parse and build one unit without lowering it. Recognized constructs stay
/// in the tree as `TempBinding` nodes, which `tbind-eval` runs directly.
pub fn parse_program(source: &str) -> (Program, Vec<Diagnostic>) {
    let parse = tbind_parser::parse(source);
    let mut diagnostics: Vec<Diagnostic> = parse
        .errors()
        .iter()
        .map(Diagnostic::from_parse_error)
        .collect();
    let mut ledger = construct::Ledger::default();
    let program = build::Builder::new(source, &mut ledger, &mut diagnostics).program(&parse.tree());
    (program, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_unit_is_ok() {
        let result = lower_source("const($) x = 1, $ + 1;", &LowerOptions::default());
        assert!(result.ok(), "{:?}", result.diagnostics);
        assert_eq!(result.constructs.len(), 1);
        assert_eq!(result.constructs[0].state, ConstructState::Spliced);
        assert_eq!(result.constructs[0].synthetic.as_deref(), Some("__tb1"));
    }

    #[test]
    fn user_identifiers_are_never_allocated() {
        let result = lower_source(
            "let __tb1 = 0; const($) x = 1, $ + __tb1;",
            &LowerOptions::default(),
        );
        assert_eq!(result.constructs[0].synthetic.as_deref(), Some("__tb2"));
    }

    #[test]
    fn parse_errors_fail_the_unit() {
        let result = lower_source("let = ;", &LowerOptions::default());
        assert!(!result.ok());
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::Parse);
    }

    #[test]
    fn parse_program_keeps_constructs() {
        let (program, diagnostics) = parse_program("const($) x = 1, $ + 1;");
        assert!(diagnostics.is_empty());
        assert!(matches!(
            program.body[0].kind,
            tbind_hir::StmtKind::TempBinding(_)
        ));
    }

    #[test]
    fn warnings_do_not_fail_the_unit() {
        let result = lower_source("let x = 1; const(x) y = 2, x;", &LowerOptions::default());
        assert!(result.ok());
        assert!(result.has_warnings());
    }
}
