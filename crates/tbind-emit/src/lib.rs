//! Host emitter.
//!
//! Prints a HIR program as canonical source text:
//!
//! 1. walk the tree into a Wadler-Lindig `FormatIR` document,
//! 2. print the document within the configured width.
//!
//! Every lowered construct in the tree is bracketed by position marks, so
//! the output comes with a map from generated byte ranges back to the
//! construct's original span. Rejected constructs print their original
//! text verbatim.

pub mod ir;
pub mod printer;
mod walker;

use serde::Serialize;
use tbind_common::span::Span;
use tbind_hir::{ConstructId, Program};

pub use printer::EmitConfig;

/// Links generated code to the construct it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Mapping {
    pub construct: ConstructId,
    /// Byte range in the emitted code.
    pub generated: Span,
    /// Span of the construct in the input.
    pub original: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub code: String,
    /// In output order; an outer construct precedes the ones inside it.
    pub mappings: Vec<Mapping>,
}

impl Emitted {
    /// The innermost mapping whose generated range holds `offset`.
    pub fn mapping_at(&self, offset: u32) -> Option<&Mapping> {
        self.mappings
            .iter()
            .filter(|m| m.generated.start <= offset && offset < m.generated.end)
            .min_by_key(|m| m.generated.len())
    }
}

pub fn emit(program: &Program, config: &EmitConfig) -> Emitted {
    let mut walker = walker::Walker::default();
    let doc = walker.program(program);
    let printed = printer::print(&doc, config);

    let mut mappings: Vec<Mapping> = walker
        .lowered
        .iter()
        .enumerate()
        .map(|(k, (construct, original))| {
            let offset = |id: usize| printed.marks.get(id).copied().unwrap_or(0) as u32;
            Mapping {
                construct: *construct,
                generated: Span::new(offset(2 * k), offset(2 * k + 1)),
                original: *original,
            }
        })
        .collect();
    mappings.sort_by_key(|m| (m.generated.start, std::cmp::Reverse(m.generated.end)));

    Emitted {
        code: printed.text,
        mappings,
    }
}

/// Emit with the default layout.
pub fn emit_default(program: &Program) -> String {
    emit(program, &EmitConfig::default()).code
}
