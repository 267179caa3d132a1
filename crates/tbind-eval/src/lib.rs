//! Reference interpreter for the host subset.
//!
//! Runs a HIR [`Program`], lowered or not, and records what `console.log`
//! printed. Tests use it to compare a lowered program with the program's
//! direct meaning; `tbindc run` uses it to execute lowered output.
//!
//! The interpreter is deliberately small: no prototypes, no `try`, and
//! async functions settle synchronously. A function converted to a string
//! gives its inspect form (`[Function: f]`) rather than its source text,
//! since the HIR keeps no source. Evaluation is bounded by a step budget and
//! a call depth so runaway input fails instead of hanging.

pub mod env;
pub mod error;
pub mod value;

mod builtins;
mod interp;

use tbind_hir::Program;
use tracing::{debug, debug_span};

pub use builtins::Native;
pub use error::{EvalError, Result};
pub use value::Value;

use crate::env::Env;
use crate::interp::Interpreter;

/// Evaluation limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    /// Statements and calls executed before giving up.
    pub max_steps: u64,
    /// Nested calls before reporting a stack overflow.
    pub max_depth: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
            max_depth: 64,
        }
    }
}

#[derive(Debug)]
pub struct Outcome {
    /// One entry per `console.log` call, arguments joined by spaces.
    pub output: Vec<String>,
    /// Value of the last top-level expression statement, or the fault that
    /// stopped the run.
    pub result: Result<Value>,
}

impl Outcome {
    /// Output as a terminal would show it.
    pub fn stdout(&self) -> String {
        let mut out = String::new();
        for line in &self.output {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Run `program` in a fresh global scope.
pub fn run(program: &Program, config: &EvalConfig) -> Outcome {
    let _span = debug_span!("eval", stmts = program.body.len()).entered();

    let globals = Env::global();
    builtins::install(&globals);
    let mut interp = Interpreter::new(config);
    let result = interp.run(program, &globals);
    if let Err(err) = &result {
        debug!(%err, "evaluation stopped");
    }
    Outcome {
        output: interp.into_output(),
        result,
    }
}
