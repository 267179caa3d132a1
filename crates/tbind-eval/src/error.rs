use std::fmt;

use tbind_common::span::Span;
use tbind_hir::ConstructId;

use crate::value::Value;

#[derive(Debug, Clone)]
pub enum EvalError {
    /// A `throw` that nothing caught.
    Thrown(Value),
    /// Operation on a value of the wrong kind.
    Type { message: String, span: Span },
    /// Read of a name bound nowhere.
    Reference { name: String, span: Span },
    /// Assignment to a `const` binding.
    ConstAssign { name: String, span: Span },
    /// A construct that failed to lower was reached.
    Rejected(ConstructId),
    /// Statement budget exhausted.
    StepLimit,
    /// Call depth exceeded.
    StackOverflow,
}

impl EvalError {
    pub(crate) fn type_error(message: impl Into<String>, span: Span) -> Self {
        EvalError::Type {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thrown(value) => write!(f, "uncaught exception: {}", value.display()),
            Self::Type { message, .. } => write!(f, "TypeError: {message}"),
            Self::Reference { name, .. } => write!(f, "ReferenceError: {name} is not defined"),
            Self::ConstAssign { name, .. } => {
                write!(f, "TypeError: assignment to constant variable `{name}`")
            }
            Self::Rejected(id) => write!(f, "reached rejected construct {id}"),
            Self::StepLimit => write!(f, "step limit exceeded"),
            Self::StackOverflow => write!(f, "maximum call depth exceeded"),
        }
    }
}

impl std::error::Error for EvalError {}

pub type Result<T> = std::result::Result<T, EvalError>;
