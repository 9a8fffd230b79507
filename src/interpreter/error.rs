use crate::tco::TransformError;
use thiserror::Error;

/// Errors raised while executing Serval code.
///
/// Domain errors propagate unchanged through the trampoline; the driver
/// only ever consumes tail-call transfers, never errors.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    #[error("name '{0}' is not defined")]
    NameError(String),

    #[error("'{0}' object is not callable")]
    NotCallable(String),

    #[error("{0}")]
    TypeError(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    IntegerOverflow,

    #[error("list index out of range")]
    IndexError,

    #[error("{func}() takes {expected} positional arguments but {got} were given")]
    Arity {
        func: String,
        expected: usize,
        got: usize,
    },

    #[error("{func}() got an unexpected keyword argument '{keyword}'")]
    UnexpectedKeyword { func: String, keyword: String },

    #[error("maximum recursion depth exceeded (limit {limit})")]
    RecursionLimit { limit: usize },

    #[error("unsupported decorator: {0}")]
    UnsupportedDecorator(String),

    #[error(transparent)]
    Transform(#[from] TransformError),

    /// A tail-call transfer reached code that is not a trampoline loop.
    /// Indicates a mismatch between registry membership and transformation,
    /// which is a defect, not a recoverable condition.
    #[error("internal error: {0}")]
    Internal(String),
}
