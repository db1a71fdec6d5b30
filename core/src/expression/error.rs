//! Expression evaluation errors.
//!
//! Missing data is not an error: unbound variables and absent properties
//! evaluate to `nil`. These errors cover the cases where an expression is
//! well-formed but cannot produce a value.

use thiserror::Error;

use super::ComparisonOp;
use crate::parser::ParseError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("undefined filter `{0}`")]
    UndefinedFilter(String),

    /// A filter received input or arguments it cannot work with.
    #[error("filter `{filter}`: {message}")]
    FilterArgument { filter: String, message: String },

    #[error("cannot compare {left} {op} {right}")]
    Incomparable {
        op: ComparisonOp,
        left: &'static str,
        right: &'static str,
    },

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("division by zero")]
    DivisionByZero,
}

impl EvalError {
    pub fn filter_argument(filter: &str, message: impl Into<String>) -> Self {
        EvalError::FilterArgument {
            filter: filter.to_string(),
            message: message.into(),
        }
    }
}

/// Either half of parse-then-evaluate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}
