//! Error types for the HSP interpreter.
//!
//! Two tiers exist.  [`EvalError`] never leaves the expression evaluator's
//! public entry point: it is turned into a `⚠️` log line and a result of 0.
//! [`HspError`] escapes a statement handler and is caught by the per-line
//! guard in [`Interpreter::run`](super::interp::Interpreter::run).

use thiserror::Error;

/// Failure while lexing, parsing, or evaluating an arithmetic expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unexpected token {0}")]
    UnexpectedToken(String),
    #[error("expected ')'")]
    ExpectedRParen,
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("modulo by zero")]
    ModuloByZero,
    #[error("math domain error in {0}")]
    Domain(&'static str),
    #[error("result is not a finite number")]
    NonFinite,
    #[error("variable #{0} holds a string, not a number")]
    NotANumber(String),
    #[error("expression nests too deeply")]
    TooDeep,
}

/// Failure that aborts a single statement.
#[derive(Debug, Error)]
pub enum HspError {
    /// Text matched none of the accepted probability forms.
    #[error("invalid probability '{0}'")]
    Format(String),

    #[error("invalid count '{0}'")]
    InvalidCount(String),

    /// Ordering comparison between a number and a string.
    #[error("cannot compare {left} with {right}")]
    Incomparable { left: String, right: String },

    /// Conditional actions nested past the dispatch limit.
    #[error("conditions nest more than {0} deep")]
    TooDeep(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
