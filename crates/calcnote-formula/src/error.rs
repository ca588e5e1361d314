//! Formula error types

use std::fmt;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while classifying, parsing or evaluating a formula
///
/// Every variant is local to one block: the document pass records it and moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Unsupported syntax or a name outside the allowed vocabulary
    #[error("{0}")]
    Parse(String),

    /// Dimension mismatch or illegal unit operation
    #[error("{0}")]
    Unit(String),

    /// No branch of a conditional matched and there is no `else`
    #[error("{0}")]
    Conditional(String),

    /// Invalid numeric or sequence parameters
    #[error("{0}")]
    Value(String),
}

impl FormulaError {
    pub fn parse(msg: impl Into<String>) -> Self {
        FormulaError::Parse(msg.into())
    }

    pub fn unit(msg: impl Into<String>) -> Self {
        FormulaError::Unit(msg.into())
    }

    pub fn value(msg: impl Into<String>) -> Self {
        FormulaError::Value(msg.into())
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormulaError::Parse(_) => ErrorKind::ParseError,
            FormulaError::Unit(_) => ErrorKind::UnitError,
            FormulaError::Conditional(_) => ErrorKind::ConditionalError,
            FormulaError::Value(_) => ErrorKind::ValueError,
        }
    }

    /// Message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            FormulaError::Parse(m)
            | FormulaError::Unit(m)
            | FormulaError::Conditional(m)
            | FormulaError::Value(m) => m,
        }
    }
}

impl From<calcnote_core::Error> for FormulaError {
    fn from(err: calcnote_core::Error) -> Self {
        use calcnote_core::Error as CoreError;
        match err {
            CoreError::UnknownUnit(_)
            | CoreError::IncompatibleUnits { .. }
            | CoreError::InvalidExponent(_) => FormulaError::Unit(err.to_string()),
            other => FormulaError::Value(other.to_string()),
        }
    }
}

/// Error categories reported in the context's error list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ParseError,
    UnitError,
    ConditionalError,
    ValueError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::ParseError => "ParseError",
            ErrorKind::UnitError => "UnitError",
            ErrorKind::ConditionalError => "ConditionalError",
            ErrorKind::ValueError => "ValueError",
        })
    }
}
