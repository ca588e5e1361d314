//! Error types for calcnote-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in calcnote-core
#[derive(Debug, Error)]
pub enum Error {
    /// Block index out of bounds
    #[error("Block index {0} out of bounds (count: {1})")]
    BlockOutOfBounds(usize, usize),

    /// Unit symbol not present in the catalogue
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    /// Two quantities combined by an operator that needs equal dimensions
    #[error("Incompatible units for {op}: {left} and {right}")]
    IncompatibleUnits {
        op: &'static str,
        left: String,
        right: String,
    },

    /// Fractional dimension, or a dimension exponent outside the supported range
    #[error("Invalid exponent: {0}")]
    InvalidExponent(String),

    /// Malformed persisted document
    #[error("Malformed document: {0}")]
    Persistence(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    pub(crate) fn incompatible(
        op: &'static str,
        left: impl ToString,
        right: impl ToString,
    ) -> Self {
        Error::IncompatibleUnits {
            op,
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}
