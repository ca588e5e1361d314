//! Prelude module - common imports for calcnote users
//!
//! ```rust
//! use calcnote::prelude::*;
//! ```

pub use crate::{
    // Blocks
    Block,
    BlockStatus,
    // Extension traits
    DocumentEvaluationExt,
    DocumentExt,
    // Main types
    Document,
    // Error types
    Error,
    ErrorKind,
    // Evaluation types
    EvaluationContext,
    EvaluationOptions,
    EvaluationStats,
    FormulaBlock,
    FormulaKind,
    Quantity,
    Result,
    TextBlock,
    Value,
};
