//! # calcnote
//!
//! A calculation notebook engine.
//!
//! A notebook is an ordered list of text and formula blocks. Evaluating it runs
//! every formula from top to bottom against a shared context, producing for
//! each block a value (with physical units), a display string and a LaTeX
//! form. A failing block never stops the rest of the document.
//!
//! ## Features
//!
//! - Assignments, user-defined functions, arrays and `if / elif / else` chains
//! - Unit-aware arithmetic with automatic unit compaction (`MPa * mm` → `kN/m`)
//! - A closed, side-effect-free formula language with a strict and a tolerant
//!   dialect
//! - JSON notebook files
//!
//! ## Example
//!
//! ```rust
//! use calcnote::prelude::*;
//!
//! let mut doc = Document::new();
//! doc.add_text("Line load on a strip footing");
//! doc.add_formula("L = 3 MPa");
//! doc.add_formula("B = 4 mm");
//! doc.add_formula("P = B * L");
//!
//! let ctx = doc.evaluate();
//! assert!(!ctx.has_errors());
//! assert_eq!(doc.formula(3).and_then(|b| b.display()), Some("12.00 kN/m"));
//!
//! // Save to file
//! // doc.save("footing.json").unwrap();
//! ```

pub mod calculation;
pub mod persist;
pub mod prelude;

// Re-export calculation types
pub use calculation::{DocumentEvaluationExt, EvaluationOptions, EvaluationStats};

// Re-export core types
pub use calcnote_core::{
    // Blocks
    Block,
    BlockStatus,
    // Units
    Dimension,
    Document,
    // Error types
    Error,
    FormulaBlock,
    FormulaKind,
    FormulaOutput,
    Quantity,
    Result,
    TextBlock,
    UnitExpr,
    // Values
    Value,
};

// Re-export formula types
pub use calcnote_formula::{
    evaluate_block, ArrayRecord, BlockError, BlockOptions, DisplayOptions, ErrorKind,
    EvaluationContext, FormulaError, FormulaResult, LogEntry, UserFunction, VariableRecord,
    DEFAULT_MAX_CALL_DEPTH,
};

use std::fs;
use std::path::Path;

/// Extension trait for Document to add file I/O
pub trait DocumentExt {
    /// Open a notebook from a JSON file
    fn open<P: AsRef<Path>>(path: P) -> Result<Document>;

    /// Save the notebook, including cached results, to a JSON file
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()>;
}

impl DocumentExt for Document {
    fn open<P: AsRef<Path>>(path: P) -> Result<Document> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| Error::other(format!("Failed to read {}: {}", path.display(), e)))?;
        persist::from_json_str(&json)
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = persist::to_json_string(self)?;
        fs::write(path, json)
            .map_err(|e| Error::other(format!("Failed to write {}: {}", path.display(), e)))
    }
}
