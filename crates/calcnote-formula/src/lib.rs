//! # calcnote-formula
//!
//! Formula language for calcnote notebooks.
//!
//! This crate provides:
//! - Block classification (assignment, function definition, array
//!   constructor, expression, `if / elif / else` chain)
//! - A safe parser with a strict and a tolerant dialect (text → AST)
//! - Unit-aware evaluation against a per-pass [`EvaluationContext`]
//! - The built-in function library
//! - LaTeX typesetting and result display strings
//!
//! ## Example
//!
//! ```rust
//! use calcnote_formula::{evaluate_block, BlockOptions, EvaluationContext};
//!
//! let mut ctx = EvaluationContext::new();
//! let options = BlockOptions::default();
//! evaluate_block("f(x) = x**2 + 3*x + 2", 0, &mut ctx, &options);
//! let outcome = evaluate_block("f(2)", 1, &mut ctx, &options);
//! assert_eq!(outcome.output.display.as_deref(), Some("12.00"));
//! ```

pub mod ast;
pub mod block;
pub mod classify;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod format;
pub mod functions;
pub mod parser;
pub mod symbol;
pub mod typeset;

pub use ast::{BinaryOperator, Constant, Expr, UnaryOperator};
pub use block::{evaluate_block, BlockOptions, BlockOutcome};
pub use classify::{classify, Statement};
pub use context::{
    ArrayRecord, BlockError, EvaluationContext, LogEntry, UserFunction, VariableRecord,
    DEFAULT_MAX_CALL_DEPTH,
};
pub use error::{ErrorKind, FormulaError, FormulaResult};
pub use evaluator::{evaluate, EvalScope, FormulaValue};
pub use format::DisplayOptions;
pub use parser::{parse_expression, parse_with_fallback, NameTable, ParseMode, ParseOutcome};
pub use symbol::{Symbol, SymbolRegistry};
