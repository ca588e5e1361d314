//! # calcnote-core
//!
//! Core data structures for the calcnote calculation notebook.
//!
//! This crate provides the fundamental types used throughout calcnote:
//! - [`Dimension`], [`UnitExpr`] and the unit catalogue
//! - [`Quantity`] - a magnitude with a physical unit, and unit compaction
//! - [`Value`] - a stored evaluation result
//! - [`Block`], [`FormulaBlock`], [`TextBlock`] - notebook content
//! - [`Document`] - the ordered sequence of blocks
//!
//! ## Example
//!
//! ```rust
//! use calcnote_core::{Quantity, UnitExpr};
//!
//! let stress = Quantity::new(3.0, &UnitExpr::parse("MPa").unwrap()).unwrap();
//! let width = Quantity::new(4.0, &UnitExpr::parse("mm").unwrap()).unwrap();
//! let line_load = stress.mul(&width).unwrap().compact();
//!
//! assert_eq!(line_load.unit_label().as_deref(), Some("kN/m"));
//! ```

pub mod block;
pub mod document;
pub mod error;
pub mod quantity;
pub mod unit;
pub mod value;

// Re-exports for convenience
pub use block::{Block, BlockStatus, FormulaBlock, FormulaKind, FormulaOutput, TextBlock};
pub use document::Document;
pub use error::{Error, Result};
pub use quantity::{Compacted, Quantity};
pub use unit::{
    catalogue, is_unit_symbol, lookup_unit, BaseDimension, Dimension, UnitDef, UnitExpr,
    UnitFactor,
};
pub use value::Value;
