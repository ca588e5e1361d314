//! Document evaluation pass
//!
//! Evaluates every formula block of a document from top to bottom against a
//! fresh [`EvaluationContext`]. Each block sees exactly the definitions of
//! the blocks above it. Block failures are contained: they are recorded in
//! the context and on the block, and the pass always runs to the end.
//!
//! # Example
//!
//! ```rust
//! use calcnote::prelude::*;
//!
//! let mut doc = Document::new();
//! doc.add_formula("x = 1");
//! doc.add_formula("y = undefined_name");
//! doc.add_formula("z = x + 1");
//!
//! let ctx = doc.evaluate();
//! assert_eq!(ctx.errors().len(), 1);
//! assert_eq!(ctx.numeric_value("z"), Some(2.0));
//! ```

use crate::{
    evaluate_block, BlockOptions, BlockStatus, DisplayOptions, Document, EvaluationContext,
    DEFAULT_MAX_CALL_DEPTH,
};
use log::{debug, info};

/// Options for a document evaluation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationOptions {
    /// Digits after the decimal point in display strings (default: 2)
    pub decimals: usize,
    /// Arrays longer than this are abbreviated in display strings (default: 5)
    pub array_preview: usize,
    /// Show results in the simplest prefixed unit (default: true)
    pub compact_units: bool,
    /// Maximum nesting of user-function calls (default: 64)
    pub max_call_depth: usize,
    /// Retry failed strict parses in the tolerant dialect (default: true)
    pub tolerant_fallback: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            decimals: 2,
            array_preview: 5,
            compact_units: true,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            tolerant_fallback: true,
        }
    }
}

impl EvaluationOptions {
    fn block_options(&self) -> BlockOptions {
        BlockOptions {
            display: DisplayOptions {
                decimals: self.decimals,
                array_preview: self.array_preview,
                compact_units: self.compact_units,
            },
            tolerant_fallback: self.tolerant_fallback,
        }
    }
}

/// Counts from an evaluated document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationStats {
    /// Total number of blocks
    pub block_count: usize,
    /// Number of formula blocks
    pub formula_count: usize,
    /// Formula blocks that evaluated successfully
    pub ok: usize,
    /// Formula blocks that failed
    pub errors: usize,
    /// Informational notices recorded during the pass
    pub logs: usize,
}

impl EvaluationStats {
    /// Summarize a document after a pass
    pub fn collect(document: &Document, ctx: &EvaluationContext) -> Self {
        let mut stats = EvaluationStats {
            block_count: document.len(),
            logs: ctx.logs().len(),
            ..Default::default()
        };
        for (_, block) in document.formula_blocks() {
            stats.formula_count += 1;
            match block.status() {
                BlockStatus::Ok => stats.ok += 1,
                BlockStatus::Error => stats.errors += 1,
                BlockStatus::Pending => {}
            }
        }
        stats
    }
}

/// Extension trait for Document to add evaluation methods
pub trait DocumentEvaluationExt {
    /// Evaluate all formula blocks with default options
    fn evaluate(&mut self) -> EvaluationContext;

    /// Evaluate all formula blocks with custom options
    fn evaluate_with_options(&mut self, options: &EvaluationOptions) -> EvaluationContext;
}

impl DocumentEvaluationExt for Document {
    fn evaluate(&mut self) -> EvaluationContext {
        self.evaluate_with_options(&EvaluationOptions::default())
    }

    fn evaluate_with_options(&mut self, options: &EvaluationOptions) -> EvaluationContext {
        let mut ctx = EvaluationContext::new().with_max_call_depth(options.max_call_depth);
        let block_options = options.block_options();
        info!("evaluating document with {} blocks", self.len());

        for (index, block) in self.blocks_mut().enumerate() {
            let Some(formula) = block.as_formula_mut() else {
                continue;
            };
            let outcome = evaluate_block(formula.source(), index, &mut ctx, &block_options);
            match outcome.error {
                None => formula.complete(outcome.output),
                Some(error) => {
                    debug!("block {} failed: {}", index, error);
                    formula.fail(outcome.output, error.to_string());
                }
            }
        }

        info!(
            "evaluation finished: {} variables, {} functions, {} arrays, {} errors, {} logs",
            ctx.variables().len(),
            ctx.functions().len(),
            ctx.arrays().len(),
            ctx.errors().len(),
            ctx.logs().len()
        );
        ctx
    }
}
