//! Notebook blocks
//!
//! A document is a sequence of [`Block`]s. Text blocks are opaque prose; formula
//! blocks carry source text plus the outputs of the last evaluation pass.

use crate::value::Value;
use std::fmt;

/// One unit of notebook content
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text(TextBlock),
    Formula(FormulaBlock),
}

impl Block {
    /// Create a text block
    pub fn text(content: impl Into<String>) -> Self {
        Block::Text(TextBlock::new(content))
    }

    /// Create a formula block in the pending state
    pub fn formula(source: impl Into<String>) -> Self {
        Block::Formula(FormulaBlock::new(source))
    }

    /// Source text (prose for text blocks, formula for formula blocks)
    pub fn content(&self) -> &str {
        match self {
            Block::Text(t) => &t.content,
            Block::Formula(f) => &f.source,
        }
    }

    pub fn as_formula(&self) -> Option<&FormulaBlock> {
        match self {
            Block::Formula(f) => Some(f),
            Block::Text(_) => None,
        }
    }

    pub fn as_formula_mut(&mut self) -> Option<&mut FormulaBlock> {
        match self {
            Block::Formula(f) => Some(f),
            Block::Text(_) => None,
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, Block::Formula(_))
    }
}

/// Explanatory prose; never evaluated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub content: String,
}

impl TextBlock {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Evaluation status of a formula block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BlockStatus {
    /// Not evaluated since the last edit
    #[default]
    Pending,
    Ok,
    Error,
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BlockStatus::Pending => "pending",
            BlockStatus::Ok => "ok",
            BlockStatus::Error => "error",
        })
    }
}

/// Shape of a formula, decided from its source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FormulaKind {
    /// `name = expr`
    Assignment,
    /// `name(params) = expr`
    FunctionDefinition,
    /// `name = linspace(...)`, `name = [..]`, ...
    ArrayConstructor,
    /// An expression without an assignment target
    Expression,
    /// An `if / elif / else` chain, optionally assigning a name
    Conditional,
}

/// Everything an evaluation pass writes back into a formula block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormulaOutput {
    pub kind: Option<FormulaKind>,
    /// Assigned variable, array or function name
    pub target: Option<String>,
    /// Function parameters (function definitions only)
    pub params: Vec<String>,
    pub value: Option<Value>,
    /// Formatted result, e.g. `12.00 kN/m`
    pub display: Option<String>,
    /// LaTeX form of the formula
    pub typeset: Option<String>,
    /// Compacted unit label of the result
    pub unit: Option<String>,
}

/// A formula with the outputs of its last evaluation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormulaBlock {
    source: String,
    status: BlockStatus,
    output: FormulaOutput,
    error: Option<String>,
}

impl FormulaBlock {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Replace the source text; previous outputs are discarded
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
        self.reset();
    }

    /// Forget the outputs of the previous pass
    pub fn reset(&mut self) {
        self.status = BlockStatus::Pending;
        self.output = FormulaOutput::default();
        self.error = None;
    }

    /// Record a successful evaluation
    pub fn complete(&mut self, output: FormulaOutput) {
        self.status = BlockStatus::Ok;
        self.output = output;
        self.error = None;
    }

    /// Record a failed evaluation, keeping whatever partial output exists
    pub fn fail(&mut self, mut output: FormulaOutput, message: impl Into<String>) {
        let message = message.into();
        output.value = None;
        output.display = Some(format!("Error: {}", message));
        self.status = BlockStatus::Error;
        self.output = output;
        self.error = Some(message);
    }

    /// Restore outputs loaded from a persisted document
    pub fn restore(&mut self, status: BlockStatus, output: FormulaOutput, error: Option<String>) {
        self.status = status;
        self.output = output;
        self.error = error;
    }

    pub fn status(&self) -> BlockStatus {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == BlockStatus::Ok
    }

    pub fn is_error(&self) -> bool {
        self.status == BlockStatus::Error
    }

    pub fn output(&self) -> &FormulaOutput {
        &self.output
    }

    pub fn kind(&self) -> Option<FormulaKind> {
        self.output.kind
    }

    pub fn is_function_definition(&self) -> bool {
        self.output.kind == Some(FormulaKind::FunctionDefinition)
    }

    pub fn target(&self) -> Option<&str> {
        self.output.target.as_deref()
    }

    pub fn params(&self) -> &[String] {
        &self.output.params
    }

    pub fn value(&self) -> Option<&Value> {
        self.output.value.as_ref()
    }

    /// Magnitude of the result in display units
    pub fn numeric_value(&self) -> Option<f64> {
        self.output.value.as_ref().and_then(Value::magnitude)
    }

    pub fn array_values(&self) -> Option<&[Value]> {
        self.output.value.as_ref().and_then(Value::as_array)
    }

    pub fn display(&self) -> Option<&str> {
        self.output.display.as_deref()
    }

    pub fn typeset(&self) -> Option<&str> {
        self.output.typeset.as_deref()
    }

    pub fn unit(&self) -> Option<&str> {
        self.output.unit.as_deref()
    }

    /// Error message of the last pass, if it failed
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_block_is_pending() {
        let block = FormulaBlock::new("x = 1");
        assert_eq!(block.status(), BlockStatus::Pending);
        assert_eq!(block.source(), "x = 1");
        assert!(block.value().is_none());
    }

    #[test]
    fn test_fail_keeps_typeset() {
        let mut block = FormulaBlock::new("y = 1 m + 1 s");
        block.fail(
            FormulaOutput {
                typeset: Some("y = 1 + 1".into()),
                value: Some(Value::Number(2.0)),
                ..Default::default()
            },
            "Incompatible units",
        );
        assert!(block.is_error());
        assert_eq!(block.typeset(), Some("y = 1 + 1"));
        assert!(block.value().is_none());
        assert_eq!(block.display(), Some("Error: Incompatible units"));
    }

    #[test]
    fn test_set_source_resets() {
        let mut block = FormulaBlock::new("x = 1");
        block.complete(FormulaOutput {
            value: Some(Value::Number(1.0)),
            ..Default::default()
        });
        assert!(block.is_ok());
        block.set_source("x = 2");
        assert_eq!(block.status(), BlockStatus::Pending);
        assert!(block.value().is_none());
    }

    #[test]
    fn test_block_accessors() {
        let text = Block::text("Intro");
        assert!(!text.is_formula());
        assert_eq!(text.content(), "Intro");
        assert!(Block::formula("x = 1").as_formula().is_some());
    }
}
