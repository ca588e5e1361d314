//! Evaluation context
//!
//! The accumulator of one evaluation pass: named values, user functions,
//! arrays, informational logs and per-block errors. A new pass starts from a
//! fresh context, which also owns a fresh [`SymbolRegistry`].

use crate::ast::Expr;
use crate::error::{ErrorKind, FormulaError};
use crate::parser::NameTable;
use crate::symbol::SymbolRegistry;
use calcnote_core::Value;
use indexmap::IndexMap;
use std::fmt;

/// Default limit for nested user-function calls
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

/// A scalar assigned by a block
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRecord {
    pub name: String,
    /// Typeset form of the defining expression
    pub expression: String,
    pub value: Value,
    /// Display unit label
    pub unit: Option<String>,
}

impl VariableRecord {
    pub fn new(name: impl Into<String>, expression: impl Into<String>, value: Value) -> Self {
        let unit = value.unit_label();
        Self {
            name: name.into(),
            expression: expression.into(),
            value,
            unit,
        }
    }

    /// Magnitude in display units
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.magnitude()
    }
}

/// A function defined by a block (`f(x) = ...`)
#[derive(Debug, Clone, PartialEq)]
pub struct UserFunction {
    pub name: String,
    pub params: Vec<String>,
    pub body: Expr,
    /// Typeset form of the body
    pub typeset: String,
}

impl UserFunction {
    pub fn new(
        name: impl Into<String>,
        params: Vec<String>,
        body: Expr,
        typeset: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            body,
            typeset: typeset.into(),
        }
    }
}

/// A named sequence of values
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayRecord {
    pub name: String,
    pub values: Vec<Value>,
    pub unit: Option<String>,
}

impl ArrayRecord {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        let unit = values.iter().find_map(Value::unit_label);
        Self {
            name: name.into(),
            values,
            unit,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Element magnitudes in display units (non-numeric elements are skipped)
    pub fn numbers(&self) -> Vec<f64> {
        self.values.iter().filter_map(Value::magnitude).collect()
    }
}

/// Informational, non-fatal notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Index of the block in the document
    pub block: usize,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block {}: {}", self.block, self.message)
    }
}

/// A block-local failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockError {
    /// Index of the block in the document
    pub block: usize,
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for BlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block {}: {}: {}", self.block, self.kind, self.message)
    }
}

/// Context for one evaluation pass
pub struct EvaluationContext {
    variables: IndexMap<String, VariableRecord>,
    functions: IndexMap<String, UserFunction>,
    arrays: IndexMap<String, ArrayRecord>,
    logs: Vec<LogEntry>,
    errors: Vec<BlockError>,
    symbols: SymbolRegistry,
    max_call_depth: usize,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self {
            variables: IndexMap::new(),
            functions: IndexMap::new(),
            arrays: IndexMap::new(),
            logs: Vec::new(),
            errors: Vec::new(),
            symbols: SymbolRegistry::new(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl EvaluationContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limit for nested user-function calls
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    pub fn symbols(&self) -> &SymbolRegistry {
        &self.symbols
    }

    // === Lookups ===

    pub fn variables(&self) -> &IndexMap<String, VariableRecord> {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&VariableRecord> {
        self.variables.get(name)
    }

    /// Magnitude of a variable in display units
    pub fn numeric_value(&self, name: &str) -> Option<f64> {
        self.variables.get(name).and_then(VariableRecord::numeric_value)
    }

    pub fn functions(&self) -> &IndexMap<String, UserFunction> {
        &self.functions
    }

    pub fn function(&self, name: &str) -> Option<&UserFunction> {
        self.functions.get(name)
    }

    pub fn arrays(&self) -> &IndexMap<String, ArrayRecord> {
        &self.arrays
    }

    pub fn array(&self, name: &str) -> Option<&ArrayRecord> {
        self.arrays.get(name)
    }

    /// Value bound to `name`, from either the variables or the arrays
    pub fn value(&self, name: &str) -> Option<Value> {
        if let Some(var) = self.variables.get(name) {
            return Some(var.value.clone());
        }
        self.arrays
            .get(name)
            .map(|arr| Value::Array(arr.values.clone()))
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn errors(&self) -> &[BlockError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    // === Writes ===
    //
    // A name belongs to exactly one of variables, functions and arrays; the
    // last definition wins.

    pub fn define_variable(&mut self, record: VariableRecord) {
        self.functions.shift_remove(&record.name);
        self.arrays.shift_remove(&record.name);
        self.variables.insert(record.name.clone(), record);
    }

    pub fn define_function(&mut self, function: UserFunction) {
        self.variables.shift_remove(&function.name);
        self.arrays.shift_remove(&function.name);
        self.functions.insert(function.name.clone(), function);
    }

    pub fn define_array(&mut self, record: ArrayRecord) {
        self.variables.shift_remove(&record.name);
        self.functions.shift_remove(&record.name);
        self.arrays.insert(record.name.clone(), record);
    }

    /// Append an informational notice for a block
    pub fn log(&mut self, block: usize, message: impl Into<String>) {
        self.logs.push(LogEntry {
            block,
            message: message.into(),
        });
    }

    /// Append a block failure
    pub fn record_error(&mut self, block: usize, error: &FormulaError) {
        self.errors.push(BlockError {
            block,
            kind: error.kind(),
            message: error.message().to_string(),
        });
    }
}

impl NameTable for EvaluationContext {
    fn is_value(&self, name: &str) -> bool {
        self.variables.contains_key(name) || self.arrays.contains_key(name)
    }

    fn is_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

impl fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("variables", &self.variables.keys().collect::<Vec<_>>())
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("arrays", &self.arrays.keys().collect::<Vec<_>>())
            .field("logs", &self.logs.len())
            .field("errors", &self.errors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_writer_wins() {
        let mut ctx = EvaluationContext::new();
        ctx.define_variable(VariableRecord::new("x", "1", Value::Number(1.0)));
        ctx.define_variable(VariableRecord::new("y", "2", Value::Number(2.0)));
        ctx.define_variable(VariableRecord::new("x", "3", Value::Number(3.0)));

        assert_eq!(ctx.numeric_value("x"), Some(3.0));
        let names: Vec<&str> = ctx.variables().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn test_names_are_unique_across_kinds() {
        let mut ctx = EvaluationContext::new();
        ctx.define_variable(VariableRecord::new("a", "1", Value::Number(1.0)));
        ctx.define_array(ArrayRecord::new("a", vec![Value::Number(1.0)]));

        assert!(ctx.variable("a").is_none());
        assert_eq!(ctx.array("a").map(ArrayRecord::len), Some(1));
        assert!(ctx.is_value("a"));
        assert!(!ctx.is_function("a"));
        assert_eq!(ctx.value("a"), Some(Value::Array(vec![Value::Number(1.0)])));
    }

    #[test]
    fn test_logs_and_errors_append() {
        let mut ctx = EvaluationContext::new();
        ctx.log(0, "note");
        ctx.record_error(1, &FormulaError::value("Division by zero"));
        ctx.record_error(3, &FormulaError::parse("Unknown identifier: q"));

        assert_eq!(ctx.logs().len(), 1);
        assert_eq!(ctx.errors().len(), 2);
        assert_eq!(ctx.errors()[0].kind, ErrorKind::ValueError);
        assert_eq!(
            ctx.errors()[1].to_string(),
            "Block 3: ParseError: Unknown identifier: q"
        );
    }
}
