//! Higher-order functions
//!
//! `sweep(f, xs)` maps a unary function over a sequence; `map2(f, xs, ys)`
//! maps a binary function over two sequences pairwise.

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{EvalScope, FormulaValue};
use crate::symbol::Symbol;

fn function_arg<'v>(value: &'v FormulaValue, function: &str) -> FormulaResult<&'v Symbol> {
    match value {
        FormulaValue::Function(symbol) => Ok(symbol),
        other => Err(FormulaError::value(format!(
            "{}() expects a function as its first argument, got {}",
            function,
            other.type_name()
        ))),
    }
}

fn sequence_arg<'v>(value: &'v FormulaValue, function: &str) -> FormulaResult<&'v [FormulaValue]> {
    value.as_array().ok_or_else(|| {
        FormulaError::value(format!(
            "{}() expects an array, got {}",
            function,
            value.type_name()
        ))
    })
}

/// SWEEP function: `[f(x) for x in xs]`
pub fn fn_sweep(args: &[FormulaValue], scope: &EvalScope) -> FormulaResult<FormulaValue> {
    let f = function_arg(&args[0], "sweep")?;
    let xs = sequence_arg(&args[1], "sweep")?;

    xs.iter()
        .map(|x| scope.call_function(f, vec![x.clone()]))
        .collect::<FormulaResult<Vec<_>>>()
        .map(FormulaValue::Array)
}

/// MAP2 function: `[f(x, y) for x, y in zip(xs, ys)]`
pub fn fn_map2(args: &[FormulaValue], scope: &EvalScope) -> FormulaResult<FormulaValue> {
    let f = function_arg(&args[0], "map2")?;
    let xs = sequence_arg(&args[1], "map2")?;
    let ys = sequence_arg(&args[2], "map2")?;

    if xs.len() != ys.len() {
        return Err(FormulaError::value(format!(
            "map2() sequences have different lengths: {} and {}",
            xs.len(),
            ys.len()
        )));
    }

    xs.iter()
        .zip(ys)
        .map(|(x, y)| scope.call_function(f, vec![x.clone(), y.clone()]))
        .collect::<FormulaResult<Vec<_>>>()
        .map(FormulaValue::Array)
}
