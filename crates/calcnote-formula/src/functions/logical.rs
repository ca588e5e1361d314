//! Logical functions
//!
//! Function forms of the `and`/`or`/`not` operators. Unlike the operators,
//! these evaluate every argument.

use super::flatten;
use crate::error::FormulaResult;
use crate::evaluator::{EvalScope, FormulaValue};

/// AND function: true when every argument is truthy
pub fn fn_and(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    for arg in flatten(args) {
        if !arg.truthy()? {
            return Ok(FormulaValue::Boolean(false));
        }
    }
    Ok(FormulaValue::Boolean(true))
}

/// OR function: true when any argument is truthy
pub fn fn_or(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    for arg in flatten(args) {
        if arg.truthy()? {
            return Ok(FormulaValue::Boolean(true));
        }
    }
    Ok(FormulaValue::Boolean(false))
}

/// NOT function
pub fn fn_not(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(!args[0].truthy()?))
}
