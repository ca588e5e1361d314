//! Sequence generators
//!
//! `linspace`, `arange` and `range` build arrays. Endpoints may carry units as
//! long as they share a dimension; the step of `arange` must match it too.

use super::{integer_arg, quantity_arg};
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{EvalScope, FormulaValue};
use calcnote_core::{Dimension, Quantity};

/// Longest sequence a generator may produce
pub const MAX_SEQUENCE_LEN: usize = 1_000_000;

fn check_len(function: &str, len: f64) -> FormulaResult<usize> {
    if !len.is_finite() || len > MAX_SEQUENCE_LEN as f64 {
        return Err(FormulaError::value(format!(
            "{}() would produce more than {} values",
            function, MAX_SEQUENCE_LEN
        )));
    }
    Ok(len.max(0.0) as usize)
}

fn same_dimension(function: &str, quantities: &[Quantity]) -> FormulaResult<Dimension> {
    let dimension = quantities
        .first()
        .map(Quantity::dimension)
        .unwrap_or(Dimension::NONE);
    match quantities.iter().find(|q| q.dimension() != dimension) {
        Some(other) => Err(FormulaError::unit(format!(
            "{}() arguments have mixed dimensions: {} and {}",
            function,
            dimension,
            other.dimension()
        ))),
        None => Ok(dimension),
    }
}

fn build(values: impl Iterator<Item = f64>, dimension: Dimension) -> FormulaValue {
    FormulaValue::Array(
        values
            .map(|v| FormulaValue::from_quantity(Quantity::from_si(v, dimension)))
            .collect(),
    )
}

/// LINSPACE function: `count` evenly spaced values from `start` to `stop`
pub fn fn_linspace(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    let start = quantity_arg(&args[0], "linspace")?;
    let stop = quantity_arg(&args[1], "linspace")?;
    let count = integer_arg(&args[2], "linspace")?;
    let dimension = same_dimension("linspace", &[start, stop])?;

    if count <= 0 {
        return Err(FormulaError::value(format!(
            "linspace() count must be positive, got {}",
            count
        )));
    }
    let count = check_len("linspace", count as f64)?;
    if count == 1 {
        return Ok(build(std::iter::once(start.si_value()), dimension));
    }

    let (a, b) = (start.si_value(), stop.si_value());
    let step = (b - a) / (count - 1) as f64;
    Ok(build(
        (0..count).map(|i| if i == count - 1 { b } else { a + step * i as f64 }),
        dimension,
    ))
}

/// Split `(stop)`, `(start, stop)` or `(start, stop, step)` arguments
fn bounds(args: &[FormulaValue], function: &str) -> FormulaResult<[Quantity; 3]> {
    let q = |i: usize| quantity_arg(&args[i], function);
    match args.len() {
        1 => {
            let stop = q(0)?;
            Ok([
                Quantity::from_si(0.0, stop.dimension()),
                stop,
                Quantity::from_si(1.0, stop.dimension()),
            ])
        }
        2 => {
            let (start, stop) = (q(0)?, q(1)?);
            Ok([start, stop, Quantity::from_si(1.0, start.dimension())])
        }
        _ => Ok([q(0)?, q(1)?, q(2)?]),
    }
}

fn stepped(function: &str, [start, stop, step]: [Quantity; 3]) -> FormulaResult<FormulaValue> {
    let dimension = same_dimension(function, &[start, stop, step])?;
    if step.si_value() == 0.0 {
        return Err(FormulaError::value(format!(
            "{}() step cannot be zero",
            function
        )));
    }

    let (a, b, h) = (start.si_value(), stop.si_value(), step.si_value());
    let count = check_len(function, ((b - a) / h).ceil())?;
    Ok(build((0..count).map(|i| a + h * i as f64), dimension))
}

/// ARANGE function: values from `start` advancing by `step`, excluding `stop`
pub fn fn_arange(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    stepped("arange", bounds(args, "arange")?)
}

/// RANGE function: like `arange`, integers only
pub fn fn_range(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    for arg in args {
        integer_arg(arg, "range")?;
    }
    stepped("range", bounds(args, "range")?)
}
