//! Math functions
//!
//! Unary functions map element-wise over arrays. Transcendental functions
//! require dimensionless input; `sqrt` and `abs` carry units through.

use super::{finite, integer_arg, map_elementwise, number_arg, quantity_arg};
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{EvalScope, FormulaValue};

/// SQRT function; the root of an area is a length
pub fn fn_sqrt(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    map_elementwise(&args[0], &|v| {
        let q = quantity_arg(v, "sqrt")?;
        if q.si_value() < 0.0 {
            return Err(FormulaError::value(
                "Math domain error: sqrt() of a negative number",
            ));
        }
        Ok(FormulaValue::from_quantity(q.sqrt()?))
    })
}

/// ABS function
pub fn fn_abs(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    map_elementwise(&args[0], &|v| {
        let q = quantity_arg(v, "abs")?;
        let sign = if q.si_value() < 0.0 { -1.0 } else { 1.0 };
        Ok(FormulaValue::from_quantity(q.scale(sign)))
    })
}

/// Apply a dimensionless `f64 -> f64` function element-wise
fn unary(
    args: &[FormulaValue],
    name: &'static str,
    f: fn(f64) -> f64,
) -> FormulaResult<FormulaValue> {
    map_elementwise(&args[0], &|v| {
        let x = number_arg(v, name)?;
        Ok(FormulaValue::Number(finite(name, f(x))?))
    })
}

/// Like [`unary`], rejecting inputs outside `valid`
fn unary_domain(
    args: &[FormulaValue],
    name: &'static str,
    valid: fn(f64) -> bool,
    f: fn(f64) -> f64,
) -> FormulaResult<FormulaValue> {
    map_elementwise(&args[0], &|v| {
        let x = number_arg(v, name)?;
        if !valid(x) {
            return Err(FormulaError::value(format!(
                "Math domain error: {}({})",
                name, x
            )));
        }
        Ok(FormulaValue::Number(finite(name, f(x))?))
    })
}

pub fn fn_sin(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    unary(args, "sin", f64::sin)
}

pub fn fn_cos(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    unary(args, "cos", f64::cos)
}

pub fn fn_tan(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    unary(args, "tan", f64::tan)
}

pub fn fn_asin(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    unary_domain(args, "asin", |x| (-1.0..=1.0).contains(&x), f64::asin)
}

pub fn fn_acos(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    unary_domain(args, "acos", |x| (-1.0..=1.0).contains(&x), f64::acos)
}

pub fn fn_atan(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    unary(args, "atan", f64::atan)
}

/// ATAN2 function; both sides may carry the same unit
pub fn fn_atan2(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    let y = quantity_arg(&args[0], "atan2")?;
    let x = quantity_arg(&args[1], "atan2")?;
    if y.dimension() != x.dimension() {
        return Err(FormulaError::unit(format!(
            "atan2() requires arguments of the same dimension, got {} and {}",
            y.dimension(),
            x.dimension()
        )));
    }
    Ok(FormulaValue::Number(y.si_value().atan2(x.si_value())))
}

pub fn fn_sinh(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    unary(args, "sinh", f64::sinh)
}

pub fn fn_cosh(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    unary(args, "cosh", f64::cosh)
}

pub fn fn_tanh(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    unary(args, "tanh", f64::tanh)
}

pub fn fn_exp(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    unary(args, "exp", f64::exp)
}

/// LOG function: natural logarithm, or `log(x, base)`
pub fn fn_log(args: &[FormulaValue], scope: &EvalScope) -> FormulaResult<FormulaValue> {
    let base = match args.get(1) {
        None => return fn_ln(args, scope),
        Some(base) => number_arg(base, "log")?,
    };
    if base <= 0.0 || base == 1.0 {
        return Err(FormulaError::value(format!(
            "Math domain error: log() base {}",
            base
        )));
    }
    map_elementwise(&args[0], &|v| {
        let x = number_arg(v, "log")?;
        if x <= 0.0 {
            return Err(FormulaError::value(format!("Math domain error: log({})", x)));
        }
        Ok(FormulaValue::Number(x.ln() / base.ln()))
    })
}

pub fn fn_ln(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    unary_domain(args, "log", |x| x > 0.0, f64::ln)
}

pub fn fn_log10(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    unary_domain(args, "log10", |x| x > 0.0, f64::log10)
}

pub fn fn_floor(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    unary(args, "floor", f64::floor)
}

pub fn fn_ceil(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    unary(args, "ceil", f64::ceil)
}

/// ROUND function: `round(x)` or `round(x, digits)`, ties to even
pub fn fn_round(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    let digits = match args.get(1) {
        Some(d) => integer_arg(d, "round")?,
        None => 0,
    };
    let scale = 10f64.powi(digits.clamp(-308, 308) as i32);
    map_elementwise(&args[0], &|v| {
        let x = number_arg(v, "round")?;
        let scaled = x * scale;
        // Past f64 precision rounding is a no-op
        let rounded = if scaled.is_finite() {
            round_half_even(scaled) / scale
        } else {
            x
        };
        Ok(FormulaValue::Number(finite("round", rounded)?))
    })
}

fn round_half_even(x: f64) -> f64 {
    let rounded = x.round();
    if (x - x.trunc()).abs() == 0.5 {
        2.0 * (x / 2.0).round()
    } else {
        rounded
    }
}
