//! Statistical functions
//!
//! Arguments are flattened, so `sum(xs)`, `sum(1, 2, 3)` and `sum(xs, 4)` all
//! work. Every element must share one dimension; the result carries it.

use super::{flatten, quantity_arg};
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{EvalScope, FormulaValue};
use calcnote_core::{Dimension, Quantity};

/// Collect the flattened arguments as quantities of one dimension
fn collect(args: &[FormulaValue], function: &str) -> FormulaResult<Vec<Quantity>> {
    let values = flatten(args)
        .iter()
        .map(|v| quantity_arg(v, function))
        .collect::<FormulaResult<Vec<_>>>()?;

    if let Some(first) = values.first() {
        let dimension = first.dimension();
        if let Some(other) = values.iter().find(|q| q.dimension() != dimension) {
            return Err(FormulaError::unit(format!(
                "{}() arguments have mixed dimensions: {} and {}",
                function,
                dimension,
                other.dimension()
            )));
        }
    }
    Ok(values)
}

fn require_non_empty(values: &[Quantity], function: &str) -> FormulaResult<()> {
    if values.is_empty() {
        Err(FormulaError::value(format!(
            "{}() arg is an empty sequence",
            function
        )))
    } else {
        Ok(())
    }
}

fn extreme(args: &[FormulaValue], function: &str, pick_max: bool) -> FormulaResult<FormulaValue> {
    let values = collect(args, function)?;
    require_non_empty(&values, function)?;

    let mut best = values[0];
    for q in &values[1..] {
        let better = if pick_max {
            q.si_value() > best.si_value()
        } else {
            q.si_value() < best.si_value()
        };
        if better {
            best = *q;
        }
    }
    Ok(FormulaValue::from_quantity(best))
}

/// MIN function
pub fn fn_min(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    extreme(args, "min", false)
}

/// MAX function
pub fn fn_max(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    extreme(args, "max", true)
}

/// SUM function; the sum of nothing is 0
pub fn fn_sum(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    let values = collect(args, "sum")?;
    let dimension = values
        .first()
        .map(Quantity::dimension)
        .unwrap_or(Dimension::NONE);
    let total: f64 = values.iter().map(Quantity::si_value).sum();
    Ok(FormulaValue::from_quantity(Quantity::from_si(total, dimension)))
}

/// MEAN function
pub fn fn_mean(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    let values = collect(args, "mean")?;
    require_non_empty(&values, "mean")?;

    let total: f64 = values.iter().map(Quantity::si_value).sum();
    Ok(FormulaValue::from_quantity(Quantity::from_si(
        total / values.len() as f64,
        values[0].dimension(),
    )))
}

/// LEN function: element count of an array
pub fn fn_len(args: &[FormulaValue], _scope: &EvalScope) -> FormulaResult<FormulaValue> {
    match &args[0] {
        FormulaValue::Array(items) => Ok(FormulaValue::Number(items.len() as f64)),
        other => Err(FormulaError::value(format!(
            "len() expects an array, got {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EvaluationContext;
    use crate::error::ErrorKind;
    use calcnote_core::UnitExpr;

    fn call(
        f: fn(&[FormulaValue], &EvalScope) -> FormulaResult<FormulaValue>,
        args: &[FormulaValue],
    ) -> FormulaResult<FormulaValue> {
        let ctx = EvaluationContext::new();
        f(args, &EvalScope::new(&ctx))
    }

    fn array(values: &[f64]) -> FormulaValue {
        FormulaValue::Array(values.iter().map(|v| FormulaValue::Number(*v)).collect())
    }

    fn kn(magnitude: f64) -> FormulaValue {
        FormulaValue::Quantity(Quantity::new(magnitude, &UnitExpr::parse("kN").unwrap()).unwrap())
    }

    #[test]
    fn test_sum_and_mean() {
        let xs = array(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(call(fn_sum, &[xs.clone()]).unwrap(), FormulaValue::Number(10.0));
        assert_eq!(call(fn_mean, &[xs]).unwrap(), FormulaValue::Number(2.5));
    }

    #[test]
    fn test_flattens_mixed_arguments() {
        let args = [array(&[1.0, 2.0]), FormulaValue::Number(7.0)];
        assert_eq!(call(fn_max, &args).unwrap(), FormulaValue::Number(7.0));
        assert_eq!(call(fn_min, &args).unwrap(), FormulaValue::Number(1.0));
    }

    #[test]
    fn test_empty_inputs() {
        let empty = FormulaValue::Array(vec![]);
        assert_eq!(call(fn_sum, &[empty.clone()]).unwrap(), FormulaValue::Number(0.0));
        let err = call(fn_mean, &[empty.clone()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueError);
        assert!(call(fn_max, &[empty]).is_err());
    }

    #[test]
    fn test_units_propagate() {
        let loads = FormulaValue::Array(vec![kn(2.0), kn(5.0)]);
        match call(fn_sum, &[loads]).unwrap() {
            FormulaValue::Quantity(q) => {
                assert_eq!(q.dimension(), Dimension::FORCE);
                assert_eq!(q.si_value(), 7000.0);
            }
            other => panic!("Expected quantity, got {:?}", other),
        }
    }

    #[test]
    fn test_mixed_dimensions_rejected() {
        let args = [kn(1.0), FormulaValue::Number(1.0)];
        let err = call(fn_sum, &args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnitError);
    }

    #[test]
    fn test_len() {
        assert_eq!(
            call(fn_len, &[array(&[1.0, 2.0, 3.0])]).unwrap(),
            FormulaValue::Number(3.0)
        );
        assert!(call(fn_len, &[FormulaValue::Number(3.0)]).is_err());
    }
}
