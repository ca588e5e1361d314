//! Formula evaluator
//!
//! Evaluates formula ASTs to produce values. Units travel with every operand:
//! additive and comparison operators require equal dimensions, multiplicative
//! operators combine them.

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::context::EvaluationContext;
use crate::error::{FormulaError, FormulaResult};
use crate::functions::get_function_registry;
use crate::symbol::Symbol;
use calcnote_core::{Dimension, Quantity, Value};
use std::cmp::Ordering;

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    Quantity(Quantity),
    Boolean(bool),
    Array(Vec<FormulaValue>),
    /// A function passed as an argument (`sweep(f, xs)`)
    Function(Symbol),
}

impl FormulaValue {
    /// Wrap a quantity, collapsing dimensionless ones to plain numbers
    pub fn from_quantity(q: Quantity) -> Self {
        if q.is_dimensionless() {
            FormulaValue::Number(q.si_value())
        } else {
            FormulaValue::Quantity(q)
        }
    }

    /// Convert to a plain number, if possible
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Boolean(true) => Some(1.0),
            FormulaValue::Boolean(false) => Some(0.0),
            FormulaValue::Quantity(q) if q.is_dimensionless() => Some(q.si_value()),
            _ => None,
        }
    }

    /// View any scalar as a quantity (numbers are dimensionless)
    pub fn as_quantity(&self) -> Option<Quantity> {
        match self {
            FormulaValue::Quantity(q) => Some(*q),
            other => other
                .as_number()
                .map(|n| Quantity::from_si(n, Dimension::NONE)),
        }
    }

    /// Force conversion to a quantity for arithmetic
    pub fn to_quantity(&self) -> FormulaResult<Quantity> {
        self.as_quantity().ok_or_else(|| {
            FormulaError::value(format!("Expected a number, got {}", self.type_name()))
        })
    }

    /// Truth value for conditions and boolean connectives
    pub fn truthy(&self) -> FormulaResult<bool> {
        match self {
            FormulaValue::Boolean(b) => Ok(*b),
            FormulaValue::Number(n) => Ok(*n != 0.0),
            FormulaValue::Quantity(q) => Ok(q.si_value() != 0.0),
            other => Err(FormulaError::value(format!(
                "Expected a boolean condition, got {}",
                other.type_name()
            ))),
        }
    }

    pub fn as_array(&self) -> Option<&[FormulaValue]> {
        match self {
            FormulaValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FormulaValue::Number(_) => "number",
            FormulaValue::Quantity(_) => "quantity",
            FormulaValue::Boolean(_) => "boolean",
            FormulaValue::Array(_) => "array",
            FormulaValue::Function(_) => "function",
        }
    }

    /// Convert into a value that can be stored in a block or the context
    pub fn into_value(self) -> FormulaResult<Value> {
        match self {
            FormulaValue::Number(n) => Ok(Value::Number(n)),
            FormulaValue::Quantity(q) => Ok(Value::from(q)),
            FormulaValue::Boolean(b) => Ok(Value::Boolean(b)),
            FormulaValue::Array(items) => items
                .into_iter()
                .map(FormulaValue::into_value)
                .collect::<FormulaResult<Vec<_>>>()
                .map(Value::Array),
            FormulaValue::Function(f) => Err(FormulaError::value(format!(
                "'{}' is a function; call it with arguments",
                f
            ))),
        }
    }
}

impl From<&Value> for FormulaValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Number(n) => FormulaValue::Number(*n),
            Value::Quantity(q) => FormulaValue::from_quantity(*q),
            Value::Boolean(b) => FormulaValue::Boolean(*b),
            Value::Array(items) => FormulaValue::Array(items.iter().map(Into::into).collect()),
        }
    }
}

impl From<f64> for FormulaValue {
    fn from(n: f64) -> Self {
        FormulaValue::Number(n)
    }
}

/// Evaluation scope: the shared context plus local bindings
///
/// Locals hold function parameters and comprehension variables. `depth` counts
/// nested user-function calls.
pub struct EvalScope<'a> {
    ctx: &'a EvaluationContext,
    locals: Vec<(Symbol, FormulaValue)>,
    depth: usize,
}

impl<'a> EvalScope<'a> {
    pub fn new(ctx: &'a EvaluationContext) -> Self {
        Self {
            ctx,
            locals: Vec::new(),
            depth: 0,
        }
    }

    pub fn context(&self) -> &EvaluationContext {
        self.ctx
    }

    fn with_local(&self, symbol: &Symbol, value: FormulaValue) -> EvalScope<'a> {
        let mut locals = self.locals.clone();
        locals.push((symbol.clone(), value));
        EvalScope {
            ctx: self.ctx,
            locals,
            depth: self.depth,
        }
    }

    fn lookup(&self, symbol: &Symbol) -> FormulaResult<FormulaValue> {
        if let Some((_, value)) = self.locals.iter().rev().find(|(s, _)| s == symbol) {
            return Ok(value.clone());
        }
        if let Some(value) = self.ctx.value(symbol.name()) {
            return Ok(FormulaValue::from(&value));
        }
        if self.ctx.function(symbol.name()).is_some()
            || get_function_registry().get(symbol.name()).is_some()
        {
            return Ok(FormulaValue::Function(symbol.clone()));
        }
        Err(FormulaError::parse(format!(
            "Unknown identifier: {}",
            symbol
        )))
    }

    /// Call a user-defined or built-in function with evaluated arguments
    pub fn call_function(
        &self,
        function: &Symbol,
        args: Vec<FormulaValue>,
    ) -> FormulaResult<FormulaValue> {
        let name = function.name();

        // User functions shadow built-ins of the same name
        if let Some(user) = self.ctx.function(name) {
            if args.len() != user.params.len() {
                return Err(FormulaError::parse(format!(
                    "{}() takes {} argument{}, got {}",
                    name,
                    user.params.len(),
                    if user.params.len() == 1 { "" } else { "s" },
                    args.len()
                )));
            }
            if self.depth >= self.ctx.max_call_depth() {
                return Err(FormulaError::value(format!(
                    "Maximum call depth ({}) exceeded in {}()",
                    self.ctx.max_call_depth(),
                    name
                )));
            }

            let symbols = self.ctx.symbols();
            let scope = EvalScope {
                ctx: self.ctx,
                locals: user
                    .params
                    .iter()
                    .map(|p| symbols.resolve(p))
                    .zip(args)
                    .collect(),
                depth: self.depth + 1,
            };
            return evaluate_in(&user.body, &scope);
        }

        let registry = get_function_registry();
        let func = registry
            .get(name)
            .ok_or_else(|| FormulaError::parse(format!("Unknown function: {}", name)))?;

        // Check argument count
        if args.len() < func.min_args {
            return Err(FormulaError::parse(format!(
                "{}() expects at least {} argument{}, got {}",
                name,
                func.min_args,
                if func.min_args == 1 { "" } else { "s" },
                args.len()
            )));
        }

        if let Some(max) = func.max_args {
            if args.len() > max {
                return Err(FormulaError::parse(format!(
                    "{}() expects at most {} argument{}, got {}",
                    name,
                    max,
                    if max == 1 { "" } else { "s" },
                    args.len()
                )));
            }
        }

        // Call the function
        (func.implementation)(&args, self)
    }
}

/// Evaluate a formula expression against the context
pub fn evaluate(expr: &Expr, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    evaluate_in(expr, &EvalScope::new(ctx))
}

/// Evaluate a formula expression within a scope
pub fn evaluate_in(expr: &Expr, scope: &EvalScope) -> FormulaResult<FormulaValue> {
    match expr {
        // === Literals ===
        Expr::Number(n) => Ok(FormulaValue::Number(*n)),
        Expr::Quantity { value, unit } => {
            Ok(FormulaValue::from_quantity(Quantity::new(*value, unit)?))
        }
        Expr::Boolean(b) => Ok(FormulaValue::Boolean(*b)),
        Expr::Constant(c) => Ok(FormulaValue::Number(c.value())),

        // === Names ===
        Expr::Var(symbol) => scope.lookup(symbol),
        Expr::FunctionRef(symbol) => Ok(FormulaValue::Function(symbol.clone())),

        // === Operators ===
        Expr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, scope),

        Expr::UnaryOp { op, operand } => {
            let value = evaluate_in(operand, scope)?;
            apply_unary(*op, value)
        }

        // === Functions ===
        Expr::Call { function, args } => {
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                evaluated_args.push(evaluate_in(arg, scope)?);
            }
            scope.call_function(function, evaluated_args)
        }

        // === Sequences ===
        Expr::List(items) => items
            .iter()
            .map(|item| evaluate_in(item, scope))
            .collect::<FormulaResult<Vec<_>>>()
            .map(FormulaValue::Array),

        Expr::Comprehension { body, var, iter } => {
            let items = match evaluate_in(iter, scope)? {
                FormulaValue::Array(items) => items,
                other => {
                    return Err(FormulaError::value(format!(
                        "Can only iterate over an array, got {}",
                        other.type_name()
                    )))
                }
            };
            items
                .into_iter()
                .map(|item| evaluate_in(body, &scope.with_local(var, item)))
                .collect::<FormulaResult<Vec<_>>>()
                .map(FormulaValue::Array)
        }

        // === Conditionals ===
        Expr::Conditional { branches, default } => {
            for (condition, value) in branches {
                if evaluate_in(condition, scope)?.truthy()? {
                    return evaluate_in(value, scope);
                }
            }
            match default {
                Some(value) => evaluate_in(value, scope),
                None => Err(FormulaError::Conditional(
                    "No condition matched and there is no else branch".into(),
                )),
            }
        }
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &Expr,
    right: &Expr,
    scope: &EvalScope,
) -> FormulaResult<FormulaValue> {
    let left_val = evaluate_in(left, scope)?;

    // Short-circuit the connectives on scalar operands
    match op {
        BinaryOperator::And if !matches!(left_val, FormulaValue::Array(_)) => {
            if !left_val.truthy()? {
                return Ok(FormulaValue::Boolean(false));
            }
            return Ok(FormulaValue::Boolean(evaluate_in(right, scope)?.truthy()?));
        }
        BinaryOperator::Or if !matches!(left_val, FormulaValue::Array(_)) => {
            if left_val.truthy()? {
                return Ok(FormulaValue::Boolean(true));
            }
            return Ok(FormulaValue::Boolean(evaluate_in(right, scope)?.truthy()?));
        }
        _ => {}
    }

    let right_val = evaluate_in(right, scope)?;
    apply_binary(op, left_val, right_val)
}

/// Apply a binary operator, broadcasting over arrays element by element
pub fn apply_binary(
    op: BinaryOperator,
    left: FormulaValue,
    right: FormulaValue,
) -> FormulaResult<FormulaValue> {
    match (left, right) {
        (FormulaValue::Array(l), FormulaValue::Array(r)) => {
            if l.len() != r.len() {
                return Err(FormulaError::value(format!(
                    "Arrays have different lengths ({} and {})",
                    l.len(),
                    r.len()
                )));
            }
            l.into_iter()
                .zip(r)
                .map(|(a, b)| apply_binary(op, a, b))
                .collect::<FormulaResult<Vec<_>>>()
                .map(FormulaValue::Array)
        }
        (FormulaValue::Array(l), r) => l
            .into_iter()
            .map(|a| apply_binary(op, a, r.clone()))
            .collect::<FormulaResult<Vec<_>>>()
            .map(FormulaValue::Array),
        (l, FormulaValue::Array(r)) => r
            .into_iter()
            .map(|b| apply_binary(op, l.clone(), b))
            .collect::<FormulaResult<Vec<_>>>()
            .map(FormulaValue::Array),
        (l, r) => apply_scalar(op, &l, &r),
    }
}

fn apply_scalar(
    op: BinaryOperator,
    left: &FormulaValue,
    right: &FormulaValue,
) -> FormulaResult<FormulaValue> {
    if matches!(left, FormulaValue::Function(_)) || matches!(right, FormulaValue::Function(_)) {
        return Err(FormulaError::value(format!(
            "Operator '{}' cannot be applied to a function",
            op.symbol()
        )));
    }

    match op {
        // Arithmetic operators
        BinaryOperator::Add => {
            finite_quantity(left.to_quantity()?.checked_add(&right.to_quantity()?)?)
        }
        BinaryOperator::Subtract => {
            finite_quantity(left.to_quantity()?.checked_sub(&right.to_quantity()?)?)
        }
        BinaryOperator::Multiply => {
            finite_quantity(left.to_quantity()?.mul(&right.to_quantity()?)?)
        }
        BinaryOperator::Divide => {
            let divisor = right.to_quantity()?;
            if divisor.si_value() == 0.0 {
                return Err(FormulaError::value("Division by zero"));
            }
            finite_quantity(left.to_quantity()?.div(&divisor)?)
        }
        BinaryOperator::Power => power(left, right),

        // Comparison operators
        BinaryOperator::Equal
        | BinaryOperator::NotEqual
        | BinaryOperator::LessThan
        | BinaryOperator::LessEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterEqual => compare(op, left, right),

        // Logical operators (array operands end up here)
        BinaryOperator::And => Ok(FormulaValue::Boolean(left.truthy()? && right.truthy()?)),
        BinaryOperator::Or => Ok(FormulaValue::Boolean(left.truthy()? || right.truthy()?)),
    }
}

fn power(base: &FormulaValue, exponent: &FormulaValue) -> FormulaResult<FormulaValue> {
    let exponent = match exponent.as_number() {
        Some(e) => e,
        None => {
            return Err(FormulaError::unit(format!(
                "Exponent must be dimensionless, got {}",
                exponent.type_name()
            )))
        }
    };
    let base = base.to_quantity()?;
    if base.si_value() == 0.0 && exponent < 0.0 {
        return Err(FormulaError::value("Division by zero"));
    }

    let result = base.powf(exponent)?;
    if result.si_value().is_nan() {
        return Err(FormulaError::value(format!(
            "Math domain error: ({})^{}",
            base.si_value(),
            exponent
        )));
    }
    finite_quantity(result)
}

/// Arithmetic results must stay finite
fn finite_quantity(q: Quantity) -> FormulaResult<FormulaValue> {
    if q.si_value().is_finite() {
        Ok(FormulaValue::from_quantity(q))
    } else {
        Err(FormulaError::value("Numeric overflow"))
    }
}

fn compare(
    op: BinaryOperator,
    left: &FormulaValue,
    right: &FormulaValue,
) -> FormulaResult<FormulaValue> {
    let ordering = match (left, right) {
        (FormulaValue::Boolean(l), FormulaValue::Boolean(r)) => Some(l.cmp(r)),
        _ => left.to_quantity()?.compare(&right.to_quantity()?)?,
    };

    let result = match ordering {
        // NaN compares unequal to everything
        None => op == BinaryOperator::NotEqual,
        Some(ordering) => match op {
            BinaryOperator::Equal => ordering == Ordering::Equal,
            BinaryOperator::NotEqual => ordering != Ordering::Equal,
            BinaryOperator::LessThan => ordering == Ordering::Less,
            BinaryOperator::LessEqual => ordering != Ordering::Greater,
            BinaryOperator::GreaterThan => ordering == Ordering::Greater,
            BinaryOperator::GreaterEqual => ordering != Ordering::Less,
            _ => false,
        },
    };
    Ok(FormulaValue::Boolean(result))
}

/// Apply a unary operator, element-wise over arrays
pub fn apply_unary(op: UnaryOperator, value: FormulaValue) -> FormulaResult<FormulaValue> {
    if let FormulaValue::Array(items) = value {
        return items
            .into_iter()
            .map(|item| apply_unary(op, item))
            .collect::<FormulaResult<Vec<_>>>()
            .map(FormulaValue::Array);
    }

    match op {
        UnaryOperator::Negate => Ok(FormulaValue::from_quantity(
            value.to_quantity()?.scale(-1.0),
        )),
        UnaryOperator::Not => Ok(FormulaValue::Boolean(!value.truthy()?)),
    }
}
