//! Built-in functions
//!
//! The closed vocabulary of callable names. Every function is pure: it sees its
//! evaluated arguments and, for the combinators, the scope needed to call a
//! function argument back.

pub mod combinators;
pub mod logical;
pub mod math;
pub mod sequence;
pub mod statistical;

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{EvalScope, FormulaValue};
use ahash::AHashMap;
use calcnote_core::Quantity;
use std::sync::OnceLock;

/// Function implementation signature
///
/// Functions receive the scope so that combinators can call user functions.
pub type FunctionImpl = fn(&[FormulaValue], &EvalScope) -> FormulaResult<FormulaValue>;

/// Function definition
pub struct FunctionDef {
    /// Function name, case-sensitive
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<&'static str, FunctionDef>,
}

/// Global function registry (lazily initialized, immutable)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

pub fn get_function_registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// Check whether `name` is a built-in function
pub fn is_builtin(name: &str) -> bool {
    get_function_registry().get(name).is_some()
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_math_functions();
        registry.register_statistical_functions();
        registry.register_logical_functions();
        registry.register_sequence_functions();
        registry.register_combinators();

        registry
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name, def);
    }

    /// Names of all built-in functions, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    fn define(
        &mut self,
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        implementation: FunctionImpl,
    ) {
        self.register(FunctionDef {
            name,
            min_args,
            max_args,
            implementation,
        });
    }

    fn register_math_functions(&mut self) {
        self.define("sqrt", 1, Some(1), math::fn_sqrt);
        self.define("abs", 1, Some(1), math::fn_abs);

        // Trigonometry (radians; `deg` literals convert on the way in)
        self.define("sin", 1, Some(1), math::fn_sin);
        self.define("cos", 1, Some(1), math::fn_cos);
        self.define("tan", 1, Some(1), math::fn_tan);
        self.define("asin", 1, Some(1), math::fn_asin);
        self.define("acos", 1, Some(1), math::fn_acos);
        self.define("atan", 1, Some(1), math::fn_atan);
        self.define("atan2", 2, Some(2), math::fn_atan2);
        self.define("sinh", 1, Some(1), math::fn_sinh);
        self.define("cosh", 1, Some(1), math::fn_cosh);
        self.define("tanh", 1, Some(1), math::fn_tanh);

        // Exponentials and logarithms
        self.define("exp", 1, Some(1), math::fn_exp);
        self.define("log", 1, Some(2), math::fn_log);
        self.define("ln", 1, Some(1), math::fn_ln);
        self.define("log10", 1, Some(1), math::fn_log10);

        // Rounding
        self.define("floor", 1, Some(1), math::fn_floor);
        self.define("ceil", 1, Some(1), math::fn_ceil);
        self.define("round", 1, Some(2), math::fn_round);
    }

    fn register_statistical_functions(&mut self) {
        self.define("min", 1, None, statistical::fn_min);
        self.define("max", 1, None, statistical::fn_max);
        self.define("sum", 1, None, statistical::fn_sum);
        self.define("mean", 1, None, statistical::fn_mean);
        self.define("len", 1, Some(1), statistical::fn_len);
    }

    fn register_logical_functions(&mut self) {
        self.define("And", 1, None, logical::fn_and);
        self.define("Or", 1, None, logical::fn_or);
        self.define("Not", 1, Some(1), logical::fn_not);
    }

    fn register_sequence_functions(&mut self) {
        self.define("linspace", 3, Some(3), sequence::fn_linspace);
        self.define("arange", 1, Some(3), sequence::fn_arange);
        self.define("range", 1, Some(3), sequence::fn_range);
    }

    fn register_combinators(&mut self) {
        self.define("sweep", 2, Some(2), combinators::fn_sweep);
        self.define("map2", 3, Some(3), combinators::fn_map2);
    }
}

// === Argument helpers ===

/// Flatten nested arrays into their scalar elements
pub(crate) fn flatten(args: &[FormulaValue]) -> Vec<FormulaValue> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            FormulaValue::Array(items) => out.extend(flatten(items)),
            other => out.push(other.clone()),
        }
    }
    out
}

/// Dimensionless number argument
pub(crate) fn number_arg(value: &FormulaValue, function: &str) -> FormulaResult<f64> {
    match value {
        FormulaValue::Quantity(q) if !q.is_dimensionless() => Err(FormulaError::unit(format!(
            "{}() requires a dimensionless argument, got {}",
            function,
            q.dimension()
        ))),
        other => other.as_number().ok_or_else(|| {
            FormulaError::value(format!(
                "{}() expects a number, got {}",
                function,
                other.type_name()
            ))
        }),
    }
}

/// Whole-number argument
pub(crate) fn integer_arg(value: &FormulaValue, function: &str) -> FormulaResult<i64> {
    let n = number_arg(value, function)?;
    if n.fract() != 0.0 || !n.is_finite() {
        return Err(FormulaError::value(format!(
            "{}() expects an integer, got {}",
            function, n
        )));
    }
    Ok(n as i64)
}

/// Number or quantity argument
pub(crate) fn quantity_arg(value: &FormulaValue, function: &str) -> FormulaResult<Quantity> {
    value.as_quantity().ok_or_else(|| {
        FormulaError::value(format!(
            "{}() expects a number, got {}",
            function,
            value.type_name()
        ))
    })
}

/// Apply `f` to a scalar, or to every element of an array
pub(crate) fn map_elementwise(
    value: &FormulaValue,
    f: &dyn Fn(&FormulaValue) -> FormulaResult<FormulaValue>,
) -> FormulaResult<FormulaValue> {
    match value {
        FormulaValue::Array(items) => items
            .iter()
            .map(|item| map_elementwise(item, f))
            .collect::<FormulaResult<Vec<_>>>()
            .map(FormulaValue::Array),
        scalar => f(scalar),
    }
}

/// Reject NaN and infinite results as domain errors
pub(crate) fn finite(function: &str, value: f64) -> FormulaResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormulaError::value(format!("Math domain error in {}()", function)))
    }
}
