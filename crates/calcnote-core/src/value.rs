//! Stored result values

use crate::quantity::Quantity;
use std::fmt;

/// The result of evaluating a formula block
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "value", rename_all = "lowercase"))]
pub enum Value {
    /// Plain (dimensionless) number
    Number(f64),

    /// Number with a physical unit
    Quantity(Quantity),

    /// Result of a comparison or boolean connective
    Boolean(bool),

    /// Ordered sequence of values (from `linspace`, `arange`, list literals, ...)
    Array(Vec<Value>),
}

impl Value {
    /// Try to get the value as a plain number
    ///
    /// Quantities only qualify when they are dimensionless.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Boolean(true) => Some(1.0),
            Value::Boolean(false) => Some(0.0),
            Value::Quantity(q) if q.is_dimensionless() => Some(q.si_value()),
            _ => None,
        }
    }

    /// Magnitude in display units (compacted for quantities)
    pub fn magnitude(&self) -> Option<f64> {
        match self {
            Value::Quantity(q) => Some(q.compact().magnitude),
            other => other.as_number(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Number(n) => Some(*n != 0.0),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Compacted display unit, if the value carries one
    pub fn unit_label(&self) -> Option<String> {
        match self {
            Value::Quantity(q) => q.compact().unit_label(),
            Value::Array(items) => items.first().and_then(Value::unit_label),
            _ => None,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Quantity(_) => "quantity",
            Value::Boolean(_) => "boolean",
            Value::Array(_) => "array",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Quantity(q) => write!(f, "{}", q),
            Value::Boolean(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Quantity> for Value {
    fn from(q: Quantity) -> Self {
        if q.is_dimensionless() {
            Value::Number(q.si_value())
        } else {
            Value::Quantity(q)
        }
    }
}

impl From<Vec<f64>> for Value {
    fn from(values: Vec<f64>) -> Self {
        Value::Array(values.into_iter().map(Value::Number).collect())
    }
}
