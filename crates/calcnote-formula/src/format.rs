//! Result display strings
//!
//! Turns stored values into the short strings shown next to each block:
//! `12.00`, `12.00 kN/m`, `True`, `Array: [0.00, 1.00]`.

use calcnote_core::{Compacted, Quantity, Value};

/// How results are rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Digits after the decimal point
    pub decimals: usize,
    /// Arrays longer than this are abbreviated
    pub array_preview: usize,
    /// Pick the simplest prefixed unit; otherwise show coherent SI units
    pub compact_units: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            decimals: 2,
            array_preview: 5,
            compact_units: true,
        }
    }
}

impl DisplayOptions {
    fn units_of(&self, q: &Quantity) -> Compacted {
        if self.compact_units {
            q.compact()
        } else {
            q.in_si_units()
        }
    }

    /// Unit label shown for a value, if any
    pub fn unit_label(&self, value: &Value) -> Option<String> {
        match value {
            Value::Quantity(q) => self.units_of(q).unit_label(),
            Value::Array(items) => items.iter().find_map(|item| self.unit_label(item)),
            _ => None,
        }
    }

    /// Format a single value
    pub fn format_value(&self, value: &Value) -> String {
        match value {
            Value::Array(items) => self.format_array(items),
            scalar => self.format_scalar(scalar),
        }
    }

    fn format_scalar(&self, value: &Value) -> String {
        match value {
            Value::Number(n) => self.format_number(*n),
            Value::Quantity(q) => {
                let shown = self.units_of(q);
                match shown.unit_label() {
                    Some(label) => format!("{} {}", self.format_number(shown.magnitude), label),
                    None => self.format_number(shown.magnitude),
                }
            }
            Value::Boolean(true) => "True".to_string(),
            Value::Boolean(false) => "False".to_string(),
            Value::Array(items) => format!("[{}]", self.join(items)),
        }
    }

    fn format_number(&self, n: f64) -> String {
        let formatted = format!("{:.*}", self.decimals, n);
        // Rounding can leave "-0.00"
        if formatted.starts_with('-') && formatted[1..].chars().all(|c| c == '0' || c == '.') {
            formatted[1..].to_string()
        } else {
            formatted
        }
    }

    fn join(&self, items: &[Value]) -> String {
        items
            .iter()
            .map(|item| self.format_scalar(item))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn format_array(&self, items: &[Value]) -> String {
        // At most three leading elements, an ellipsis, then the last element
        let head = self.array_preview.min(3);
        if items.len() <= self.array_preview || items.len() <= head + 1 {
            return format!("Array: [{}]", self.join(items));
        }

        let mut parts: Vec<String> = items[..head]
            .iter()
            .map(|item| self.format_scalar(item))
            .collect();
        parts.push("...".to_string());
        if let Some(last) = items.last() {
            parts.push(self.format_scalar(last));
        }
        format!("Array ({} values): [{}]", items.len(), parts.join(", "))
    }
}

/// Display string for a function definition block
pub fn function_defined(name: &str, params: &[String]) -> String {
    format!("Function {}({}) defined", name, params.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calcnote_core::UnitExpr;
    use pretty_assertions::assert_eq;

    fn quantity(magnitude: f64, unit: &str) -> Value {
        Value::Quantity(Quantity::new(magnitude, &UnitExpr::parse(unit).unwrap()).unwrap())
    }

    #[test]
    fn test_numbers() {
        let options = DisplayOptions::default();
        assert_eq!(options.format_value(&Value::Number(12.0)), "12.00");
        assert_eq!(options.format_value(&Value::Number(3500.0)), "3500.00");
        assert_eq!(options.format_value(&Value::Number(-0.001)), "0.00");

        let precise = DisplayOptions {
            decimals: 4,
            ..Default::default()
        };
        assert_eq!(precise.format_value(&Value::Number(0.5)), "0.5000");
    }

    #[test]
    fn test_booleans() {
        let options = DisplayOptions::default();
        assert_eq!(options.format_value(&Value::Boolean(true)), "True");
        assert_eq!(options.format_value(&Value::Boolean(false)), "False");
    }

    #[test]
    fn test_quantities_are_compacted() {
        let options = DisplayOptions::default();
        let load = quantity(12_000.0, "N/m");
        assert_eq!(options.format_value(&load), "12.00 kN/m");
        assert_eq!(options.unit_label(&load), Some("kN/m".to_string()));

        let si = DisplayOptions {
            compact_units: false,
            ..Default::default()
        };
        assert_eq!(si.format_value(&load), "12000.00 N/m");
    }

    #[test]
    fn test_short_array() {
        let options = DisplayOptions::default();
        let value = Value::from(vec![0.0, 1.0, 2.0]);
        assert_eq!(options.format_value(&value), "Array: [0.00, 1.00, 2.00]");
    }

    #[test]
    fn test_long_array_is_abbreviated() {
        let options = DisplayOptions::default();
        let value = Value::from((0..50).map(f64::from).collect::<Vec<_>>());
        assert_eq!(
            options.format_value(&value),
            "Array (50 values): [0.00, 1.00, 2.00, ..., 49.00]"
        );
    }

    #[test]
    fn test_small_preview_never_repeats_elements() {
        let options = DisplayOptions {
            array_preview: 1,
            ..Default::default()
        };
        assert_eq!(
            options.format_value(&Value::from(vec![1.0, 2.0])),
            "Array: [1.00, 2.00]"
        );
        assert_eq!(
            options.format_value(&Value::from(vec![1.0, 2.0, 3.0])),
            "Array (3 values): [1.00, ..., 3.00]"
        );

        let none = DisplayOptions {
            array_preview: 0,
            ..Default::default()
        };
        assert_eq!(none.format_value(&Value::from(vec![7.0])), "Array: [7.00]");
        assert_eq!(
            none.format_value(&Value::from(vec![7.0, 8.0, 9.0])),
            "Array (3 values): [..., 9.00]"
        );
    }

    #[test]
    fn test_function_defined() {
        assert_eq!(
            function_defined("area", &["b".to_string(), "h".to_string()]),
            "Function area(b, h) defined"
        );
    }
}
