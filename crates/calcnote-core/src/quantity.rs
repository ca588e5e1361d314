//! Unit-carrying quantities and unit compaction
//!
//! A [`Quantity`] stores its magnitude in coherent SI units together with its
//! [`Dimension`]. Display units are chosen on demand by [`Quantity::compact`].
//!
//! Compaction picks the simplest equivalent unit deterministically:
//!
//! 1. a single base dimension is shown as that base unit with an exponent (`m^2`)
//! 2. otherwise a named coherent unit of exactly that dimension (`N`, `Pa`, `W`)
//! 3. otherwise a named unit times one power of `m` or `s`, smallest exponent
//!    first, then catalogue order, positive exponents before negative (`N/m`)
//! 4. otherwise a product of base units in canonical base order
//!
//! An SI prefix is then applied to the leading factor so that the magnitude
//! lands in `[1, 1000)`.

use crate::error::{Error, Result};
use crate::unit::{BaseDimension, Dimension, UnitExpr, UnitFactor};
use std::cmp::Ordering;
use std::fmt;

/// A magnitude paired with a physical dimension
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quantity {
    /// Magnitude in coherent SI units
    value: f64,
    dimension: Dimension,
}

impl Quantity {
    /// A magnitude expressed in `unit`
    pub fn new(magnitude: f64, unit: &UnitExpr) -> Result<Self> {
        Ok(Self {
            value: magnitude * unit.scale(),
            dimension: unit.dimension()?,
        })
    }

    /// A magnitude already in coherent SI units
    pub fn from_si(value: f64, dimension: Dimension) -> Self {
        Self { value, dimension }
    }

    pub fn si_value(&self) -> f64 {
        self.value
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimension.is_dimensionless()
    }

    /// Magnitude expressed in another unit of the same dimension
    pub fn value_in(&self, unit: &UnitExpr) -> Result<f64> {
        if unit.dimension()? != self.dimension {
            return Err(Error::incompatible("conversion", self.dimension, unit));
        }
        Ok(self.value / unit.scale())
    }

    pub fn checked_add(&self, rhs: &Quantity) -> Result<Quantity> {
        self.require_same_dimension("+", rhs)?;
        Ok(Quantity::from_si(self.value + rhs.value, self.dimension))
    }

    pub fn checked_sub(&self, rhs: &Quantity) -> Result<Quantity> {
        self.require_same_dimension("-", rhs)?;
        Ok(Quantity::from_si(self.value - rhs.value, self.dimension))
    }

    pub fn mul(&self, rhs: &Quantity) -> Result<Quantity> {
        let dimension = self
            .dimension
            .checked_mul(rhs.dimension)
            .ok_or_else(|| self.exponent_overflow("*", rhs))?;
        Ok(Quantity::from_si(self.value * rhs.value, dimension))
    }

    pub fn div(&self, rhs: &Quantity) -> Result<Quantity> {
        let dimension = self
            .dimension
            .checked_div(rhs.dimension)
            .ok_or_else(|| self.exponent_overflow("/", rhs))?;
        Ok(Quantity::from_si(self.value / rhs.value, dimension))
    }

    /// Multiply the magnitude by a plain number
    pub fn scale(&self, factor: f64) -> Quantity {
        Quantity::from_si(self.value * factor, self.dimension)
    }

    /// Real power; fails when the resulting dimension would be fractional
    pub fn powf(&self, exponent: f64) -> Result<Quantity> {
        let dimension = self.dimension.powf(exponent).ok_or_else(|| {
            Error::InvalidExponent(format!("({})^{}", self.dimension, exponent))
        })?;
        Ok(Quantity::from_si(self.value.powf(exponent), dimension))
    }

    pub fn sqrt(&self) -> Result<Quantity> {
        self.powf(0.5)
    }

    /// Order two quantities of the same dimension
    pub fn compare(&self, rhs: &Quantity) -> Result<Option<Ordering>> {
        self.require_same_dimension("comparison", rhs)?;
        Ok(self.value.partial_cmp(&rhs.value))
    }

    /// Choose the simplest display unit, with an SI prefix
    pub fn compact(&self) -> Compacted {
        compact(self.value, self.dimension, true)
    }

    /// Display in coherent SI units without prefixes
    pub fn in_si_units(&self) -> Compacted {
        compact(self.value, self.dimension, false)
    }

    fn exponent_overflow(&self, op: &str, rhs: &Quantity) -> Error {
        Error::InvalidExponent(format!("({}) {} ({})", self.dimension, op, rhs.dimension))
    }

    fn require_same_dimension(&self, op: &'static str, rhs: &Quantity) -> Result<()> {
        if self.dimension == rhs.dimension {
            Ok(())
        } else {
            Err(Error::incompatible(op, self.dimension, rhs.dimension))
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let compacted = self.compact();
        match compacted.unit {
            Some(unit) => write!(f, "{} {}", compacted.magnitude, unit),
            None => write!(f, "{}", compacted.magnitude),
        }
    }
}

/// A magnitude with the unit it should be displayed in
#[derive(Debug, Clone, PartialEq)]
pub struct Compacted {
    pub magnitude: f64,
    /// `None` for dimensionless values
    pub unit: Option<UnitExpr>,
}

impl Compacted {
    pub fn unit_label(&self) -> Option<String> {
        self.unit.as_ref().map(|u| u.to_string())
    }
}

#[derive(Debug, Clone, Copy)]
struct Coherent {
    symbol: &'static str,
    dimension: Dimension,
    prefixable: bool,
}

const fn coherent(symbol: &'static str, dimension: Dimension, prefixable: bool) -> Coherent {
    Coherent {
        symbol,
        dimension,
        prefixable,
    }
}

/// Named coherent units in tie-breaking order
const NAMED: [Coherent; 10] = [
    coherent("N", Dimension::FORCE, true),
    coherent("Pa", Dimension::PRESSURE, true),
    coherent("W", Dimension::POWER, true),
    coherent("m", Dimension::LENGTH, true),
    coherent("kg", Dimension::MASS, false),
    coherent("s", Dimension::TIME, false),
    coherent("A", Dimension::new(0, 0, 0, 1, 0, 0, 0), true),
    coherent("K", Dimension::new(0, 0, 0, 0, 1, 0, 0), false),
    coherent("mol", Dimension::new(0, 0, 0, 0, 0, 1, 0), false),
    coherent("cd", Dimension::new(0, 0, 0, 0, 0, 0, 1), false),
];

/// Bases allowed as the second factor of a two-factor unit
const SECOND_FACTOR: [BaseDimension; 2] = [BaseDimension::Length, BaseDimension::Time];

const PREFIXES: [(&str, f64); 6] = [
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("", 1.0),
    ("m", 1e-3),
    ("µ", 1e-6),
];

fn coherent_for(base: BaseDimension) -> Coherent {
    NAMED
        .iter()
        .copied()
        .find(|c| c.symbol == base.symbol())
        .unwrap_or(coherent(base.symbol(), Dimension::of(base), false))
}

fn canonical_factors(dimension: Dimension) -> Vec<(Coherent, i32)> {
    if let Some((base, exponent)) = dimension.single_base() {
        return vec![(coherent_for(base), exponent as i32)];
    }

    if let Some(named) = NAMED.iter().find(|c| c.dimension == dimension) {
        return vec![(*named, 1)];
    }

    for magnitude in 1..=3 {
        for named in NAMED.iter() {
            for base in SECOND_FACTOR {
                for exponent in [magnitude, -magnitude] {
                    let candidate = Dimension::of(base)
                        .powi(exponent)
                        .and_then(|d| named.dimension.checked_mul(d));
                    if candidate == Some(dimension) {
                        return vec![(*named, 1), (coherent_for(base), exponent)];
                    }
                }
            }
        }
    }

    dimension
        .components()
        .map(|(base, exponent)| (coherent_for(base), exponent as i32))
        .collect()
}

fn choose_prefix(value: f64, exponent: i32) -> (&'static str, f64) {
    if value == 0.0 || !value.is_finite() {
        return ("", 1.0);
    }
    let abs = value.abs();
    PREFIXES
        .iter()
        .copied()
        .find(|(_, scale)| (1.0..1000.0).contains(&(abs / scale.powi(exponent))))
        .unwrap_or(("", 1.0))
}

fn compact(value: f64, dimension: Dimension, use_prefix: bool) -> Compacted {
    if dimension.is_dimensionless() {
        return Compacted {
            magnitude: value,
            unit: None,
        };
    }

    let mut magnitude = value;
    let mut unit = UnitExpr::new();
    for (i, (named, exponent)) in canonical_factors(dimension).into_iter().enumerate() {
        let (prefix, scale) = if i == 0 && use_prefix && named.prefixable && exponent > 0 {
            choose_prefix(value, exponent)
        } else {
            ("", 1.0)
        };
        magnitude /= scale.powi(exponent);
        unit.push_factor(UnitFactor {
            symbol: format!("{}{}", prefix, named.symbol),
            scale,
            dimension: named.dimension,
            exponent,
        });
    }

    Compacted {
        magnitude,
        unit: Some(unit),
    }
}
