//! Physical dimensions and the unit catalogue
//!
//! Every unit is described by a scale factor to the coherent SI unit and a
//! [`Dimension`] vector of base-dimension exponents. Composite annotations such
//! as `kN/m` or `m/s^2` are represented by [`UnitExpr`].

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// SI base dimensions, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseDimension {
    Length,
    Mass,
    Time,
    Current,
    Temperature,
    Amount,
    Luminosity,
}

impl BaseDimension {
    /// All base dimensions in canonical order
    pub const ALL: [BaseDimension; 7] = [
        BaseDimension::Length,
        BaseDimension::Mass,
        BaseDimension::Time,
        BaseDimension::Current,
        BaseDimension::Temperature,
        BaseDimension::Amount,
        BaseDimension::Luminosity,
    ];

    /// Position in the exponent vector
    pub fn index(self) -> usize {
        self as usize
    }

    /// Symbol of the coherent SI unit for this dimension
    pub fn symbol(self) -> &'static str {
        match self {
            BaseDimension::Length => "m",
            BaseDimension::Mass => "kg",
            BaseDimension::Time => "s",
            BaseDimension::Current => "A",
            BaseDimension::Temperature => "K",
            BaseDimension::Amount => "mol",
            BaseDimension::Luminosity => "cd",
        }
    }
}

/// Exponents of the seven SI base dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimension([i8; 7]);

impl Dimension {
    /// The dimension of a pure number
    pub const NONE: Dimension = Dimension([0; 7]);

    pub const LENGTH: Dimension = Dimension::new(1, 0, 0, 0, 0, 0, 0);
    pub const MASS: Dimension = Dimension::new(0, 1, 0, 0, 0, 0, 0);
    pub const TIME: Dimension = Dimension::new(0, 0, 1, 0, 0, 0, 0);
    pub const FORCE: Dimension = Dimension::new(1, 1, -2, 0, 0, 0, 0);
    pub const PRESSURE: Dimension = Dimension::new(-1, 1, -2, 0, 0, 0, 0);
    pub const ENERGY: Dimension = Dimension::new(2, 1, -2, 0, 0, 0, 0);
    pub const POWER: Dimension = Dimension::new(2, 1, -3, 0, 0, 0, 0);

    /// Build a dimension from explicit exponents (L, M, T, I, Θ, N, J)
    pub const fn new(
        length: i8,
        mass: i8,
        time: i8,
        current: i8,
        temperature: i8,
        amount: i8,
        luminosity: i8,
    ) -> Self {
        Dimension([
            length,
            mass,
            time,
            current,
            temperature,
            amount,
            luminosity,
        ])
    }

    /// Dimension of a single base quantity
    pub fn of(base: BaseDimension) -> Self {
        let mut exps = [0; 7];
        exps[base.index()] = 1;
        Dimension(exps)
    }

    /// Exponent of one base dimension
    pub fn exponent(&self, base: BaseDimension) -> i8 {
        self.0[base.index()]
    }

    pub fn is_dimensionless(&self) -> bool {
        self.0.iter().all(|&e| e == 0)
    }

    /// Integer power; `None` when an exponent leaves the `i8` range
    pub fn powi(self, n: i32) -> Option<Self> {
        let mut exps = self.0;
        for e in exps.iter_mut() {
            *e = i8::try_from(i32::from(*e).checked_mul(n)?).ok()?;
        }
        Some(Dimension(exps))
    }

    /// Real power; `None` when an exponent would become fractional or leave
    /// the `i8` range
    pub fn powf(self, p: f64) -> Option<Self> {
        let mut exps = [0i8; 7];
        for (slot, &e) in exps.iter_mut().zip(self.0.iter()) {
            let scaled = f64::from(e) * p;
            let rounded = scaled.round();
            if !rounded.is_finite() || (scaled - rounded).abs() > 1e-9 {
                return None;
            }
            if rounded < f64::from(i8::MIN) || rounded > f64::from(i8::MAX) {
                return None;
            }
            *slot = rounded as i8;
        }
        Some(Dimension(exps))
    }

    /// Product of two dimensions; `None` on exponent overflow
    pub fn checked_mul(self, rhs: Dimension) -> Option<Self> {
        self.combine(rhs, i8::checked_add)
    }

    /// Quotient of two dimensions; `None` on exponent overflow
    pub fn checked_div(self, rhs: Dimension) -> Option<Self> {
        self.combine(rhs, i8::checked_sub)
    }

    fn combine(self, rhs: Dimension, op: fn(i8, i8) -> Option<i8>) -> Option<Self> {
        let mut exps = self.0;
        for (e, &r) in exps.iter_mut().zip(rhs.0.iter()) {
            *e = op(*e, r)?;
        }
        Some(Dimension(exps))
    }

    /// The base dimension and exponent when exactly one exponent is non-zero
    pub fn single_base(&self) -> Option<(BaseDimension, i8)> {
        let mut found = None;
        for base in BaseDimension::ALL {
            let e = self.exponent(base);
            if e != 0 {
                if found.is_some() {
                    return None;
                }
                found = Some((base, e));
            }
        }
        found
    }

    /// Non-zero exponents in canonical order
    pub fn components(&self) -> impl Iterator<Item = (BaseDimension, i8)> {
        let dim = *self;
        BaseDimension::ALL
            .into_iter()
            .map(move |b| (b, dim.exponent(b)))
            .filter(|(_, e)| *e != 0)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return f.write_str("1");
        }
        let factors: Vec<(&str, i32)> = self
            .components()
            .map(|(b, e)| (b.symbol(), e as i32))
            .collect();
        f.write_str(&format_factors(&factors))
    }
}

/// Render `(symbol, exponent)` pairs as `a·b/c^2`
pub(crate) fn format_factors(factors: &[(&str, i32)]) -> String {
    fn one(symbol: &str, exponent: i32) -> String {
        if exponent == 1 {
            symbol.to_string()
        } else {
            format!("{}^{}", symbol, exponent)
        }
    }

    let numerator: Vec<String> = factors
        .iter()
        .filter(|(_, e)| *e > 0)
        .map(|(s, e)| one(s, *e))
        .collect();
    let denominator: Vec<String> = factors
        .iter()
        .filter(|(_, e)| *e < 0)
        .map(|(s, e)| one(s, -e))
        .collect();

    if numerator.is_empty() {
        return factors
            .iter()
            .map(|(s, e)| one(s, *e))
            .collect::<Vec<_>>()
            .join("·");
    }

    let mut out = numerator.join("·");
    match denominator.len() {
        0 => {}
        1 => {
            out.push('/');
            out.push_str(&denominator[0]);
        }
        _ => {
            out.push_str("/(");
            out.push_str(&denominator.join("·"));
            out.push(')');
        }
    }
    out
}

/// A catalogue entry
#[derive(Debug)]
pub struct UnitDef {
    /// Symbol as written in formulas
    pub symbol: &'static str,
    /// Scale to the coherent SI unit of the same dimension
    pub factor: f64,
    pub dimension: Dimension,
}

impl UnitDef {
    const fn new(symbol: &'static str, factor: f64, dimension: Dimension) -> Self {
        Self {
            symbol,
            factor,
            dimension,
        }
    }
}

const FREQUENCY: Dimension = Dimension::new(0, 0, -1, 0, 0, 0, 0);

static CATALOGUE: [UnitDef; 28] = [
    UnitDef::new("m", 1.0, Dimension::LENGTH),
    UnitDef::new("mm", 1e-3, Dimension::LENGTH),
    UnitDef::new("cm", 1e-2, Dimension::LENGTH),
    UnitDef::new("km", 1e3, Dimension::LENGTH),
    UnitDef::new("s", 1.0, Dimension::TIME),
    UnitDef::new("min", 60.0, Dimension::TIME),
    UnitDef::new("h", 3600.0, Dimension::TIME),
    UnitDef::new("kg", 1.0, Dimension::MASS),
    UnitDef::new("g", 1e-3, Dimension::MASS),
    UnitDef::new("t", 1e3, Dimension::MASS),
    UnitDef::new("N", 1.0, Dimension::FORCE),
    UnitDef::new("kN", 1e3, Dimension::FORCE),
    UnitDef::new("MN", 1e6, Dimension::FORCE),
    UnitDef::new("Pa", 1.0, Dimension::PRESSURE),
    UnitDef::new("kPa", 1e3, Dimension::PRESSURE),
    UnitDef::new("MPa", 1e6, Dimension::PRESSURE),
    UnitDef::new("GPa", 1e9, Dimension::PRESSURE),
    UnitDef::new("J", 1.0, Dimension::ENERGY),
    UnitDef::new("kJ", 1e3, Dimension::ENERGY),
    UnitDef::new("W", 1.0, Dimension::POWER),
    UnitDef::new("kW", 1e3, Dimension::POWER),
    UnitDef::new("A", 1.0, Dimension::new(0, 0, 0, 1, 0, 0, 0)),
    UnitDef::new("K", 1.0, Dimension::new(0, 0, 0, 0, 1, 0, 0)),
    UnitDef::new("mol", 1.0, Dimension::new(0, 0, 0, 0, 0, 1, 0)),
    UnitDef::new("cd", 1.0, Dimension::new(0, 0, 0, 0, 0, 0, 1)),
    UnitDef::new("Hz", 1.0, FREQUENCY),
    UnitDef::new("rad", 1.0, Dimension::NONE),
    UnitDef::new("deg", 0.017453292519943295, Dimension::NONE),
];

static INDEX: Lazy<HashMap<&'static str, &'static UnitDef>> =
    Lazy::new(|| CATALOGUE.iter().map(|u| (u.symbol, u)).collect());

/// Look up a unit symbol in the catalogue
pub fn lookup_unit(symbol: &str) -> Option<&'static UnitDef> {
    INDEX.get(symbol).copied()
}

/// Check whether a word names a catalogue unit
pub fn is_unit_symbol(symbol: &str) -> bool {
    INDEX.contains_key(symbol)
}

/// All known units
pub fn catalogue() -> &'static [UnitDef] {
    &CATALOGUE
}

/// One factor of a composite unit, e.g. `mm^2`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitFactor {
    pub symbol: String,
    /// Scale of one `symbol` to the coherent SI unit
    pub scale: f64,
    pub dimension: Dimension,
    pub exponent: i32,
}

/// A product of unit factors, as written after a number (`kN/m`, `m/s^2`)
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitExpr {
    factors: Vec<UnitFactor>,
}

impl UnitExpr {
    /// Create an empty (dimensionless) unit expression
    pub fn new() -> Self {
        Self::default()
    }

    /// A single catalogue unit raised to `exponent`
    pub fn from_def(def: &UnitDef, exponent: i32) -> Self {
        let mut expr = Self::new();
        expr.push(def, exponent);
        expr
    }

    /// Append a catalogue unit, merging repeated symbols
    pub fn push(&mut self, def: &UnitDef, exponent: i32) {
        self.push_factor(UnitFactor {
            symbol: def.symbol.to_string(),
            scale: def.factor,
            dimension: def.dimension,
            exponent,
        });
    }

    pub(crate) fn push_factor(&mut self, factor: UnitFactor) {
        if let Some(existing) = self.factors.iter_mut().find(|f| f.symbol == factor.symbol) {
            existing.exponent = existing.exponent.saturating_add(factor.exponent);
        } else {
            self.factors.push(factor);
        }
        self.factors.retain(|f| f.exponent != 0);
    }

    /// Parse an annotation such as `kN*m`, `kN·m` or `m/s^2`
    ///
    /// Every factor after a `/` is divided; there is no grouping.
    pub fn parse(text: &str) -> Result<Self> {
        let mut expr = Self::new();
        let mut sign = 1;
        let mut rest = text.trim();
        if rest.is_empty() {
            return Err(Error::UnknownUnit(String::new()));
        }

        loop {
            let end = rest
                .find(|c: char| !(c.is_alphanumeric() || c == '^' || c == '-' || c == 'µ'))
                .unwrap_or(rest.len());
            let (term, tail) = rest.split_at(end);
            let (symbol, exponent) = match term.split_once('^') {
                Some((s, e)) => (
                    s,
                    e.parse::<i32>()
                        .map_err(|_| Error::InvalidExponent(term.to_string()))?,
                ),
                None => (term, 1),
            };
            let def = lookup_unit(symbol).ok_or_else(|| Error::UnknownUnit(symbol.to_string()))?;
            expr.push(def, exponent.saturating_mul(sign));

            let tail = tail.trim_start();
            let mut chars = tail.chars();
            match chars.next() {
                None => break,
                Some('*') | Some('·') => {}
                Some('/') => sign = -1,
                Some(c) => return Err(Error::UnknownUnit(format!("unexpected '{}'", c))),
            }
            rest = chars.as_str().trim_start();
        }

        Ok(expr)
    }

    pub fn factors(&self) -> &[UnitFactor] {
        &self.factors
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Scale of this unit relative to the coherent SI unit
    pub fn scale(&self) -> f64 {
        self.factors
            .iter()
            .map(|f| f.scale.powi(f.exponent))
            .product()
    }

    /// Combined dimension; fails when an exponent leaves the supported range
    pub fn dimension(&self) -> Result<Dimension> {
        self.factors
            .iter()
            .try_fold(Dimension::NONE, |acc, f| {
                f.dimension
                    .powi(f.exponent)
                    .and_then(|d| acc.checked_mul(d))
            })
            .ok_or_else(|| Error::InvalidExponent(self.to_string()))
    }
}

impl fmt::Display for UnitExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let factors: Vec<(&str, i32)> = self
            .factors
            .iter()
            .map(|u| (u.symbol.as_str(), u.exponent))
            .collect();
        f.write_str(&format_factors(&factors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dimension_arithmetic() {
        let pressure_times_length = Dimension::PRESSURE.checked_mul(Dimension::LENGTH);
        assert_eq!(
            pressure_times_length,
            Dimension::FORCE.checked_div(Dimension::LENGTH)
        );
        assert_eq!(
            Dimension::LENGTH.powi(2).and_then(|d| d.powf(0.5)),
            Some(Dimension::LENGTH)
        );
        assert_eq!(Dimension::LENGTH.powf(0.5), None);
        assert!(Dimension::FORCE
            .checked_div(Dimension::FORCE)
            .unwrap()
            .is_dimensionless());
    }

    #[test]
    fn test_exponent_bounds() {
        let big = Dimension::LENGTH.powi(100).unwrap();
        assert_eq!(big.checked_mul(big), None);
        assert_eq!(Dimension::LENGTH.powi(-100).unwrap().checked_div(big), None);
        assert_eq!(Dimension::LENGTH.powi(200), None);
        assert_eq!(Dimension::LENGTH.powi(i32::MAX), None);
        assert_eq!(Dimension::LENGTH.powf(128.0), None);
        assert_eq!(Dimension::LENGTH.powf(f64::INFINITY), None);
        assert_eq!(
            Dimension::LENGTH.powi(127).map(|d| d.exponent(BaseDimension::Length)),
            Some(127)
        );
    }

    #[test]
    fn test_single_base() {
        assert_eq!(
            Dimension::LENGTH.powi(3).and_then(|d| d.single_base()),
            Some((BaseDimension::Length, 3))
        );
        assert_eq!(Dimension::FORCE.single_base(), None);
    }

    #[test]
    fn test_dimension_display() {
        assert_eq!(Dimension::NONE.to_string(), "1");
        assert_eq!(Dimension::FORCE.to_string(), "m·kg/s^2");
        assert_eq!(Dimension::TIME.powi(-1).unwrap().to_string(), "s^-1");
    }

    #[test]
    fn test_lookup() {
        let mpa = lookup_unit("MPa").unwrap();
        assert_eq!(mpa.factor, 1e6);
        assert_eq!(mpa.dimension, Dimension::PRESSURE);
        assert!(lookup_unit("furlong").is_none());
        assert!(is_unit_symbol("kN"));
    }

    #[test]
    fn test_parse_unit_expr() {
        let unit = UnitExpr::parse("kN/m").unwrap();
        assert_eq!(
            unit.dimension().ok(),
            Dimension::FORCE.checked_div(Dimension::LENGTH)
        );
        assert!((unit.scale() - 1e3).abs() < 1e-9);
        assert_eq!(unit.to_string(), "kN/m");

        let accel = UnitExpr::parse("m/s^2").unwrap();
        assert_eq!(accel.dimension().unwrap(), Dimension::new(1, 0, -2, 0, 0, 0, 0));
        assert_eq!(accel.to_string(), "m/s^2");

        let moment = UnitExpr::parse("kN·m").unwrap();
        assert_eq!(moment.dimension().unwrap(), Dimension::ENERGY);
        assert_eq!(moment.to_string(), "kN·m");
    }

    #[test]
    fn test_parse_unit_errors() {
        assert!(matches!(UnitExpr::parse("parsec"), Err(Error::UnknownUnit(_))));
        assert!(matches!(UnitExpr::parse("m^x"), Err(Error::InvalidExponent(_))));
        assert!(UnitExpr::parse("").is_err());
    }

    #[test]
    fn test_unit_exponent_out_of_range() {
        let unit = UnitExpr::parse("m^200").unwrap();
        assert!(matches!(unit.dimension(), Err(Error::InvalidExponent(_))));
        assert!(UnitExpr::parse("m^127").unwrap().dimension().is_ok());
    }

    #[test]
    fn test_repeated_factor_merges() {
        let mut unit = UnitExpr::from_def(lookup_unit("m").unwrap(), 1);
        unit.push(lookup_unit("m").unwrap(), 1);
        assert_eq!(unit.factors().len(), 1);
        assert_eq!(unit.to_string(), "m^2");
    }
}
