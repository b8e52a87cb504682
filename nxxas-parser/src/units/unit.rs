//! Unit algebra
//!
//! A [`Unit`] is a product of canonical symbols raised to integer powers.
//! The empty product is the explicit "dimensionless" marker.
//!
//! Accepted spellings:
//!
//! ```text
//!     eV            g/cm^3         mA*h        cm**-1        1/s
//!     g / cm ** 3   kiloelectron_volt          J/mol/K
//! ```
//!
//! Canonical rendering puts positive powers first, joined by `*`, then every
//! negative factor as `/symbol^n`. Only negative factors render as `1/...`.

use super::registry;
use crate::error::UnitError;
use std::fmt;
use std::str::FromStr;

/// A physical unit: canonical symbols with integer exponents, in order of appearance.
#[derive(Debug, Clone, Default)]
pub struct Unit {
    factors: Vec<(String, i32)>,
}

impl Unit {
    /// The explicit "no unit" marker.
    pub fn dimensionless() -> Self {
        Self::default()
    }

    /// A unit made of a single canonical symbol.
    pub fn symbol(spelling: &str) -> Result<Self, UnitError> {
        let canonical = registry::canonical_symbol(spelling)
            .ok_or_else(|| UnitError::UnknownSymbol(spelling.to_string()))?;
        Ok(Self {
            factors: vec![(canonical.to_string(), 1)],
        })
    }

    pub fn is_dimensionless(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn factors(&self) -> &[(String, i32)] {
        &self.factors
    }

    fn push(&mut self, symbol: &str, exponent: i32) {
        if let Some(existing) = self.factors.iter_mut().find(|(s, _)| s == symbol) {
            existing.1 += exponent;
        } else {
            self.factors.push((symbol.to_string(), exponent));
        }
        self.factors.retain(|(_, e)| *e != 0);
    }

    fn sorted(&self) -> Vec<(&str, i32)> {
        let mut sorted: Vec<_> = self.factors.iter().map(|(s, e)| (s.as_str(), *e)).collect();
        sorted.sort();
        sorted
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.sorted() == other.sorted()
    }
}

impl Eq for Unit {}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let expression = s.trim().replace("**", "^");
        let mut unit = Unit::dimensionless();
        if expression.is_empty() || expression == "dimensionless" {
            return Ok(unit);
        }

        let mut sign = 1;
        let mut term = String::new();
        for c in expression.chars().chain(std::iter::once('*')) {
            match c {
                '*' | '/' => {
                    parse_term(term.trim(), sign, &mut unit, s)?;
                    term.clear();
                    sign = if c == '/' { -1 } else { 1 };
                }
                _ => term.push(c),
            }
        }
        Ok(unit)
    }
}

fn parse_term(term: &str, sign: i32, unit: &mut Unit, expression: &str) -> Result<(), UnitError> {
    let malformed = || UnitError::Malformed(expression.to_string());
    if term.is_empty() {
        return Err(malformed());
    }
    let (base, exponent) = match term.split_once('^') {
        Some((base, exponent)) => (
            base.trim(),
            exponent.trim().parse::<i32>().map_err(|_| malformed())?,
        ),
        None => (term, 1),
    };
    if base.is_empty() || base.contains(char::is_whitespace) {
        return Err(malformed());
    }
    if base == "1" {
        return Ok(());
    }
    let canonical = registry::canonical_symbol(base)
        .ok_or_else(|| UnitError::UnknownSymbol(base.to_string()))?;
    unit.push(canonical, sign * exponent);
    Ok(())
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let factor = |symbol: &str, exponent: i32| {
            if exponent == 1 {
                symbol.to_string()
            } else {
                format!("{symbol}^{exponent}")
            }
        };
        let positive: Vec<String> = self
            .factors
            .iter()
            .filter(|(_, e)| *e > 0)
            .map(|(s, e)| factor(s, *e))
            .collect();
        let negative: Vec<String> = self
            .factors
            .iter()
            .filter(|(_, e)| *e < 0)
            .map(|(s, e)| factor(s, -e))
            .collect();

        if positive.is_empty() && !negative.is_empty() {
            write!(f, "1")?;
        }
        write!(f, "{}", positive.join("*"))?;
        for denominator in negative {
            write!(f, "/{denominator}")?;
        }
        Ok(())
    }
}
