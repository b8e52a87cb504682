//! Unit-aware values
//!
//!     A [`UnitValue`] is a magnitude (a scalar or an ordered sequence of numbers)
//!     tagged with a [`Unit`]. Every value carries a unit: "no unit" is the explicit
//!     [`Unit::dimensionless`] marker, while a value whose unit is not known yet is
//!     simply absent from its record.
//!
//!     Units are checked against the symbol registry when the value is built, so a
//!     `UnitValue` in hand is always valid.
//!
//! Construction
//!
//!     - bare numbers and sequences: `UnitValue::from(7.0)`, `UnitValue::from(vec![1.0, 2.0])`
//!     - tagged pairs: `UnitValue::try_from((vec![7.0, 7.1], "keV"))`
//!     - text: `"7.00 GeV".parse::<UnitValue>()`
//!
//!     The serde form mirrors the tagged pair: `[magnitude, "unit"]`.

pub mod registry;
mod unit;

pub use unit::Unit;

use crate::error::UnitError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Numeric payload of a [`UnitValue`].
#[derive(Debug, Clone)]
pub enum Magnitude {
    Scalar(f64),
    Array(Vec<f64>),
}

impl Magnitude {
    /// Number of elements (a scalar counts as one).
    pub fn len(&self) -> usize {
        match self {
            Magnitude::Scalar(_) => 1,
            Magnitude::Array(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[f64] {
        match self {
            Magnitude::Scalar(value) => std::slice::from_ref(value),
            Magnitude::Array(values) => values,
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.as_slice().to_vec()
    }

    /// The single value of a scalar or of a length-1 array.
    pub fn as_scalar(&self) -> Option<f64> {
        match self.as_slice() {
            [value] => Some(*value),
            _ => None,
        }
    }
}

/// A length-1 array equals the scalar it holds. NaN equals NaN so that padded
/// data columns compare equal to themselves.
impl PartialEq for Magnitude {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.as_slice(), other.as_slice());
        a.len() == b.len()
            && a
                .iter()
                .zip(b)
                .all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
    }
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Magnitude::Scalar(value) => write!(f, "{value}"),
            Magnitude::Array(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A magnitude tagged with a physical unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitValue {
    magnitude: Magnitude,
    unit: Unit,
}

impl UnitValue {
    pub fn new(magnitude: Magnitude, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    /// Build a value from a magnitude and a unit spelling, validating the unit.
    pub fn with_unit(magnitude: Magnitude, unit: &str) -> Result<Self, UnitError> {
        Ok(Self::new(magnitude, unit.parse()?))
    }

    /// An empty, dimensionless sequence.
    pub fn empty() -> Self {
        Self::new(Magnitude::Array(Vec::new()), Unit::dimensionless())
    }

    pub fn magnitude(&self) -> &Magnitude {
        &self.magnitude
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn values(&self) -> &[f64] {
        self.magnitude.as_slice()
    }

    pub fn len(&self) -> usize {
        self.magnitude.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitude.is_empty()
    }

    /// Same unit, new magnitude.
    pub fn map_magnitude(&self, magnitude: Magnitude) -> Self {
        Self::new(magnitude, self.unit.clone())
    }
}

impl From<f64> for UnitValue {
    fn from(value: f64) -> Self {
        Self::new(Magnitude::Scalar(value), Unit::dimensionless())
    }
}

impl From<i64> for UnitValue {
    fn from(value: i64) -> Self {
        Self::from(value as f64)
    }
}

impl From<Vec<f64>> for UnitValue {
    fn from(values: Vec<f64>) -> Self {
        Self::new(Magnitude::Array(values), Unit::dimensionless())
    }
}

impl TryFrom<(f64, &str)> for UnitValue {
    type Error = UnitError;

    fn try_from((value, unit): (f64, &str)) -> Result<Self, Self::Error> {
        Self::with_unit(Magnitude::Scalar(value), unit)
    }
}

impl TryFrom<(Vec<f64>, &str)> for UnitValue {
    type Error = UnitError;

    fn try_from((values, unit): (Vec<f64>, &str)) -> Result<Self, Self::Error> {
        Self::with_unit(Magnitude::Array(values), unit)
    }
}

impl TryFrom<(Vec<f64>, Option<&str>)> for UnitValue {
    type Error = UnitError;

    fn try_from((values, unit): (Vec<f64>, Option<&str>)) -> Result<Self, Self::Error> {
        Self::with_unit(Magnitude::Array(values), unit.unwrap_or(""))
    }
}

/// Parses `"<number>"` or `"<number> <unit>"`.
impl FromStr for UnitValue {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (number, unit) = match s.split_once(char::is_whitespace) {
            Some((number, unit)) => (number, unit.trim()),
            None => (s, ""),
        };
        let value = number
            .parse::<f64>()
            .map_err(|_| UnitError::Malformed(s.to_string()))?;
        Self::with_unit(Magnitude::Scalar(value), unit)
    }
}

impl fmt::Display for UnitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_dimensionless() {
            write!(f, "{}", self.magnitude)
        } else {
            write!(f, "{} {}", self.magnitude, self.unit)
        }
    }
}

impl Default for UnitValue {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawMagnitude {
    Scalar(f64),
    Array(Vec<f64>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawUnitValue {
    Tagged(RawMagnitude, Option<String>),
    Bare(RawMagnitude),
}

impl From<RawMagnitude> for Magnitude {
    fn from(raw: RawMagnitude) -> Self {
        match raw {
            RawMagnitude::Scalar(value) => Magnitude::Scalar(value),
            RawMagnitude::Array(values) => Magnitude::Array(values),
        }
    }
}

impl Serialize for UnitValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let magnitude = match &self.magnitude {
            Magnitude::Scalar(value) => RawMagnitude::Scalar(*value),
            Magnitude::Array(values) => RawMagnitude::Array(values.clone()),
        };
        (magnitude, self.unit.to_string()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UnitValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (magnitude, unit) = match RawUnitValue::deserialize(deserializer)? {
            RawUnitValue::Tagged(magnitude, unit) => (magnitude, unit.unwrap_or_default()),
            RawUnitValue::Bare(magnitude) => (magnitude, String::new()),
        };
        UnitValue::with_unit(magnitude.into(), &unit).map_err(serde::de::Error::custom)
    }
}
