//! Container-facing view of a record
//!
//! A record that can be stored in a NeXus container implements [`NxGroup`]: it
//! names its structural class and lists its members, each tagged with the role it
//! plays in the container. The role is fixed by the record type, so the writer
//! never has to guess from a member's name whether it is an attribute, a
//! dataset, a link or a sub-group.
//!
//! ```text
//!     EntryRecord (NXentry)
//!     ├── @NX_class           Attribute
//!     ├── definition, mode    Dataset
//!     ├── energy, intensity   Quantity
//!     ├── plot (NXdata)       Group
//!     │   ├── @signal         Attribute
//!     │   └── energy          Link
//!     └── instrument          Group
//! ```

use super::entry::LinkDescriptor;
use nxxas_parser::UnitValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A plain value stored as an attribute or dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    #[serde(with = "nullable_float")]
    Float(f64),
    Text(String),
    #[serde(with = "nullable_floats")]
    Floats(Vec<f64>),
    Texts(Vec<String>),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Vec<f64>> for Value {
    fn from(value: Vec<f64>) -> Self {
        Value::Floats(value)
    }
}

impl From<Vec<&str>> for Value {
    fn from(value: Vec<&str>) -> Self {
        Value::Texts(value.into_iter().map(str::to_string).collect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Text(value) => write!(f, "{value:?}"),
            Value::Floats(values) => {
                let items: Vec<String> = values.iter().map(f64::to_string).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Texts(values) => write!(f, "{values:?}"),
        }
    }
}

/// The role a member plays in the container, with its content.
pub enum Member<'a> {
    /// A nested group at the member's name.
    Group(&'a dyn NxGroup),
    /// An attribute of the current group.
    Attribute(Value),
    /// Magnitude as a dataset, unit as its `units` attribute.
    Quantity(&'a UnitValue),
    /// A reference resolved at write time.
    Link(&'a LinkDescriptor),
    /// A dataset with its own attributes.
    Dataset { value: Value, attrs: Vec<(&'a str, Value)> },
}

/// A named member of a group.
pub struct Field<'a> {
    pub name: &'a str,
    pub member: Member<'a>,
}

impl<'a> Field<'a> {
    pub fn new(name: &'a str, member: Member<'a>) -> Self {
        Self { name, member }
    }

    pub fn attribute(name: &'a str, value: impl Into<Value>) -> Self {
        Self::new(name, Member::Attribute(value.into()))
    }

    pub fn dataset(name: &'a str, value: impl Into<Value>) -> Self {
        Self::new(
            name,
            Member::Dataset {
                value: value.into(),
                attrs: Vec::new(),
            },
        )
    }
}

/// A record that maps onto a container group.
pub trait NxGroup {
    /// The structural class written as the group's `NX_class` attribute.
    fn nx_class(&self) -> &str;

    /// Whether this group is the default plot of its ancestors.
    fn is_default_view(&self) -> bool {
        false
    }

    /// Members in write order. Absent optional members are left out.
    fn fields(&self) -> Vec<Field<'_>>;
}

/// JSON has no NaN: non-finite numbers are stored as `null` and read back as NaN.
mod nullable_float {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

mod nullable_floats {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            values
                .iter()
                .map(|value| value.is_finite().then_some(*value)),
        )
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let values = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}
