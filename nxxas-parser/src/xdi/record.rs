//! The XDI record model
//!
//! An [`XdiRecord`] holds everything one XDI file carries: the version line,
//! namespaced header fields, free-text comments and the data table. The fixed
//! namespaces of the XDI dictionary have their own slots; any other namespace
//! lands in an open map so unknown metadata is never lost.

use crate::units::UnitValue;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A typed header value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Quantity(UnitValue),
    Timestamp(NaiveDateTime),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_quantity(&self) -> Option<&UnitValue> {
        match self {
            FieldValue::Quantity(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Quantity(value) => write!(f, "{value}"),
            FieldValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%dT%H:%M:%S%.f")),
            FieldValue::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue::Text(text.to_string())
    }
}

impl From<UnitValue> for FieldValue {
    fn from(value: UnitValue) -> Self {
        FieldValue::Quantity(value)
    }
}

/// An open bag of header fields, keyed by lower-case name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace {
    fields: BTreeMap<String, FieldValue>,
}

impl Namespace {
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Text value of a field, rendering non-text values.
    pub fn text(&self, key: &str) -> Option<String> {
        self.fields.get(key).map(|value| value.to_string())
    }

    pub fn quantity(&self, key: &str) -> Option<&UnitValue> {
        self.fields.get(key).and_then(FieldValue::as_quantity)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One named data column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: UnitValue,
}

/// Named 1-D columns in declaration order. All columns have equal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataTable {
    columns: Vec<Column>,
}

impl DataTable {
    pub fn get(&self, name: &str) -> Option<&UnitValue> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| &column.values)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Add or replace a column, keeping its original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, values: UnitValue) {
        let name = name.into();
        match self.columns.iter_mut().find(|column| column.name == name) {
            Some(column) => column.values = values,
            None => self.columns.push(Column { name, values }),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    /// Number of rows (the length of the first column).
    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, |column| column.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// The `# XDI/1.0 GSE/1.0` line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XdiVersion {
    /// Format version after `XDI/`.
    pub format: String,
    /// Application tokens that follow, e.g. `GSE/1.0`.
    pub applications: Vec<String>,
}

impl Default for XdiVersion {
    fn default() -> Self {
        Self {
            format: "1.0".to_string(),
            applications: Vec::new(),
        }
    }
}

/// A decoded XDI file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XdiRecord {
    pub version: XdiVersion,
    pub element: Namespace,
    pub scan: Namespace,
    pub mono: Namespace,
    pub beamline: Namespace,
    pub facility: Namespace,
    pub detector: Namespace,
    pub sample: Namespace,
    /// Namespaces outside the XDI dictionary, keyed by lower-case name.
    pub other: BTreeMap<String, Namespace>,
    /// Fields given without a namespace.
    pub fields: Namespace,
    pub comments: Vec<String>,
    pub data: DataTable,
}

impl XdiRecord {
    /// The namespace bag for a lower-case namespace name, created on demand.
    pub fn namespace_mut(&mut self, name: &str) -> &mut Namespace {
        match name {
            "element" => &mut self.element,
            "scan" => &mut self.scan,
            "mono" => &mut self.mono,
            "beamline" => &mut self.beamline,
            "facility" => &mut self.facility,
            "detector" => &mut self.detector,
            "sample" => &mut self.sample,
            other => self.other.entry(other.to_string()).or_default(),
        }
    }

    /// All namespaces with their lower-case names, dictionary namespaces first.
    pub fn namespaces(&self) -> Vec<(&str, &Namespace)> {
        let mut all = vec![
            ("element", &self.element),
            ("scan", &self.scan),
            ("mono", &self.mono),
            ("beamline", &self.beamline),
            ("facility", &self.facility),
            ("detector", &self.detector),
            ("sample", &self.sample),
        ];
        all.extend(self.other.iter().map(|(name, ns)| (name.as_str(), ns)));
        all
    }
}
