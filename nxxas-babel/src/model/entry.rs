//! The NXxas entry record
//!
//! An [`EntryRecord`] is immutable: every `with_*` method consumes the record
//! and returns a new one, re-running the derivation step
//!
//! ```text
//!     validate fields  ->  synthesize default plot  ->  derive title
//! ```
//!
//! The title is never set directly. It is a pure function of element, edge,
//! mode and instrument name ([`derive_title`]), so any change to one of those
//! re-derives it. A record built without a plot gets [`default_plot`], which
//! links to the sibling `energy` and `intensity` datasets.

use super::domain::{Edge, Element, EntryKind, XasMode};
use super::node::{Field, Member, NxGroup, Value};
use crate::error::Error;
use nxxas_parser::UnitValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Application definition every entry declares.
pub const DEFINITION: &str = "NXxas";

/// A named reference to another node, optionally in another container file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDescriptor {
    pub target_name: String,
    #[serde(default)]
    pub target_filename: Option<String>,
}

impl LinkDescriptor {
    /// A link into the same container.
    pub fn internal(target_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            target_filename: None,
        }
    }

    /// A link into another container file.
    pub fn external(target_filename: impl Into<String>, target_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            target_filename: Some(target_filename.into()),
        }
    }
}

/// The NXdata group naming the default plot of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotDescriptor {
    pub energy: LinkDescriptor,
    pub intensity: LinkDescriptor,
}

impl PlotDescriptor {
    pub const SIGNAL: &'static str = "intensity";
    pub const AXES: [&'static str; 1] = ["energy"];
}

impl NxGroup for PlotDescriptor {
    fn nx_class(&self) -> &str {
        "NXdata"
    }

    fn is_default_view(&self) -> bool {
        true
    }

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::attribute("NX_class", self.nx_class()),
            Field::attribute("signal", Self::SIGNAL),
            Field::attribute("axes", Self::AXES.to_vec()),
            Field::new("energy", Member::Link(&self.energy)),
            Field::new("intensity", Member::Link(&self.intensity)),
        ]
    }
}

/// Instrument name with an optional short form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentName {
    pub value: String,
    #[serde(default)]
    pub short_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    #[serde(default)]
    pub name: Option<InstrumentName>,
}

impl Instrument {
    /// Instrument of a beamline at a facility, named `<facility>-<beamline>`.
    pub fn at(facility: &str, beamline: Option<&str>) -> Self {
        let name = match beamline {
            Some(beamline) => InstrumentName {
                value: format!("{facility}-{beamline}"),
                short_name: Some(beamline.to_string()),
            },
            None => InstrumentName {
                value: facility.to_string(),
                short_name: None,
            },
        };
        Self { name: Some(name) }
    }
}

impl NxGroup for Instrument {
    fn nx_class(&self) -> &str {
        "NXinstrument"
    }

    fn fields(&self) -> Vec<Field<'_>> {
        let mut fields = vec![Field::attribute("NX_class", self.nx_class())];
        if let Some(name) = &self.name {
            let attrs = name
                .short_name
                .iter()
                .map(|short| ("short_name", Value::from(short.as_str())))
                .collect();
            fields.push(Field::new(
                "name",
                Member::Dataset {
                    value: Value::from(name.value.as_str()),
                    attrs,
                },
            ));
        }
        fields
    }
}

/// `"[<instrument>: ]<element> <edge> (<mode>)"`.
pub fn derive_title(
    element: Element,
    edge: Edge,
    mode: XasMode,
    instrument: Option<&Instrument>,
) -> String {
    let mut title = format!("{element} {edge}");
    if let Some(name) = instrument.and_then(|i| i.name.as_ref()) {
        title = format!("{}: {title}", name.value);
    }
    format!("{title} ({mode})")
}

/// Plot linking to the entry's own `energy` and `intensity` datasets.
pub fn default_plot() -> PlotDescriptor {
    PlotDescriptor {
        energy: LinkDescriptor::internal("../energy"),
        intensity: LinkDescriptor::internal("../intensity"),
    }
}

/// Member names an extra dataset may not take.
pub const RESERVED_NAMES: [&str; 11] = [
    "NX_class",
    "default",
    "definition",
    "mode",
    "element",
    "absorption_edge",
    "energy",
    "intensity",
    "title",
    "plot",
    "instrument",
];

/// A validated XAS spectrum entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryRecord {
    kind: EntryKind,
    mode: XasMode,
    element: Element,
    edge: Edge,
    energy: UnitValue,
    intensity: UnitValue,
    title: String,
    plot: PlotDescriptor,
    instrument: Option<Instrument>,
    extra: BTreeMap<String, UnitValue>,
}

impl EntryRecord {
    /// A top-level entry without data.
    pub fn new(mode: XasMode, element: Element, edge: Edge) -> Self {
        Self {
            kind: EntryKind::Entry,
            mode,
            element,
            edge,
            energy: UnitValue::empty(),
            intensity: UnitValue::empty(),
            title: String::new(),
            plot: default_plot(),
            instrument: None,
            extra: BTreeMap::new(),
        }
        .revalidate()
    }

    /// Re-run the derivation step. Idempotent.
    pub fn revalidate(mut self) -> Self {
        self.title = derive_title(self.element, self.edge, self.mode, self.instrument.as_ref());
        self
    }

    pub fn with_kind(mut self, kind: EntryKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_mode(mut self, mode: XasMode) -> Self {
        self.mode = mode;
        self.revalidate()
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.element = element;
        self.revalidate()
    }

    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edge = edge;
        self.revalidate()
    }

    pub fn with_instrument(mut self, instrument: Option<Instrument>) -> Self {
        self.instrument = instrument;
        self.revalidate()
    }

    pub fn with_energy(mut self, energy: UnitValue) -> Self {
        self.energy = energy;
        self
    }

    pub fn with_intensity(mut self, intensity: UnitValue) -> Self {
        self.intensity = intensity;
        self
    }

    /// Replace the plot. `None` restores the default plot.
    pub fn with_plot(mut self, plot: Option<PlotDescriptor>) -> Self {
        self.plot = plot.unwrap_or_else(default_plot);
        self
    }

    /// Add a dataset outside the NXxas field set. Names of NXxas members are refused.
    pub fn with_extra(mut self, name: impl Into<String>, value: UnitValue) -> Result<Self, Error> {
        let name = name.into();
        if RESERVED_NAMES.contains(&name.as_str()) {
            return Err(Error::validation(format!(
                "'{name}' is an NXxas member and cannot hold an extra dataset"
            )));
        }
        self.extra.insert(name, value);
        Ok(self)
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn mode(&self) -> XasMode {
        self.mode
    }

    pub fn element(&self) -> Element {
        self.element
    }

    pub fn edge(&self) -> Edge {
        self.edge
    }

    pub fn energy(&self) -> &UnitValue {
        &self.energy
    }

    pub fn intensity(&self) -> &UnitValue {
        &self.intensity
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn plot(&self) -> &PlotDescriptor {
        &self.plot
    }

    pub fn instrument(&self) -> Option<&Instrument> {
        self.instrument.as_ref()
    }

    pub fn extra(&self) -> &BTreeMap<String, UnitValue> {
        &self.extra
    }

    pub fn definition(&self) -> &'static str {
        DEFINITION
    }

    /// Both energy and intensity carry values.
    pub fn has_data(&self) -> bool {
        !self.energy.is_empty() && !self.intensity.is_empty()
    }

    /// Energy and intensity must pair up point by point.
    pub fn check_shape(&self) -> Result<(), Error> {
        if self.has_data() && self.energy.len() != self.intensity.len() {
            return Err(Error::validation(format!(
                "{}: {} energy points but {} intensity points",
                self.title,
                self.energy.len(),
                self.intensity.len()
            )));
        }
        Ok(())
    }
}

impl NxGroup for EntryRecord {
    fn nx_class(&self) -> &str {
        self.kind.nx_class()
    }

    fn fields(&self) -> Vec<Field<'_>> {
        let mut fields = vec![
            Field::attribute("NX_class", self.nx_class()),
            Field::dataset("definition", DEFINITION),
            Field::dataset("mode", self.mode.as_str()),
            Field::dataset("element", self.element.symbol()),
            Field::dataset("absorption_edge", self.edge.name()),
            Field::new("energy", Member::Quantity(&self.energy)),
            Field::new("intensity", Member::Quantity(&self.intensity)),
            Field::dataset("title", self.title.as_str()),
            Field::new("plot", Member::Group(&self.plot)),
        ];
        if let Some(instrument) = &self.instrument {
            fields.push(Field::new("instrument", Member::Group(instrument)));
        }
        fields.extend(
            self.extra
                .iter()
                .map(|(name, value)| Field::new(name.as_str(), Member::Quantity(value))),
        );
        fields
    }
}

/// Raw, unvalidated input for an [`EntryRecord`], e.g. from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDraft {
    #[serde(rename = "NX_class", default)]
    pub kind: EntryKind,
    #[serde(default = "default_definition")]
    pub definition: String,
    pub mode: String,
    pub element: String,
    pub absorption_edge: String,
    #[serde(default = "UnitValue::empty")]
    pub energy: UnitValue,
    #[serde(default = "UnitValue::empty")]
    pub intensity: UnitValue,
    /// Must be absent or equal to the derived title.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub plot: Option<PlotDescriptor>,
    #[serde(default)]
    pub instrument: Option<Instrument>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, UnitValue>,
}

fn default_definition() -> String {
    DEFINITION.to_string()
}

impl Default for EntryDraft {
    fn default() -> Self {
        Self {
            kind: EntryKind::default(),
            definition: default_definition(),
            mode: String::new(),
            element: String::new(),
            absorption_edge: String::new(),
            energy: UnitValue::empty(),
            intensity: UnitValue::empty(),
            title: None,
            plot: None,
            instrument: None,
            extra: BTreeMap::new(),
        }
    }
}

impl TryFrom<EntryDraft> for EntryRecord {
    type Error = Error;

    fn try_from(draft: EntryDraft) -> Result<Self, Self::Error> {
        if draft.definition != DEFINITION {
            return Err(Error::validation(format!(
                "definition must be {DEFINITION}, not '{}'",
                draft.definition
            )));
        }
        let mode = draft.mode.parse()?;
        let element = draft.element.parse()?;
        let edge = draft.absorption_edge.parse()?;

        let mut record = EntryRecord::new(mode, element, edge)
            .with_kind(draft.kind)
            .with_energy(draft.energy)
            .with_intensity(draft.intensity)
            .with_plot(draft.plot)
            .with_instrument(draft.instrument);
        for (name, value) in draft.extra {
            record = record.with_extra(name, value)?;
        }

        if let Some(title) = draft.title {
            if title != record.title {
                return Err(Error::validation(format!(
                    "title '{title}' does not match the derived title '{}'",
                    record.title
                )));
            }
        }
        record.check_shape()?;
        Ok(record)
    }
}

impl From<&EntryRecord> for EntryDraft {
    fn from(record: &EntryRecord) -> Self {
        Self {
            kind: record.kind,
            definition: DEFINITION.to_string(),
            mode: record.mode.to_string(),
            element: record.element.to_string(),
            absorption_edge: record.edge.to_string(),
            energy: record.energy.clone(),
            intensity: record.intensity.clone(),
            title: Some(record.title.clone()),
            plot: Some(record.plot.clone()),
            instrument: record.instrument.clone(),
            extra: record.extra.clone(),
        }
    }
}

impl Serialize for EntryRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        EntryDraft::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EntryRecord {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let draft = EntryDraft::deserialize(deserializer)?;
        EntryRecord::try_from(draft).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fe_k() -> EntryRecord {
        EntryRecord::new(
            XasMode::Transmission,
            "Fe".parse().unwrap(),
            "K".parse().unwrap(),
        )
    }

    #[test]
    fn derives_title_and_default_plot() {
        let record = fe_k();
        assert_eq!(record.title(), "Fe K (transmission)");
        assert_eq!(record.plot().energy, LinkDescriptor::internal("../energy"));
        assert_eq!(record.plot().intensity, LinkDescriptor::internal("../intensity"));
        assert_eq!(record.kind(), EntryKind::Entry);
        assert!(!record.has_data());
    }

    #[test]
    fn revalidation_is_idempotent() {
        let record = fe_k().with_instrument(Some(Instrument::at("ESRF", Some("BM23"))));
        let again = record.clone().revalidate().revalidate();
        assert_eq!(again, record);
        assert_eq!(
            serde_json::to_string(&again).unwrap(),
            serde_json::to_string(&record).unwrap()
        );
    }

    #[test]
    fn title_follows_every_change() {
        let record = fe_k()
            .with_mode(XasMode::FluorescenceYield)
            .with_element("Cu".parse().unwrap())
            .with_edge("L3".parse().unwrap());
        assert_eq!(record.title(), "Cu L3 (fluorescence yield)");

        let record = record.with_instrument(Some(Instrument::at("ESRF", Some("BM23"))));
        assert_eq!(record.title(), "ESRF-BM23: Cu L3 (fluorescence yield)");

        let record = record.with_instrument(None);
        assert_eq!(record.title(), "Cu L3 (fluorescence yield)");
    }

    #[test]
    fn derive_title_is_pure() {
        let element = "Co".parse().unwrap();
        let edge = "K".parse().unwrap();
        let instrument = Instrument::at("APS", None);
        assert_eq!(
            derive_title(element, edge, XasMode::Transmission, Some(&instrument)),
            "APS: Co K (transmission)"
        );
    }

    #[test]
    fn instrument_names() {
        let full = Instrument::at("ESRF", Some("BM23")).name.unwrap();
        assert_eq!(full.value, "ESRF-BM23");
        assert_eq!(full.short_name.as_deref(), Some("BM23"));

        let bare = Instrument::at("APS", None).name.unwrap();
        assert_eq!(bare.value, "APS");
        assert_eq!(bare.short_name, None);
    }

    #[test]
    fn builds_from_a_draft() {
        let draft: EntryDraft = serde_json::from_value(json!({
            "NX_class": "NXsubentry",
            "definition": "NXxas",
            "mode": "transmission",
            "element": "Fe",
            "absorption_edge": "K",
            "energy": [[7, 7.1], "keV"],
            "intensity": [10, 20],
        }))
        .unwrap();
        let record = EntryRecord::try_from(draft).unwrap();

        assert_eq!(record.kind(), EntryKind::SubEntry);
        assert_eq!(record.energy().values(), &[7.0, 7.1]);
        assert_eq!(record.energy().unit().to_string(), "keV");
        assert_eq!(record.intensity().values(), &[10.0, 20.0]);
        assert!(record.intensity().unit().is_dimensionless());
        assert!(record.has_data());
    }

    #[test]
    fn serializes_with_derived_fields() {
        let value = serde_json::to_value(fe_k()).unwrap();
        assert_eq!(
            value,
            json!({
                "NX_class": "NXentry",
                "definition": "NXxas",
                "mode": "transmission",
                "element": "Fe",
                "absorption_edge": "K",
                "energy": [[], ""],
                "intensity": [[], ""],
                "title": "Fe K (transmission)",
                "plot": {
                    "energy": {"target_name": "../energy", "target_filename": null},
                    "intensity": {"target_name": "../intensity", "target_filename": null},
                },
                "instrument": null,
            })
        );
    }

    #[test]
    fn json_round_trip() {
        let record = fe_k()
            .with_energy(UnitValue::try_from((vec![7.1, 7.2], "keV")).unwrap())
            .with_intensity(UnitValue::from(vec![0.1, 0.2]))
            .with_extra("i0", UnitValue::from(vec![1.0, 2.0]))
            .unwrap();
        let json = serde_json::to_string(&record).unwrap();
        let back: EntryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn rejects_invalid_drafts() {
        let base = EntryDraft {
            mode: "transmission".into(),
            element: "Fe".into(),
            absorption_edge: "K".into(),
            ..EntryDraft::default()
        };
        assert!(EntryRecord::try_from(base.clone()).is_ok());

        for draft in [
            EntryDraft { element: "Xx".into(), ..base.clone() },
            EntryDraft { absorption_edge: "L9".into(), ..base.clone() },
            EntryDraft { mode: "absorbance".into(), ..base.clone() },
            EntryDraft { definition: "NXmx".into(), ..base.clone() },
            EntryDraft { title: Some("my title".into()), ..base.clone() },
            EntryDraft {
                energy: UnitValue::from(vec![1.0, 2.0]),
                intensity: UnitValue::from(vec![1.0]),
                ..base.clone()
            },
        ] {
            assert!(matches!(EntryRecord::try_from(draft), Err(Error::Validation(_))));
        }
    }

    #[test]
    fn extras_cannot_shadow_members() {
        for name in ["energy", "title", "NX_class", "plot"] {
            let err = fe_k()
                .with_extra(name, UnitValue::from(vec![1.0, 2.0]))
                .unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{name}");
        }

        let mut draft = EntryDraft {
            mode: "transmission".into(),
            element: "Fe".into(),
            absorption_edge: "K".into(),
            ..EntryDraft::default()
        };
        draft.extra.insert("default".into(), UnitValue::from(vec![1.0]));
        assert!(matches!(EntryRecord::try_from(draft), Err(Error::Validation(_))));
    }

    #[test]
    fn lists_members_in_write_order() {
        let record = fe_k().with_instrument(Some(Instrument::at("APS", Some("13-ID-C"))));
        let names: Vec<&str> = record.fields().iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            [
                "NX_class",
                "definition",
                "mode",
                "element",
                "absorption_edge",
                "energy",
                "intensity",
                "title",
                "plot",
                "instrument"
            ]
        );
    }
}
