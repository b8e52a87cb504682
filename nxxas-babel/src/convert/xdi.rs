//! XDI record <-> entry record
//!
//! An XDI file may carry a transmission spectrum (`mutrans`, or the
//! pre-normalized `normtrans`), a fluorescence spectrum (`mufluor` / `normfluor`),
//! both, or neither. Each spectrum present becomes one entry; when both are
//! present the two entries are sub-entries of one shared entry. Raw intensity is
//! preferred over the normalized series when a file has both.

use super::{ConversionModule, Conversions};
use crate::error::Error;
use crate::model::{Edge, Element, EntryKind, EntryRecord, Instrument, Record, RecordKind, XasMode};
use nxxas_parser::{UnitValue, XdiRecord};
use std::iter;

/// Column names holding the intensity of a mode, most preferred first.
pub fn intensity_columns(mode: XasMode) -> [&'static str; 2] {
    match mode {
        XasMode::Transmission => ["mutrans", "normtrans"],
        XasMode::FluorescenceYield => ["mufluor", "normfluor"],
    }
}

/// The column an entry's intensity is written back to.
pub fn output_column(mode: XasMode) -> &'static str {
    intensity_columns(mode)[0]
}

fn intensity(record: &XdiRecord, mode: XasMode) -> Option<&UnitValue> {
    intensity_columns(mode)
        .into_iter()
        .find_map(|column| record.data.get(column))
}

/// Modes with an intensity series in `record`.
pub fn modes_present(record: &XdiRecord) -> Vec<XasMode> {
    XasMode::ALL
        .into_iter()
        .filter(|mode| intensity(record, *mode).is_some())
        .collect()
}

fn instrument(record: &XdiRecord) -> Option<Instrument> {
    let facility = record.facility.text("name")?;
    let beamline = record.beamline.text("name");
    Some(Instrument::at(&facility, beamline.as_deref()))
}

fn required_text(record: &XdiRecord, key: &str) -> Result<String, Error> {
    record
        .element
        .text(key)
        .ok_or_else(|| Error::validation(format!("missing Element.{key}")))
}

/// Entries for every spectrum in `record`, built lazily.
pub fn to_entries(record: XdiRecord) -> Result<Conversions<'static>, Error> {
    let modes = modes_present(&record);
    if modes.is_empty() {
        return Ok(Box::new(iter::empty()));
    }
    let element: Element = required_text(&record, "symbol")?.parse()?;
    let edge: Edge = required_text(&record, "edge")?.parse()?;
    let kind = if modes.len() > 1 {
        EntryKind::SubEntry
    } else {
        EntryKind::Entry
    };
    let instrument = instrument(&record);
    let energy = record.data.get("energy").cloned().unwrap_or_default();

    Ok(Box::new(modes.into_iter().map(move |mode| {
        let intensity = intensity(&record, mode).cloned().unwrap_or_default();
        let entry = EntryRecord::new(mode, element, edge)
            .with_kind(kind)
            .with_instrument(instrument.clone())
            .with_energy(energy.clone())
            .with_intensity(intensity);
        Ok::<_, Error>(Record::from(entry))
    })))
}

/// One XDI record holding the entry's spectrum under its mode's column name.
pub fn from_entry(entry: &EntryRecord) -> XdiRecord {
    let mut record = XdiRecord::default();
    record
        .version
        .applications
        .push(concat!("nxxas/", env!("CARGO_PKG_VERSION")).to_string());
    record.element.insert("symbol", entry.element().symbol());
    record.element.insert("edge", entry.edge().name());

    if let Some(name) = entry.instrument().and_then(|i| i.name.as_ref()) {
        match &name.short_name {
            Some(beamline) => {
                let facility = name
                    .value
                    .strip_suffix(beamline.as_str())
                    .and_then(|rest| rest.strip_suffix('-'))
                    .unwrap_or(&name.value);
                record.facility.insert("name", facility);
                record.beamline.insert("name", beamline.as_str());
            }
            None => record.facility.insert("name", name.value.as_str()),
        }
    }

    record.data.insert("energy", entry.energy().clone());
    record
        .data
        .insert(output_column(entry.mode()), entry.intensity().clone());
    for (name, value) in entry.extra() {
        if record.data.get(name).is_some() {
            tracing::warn!(column = %name, "extra dataset clashes with a data column, not written");
            continue;
        }
        record.data.insert(name.as_str(), value.clone());
    }
    record
}

/// [`ConversionModule`] for XDI records.
#[derive(Debug, Clone, Copy, Default)]
pub struct XdiConversion;

impl ConversionModule for XdiConversion {
    fn kind(&self) -> RecordKind {
        RecordKind::Xdi
    }

    fn to_entries(&self, record: Record) -> Result<Conversions<'static>, Error> {
        match record {
            Record::Xdi(record) => to_entries(*record),
            other => Err(Error::validation(format!(
                "expected an XDI record, got {}",
                other.kind()
            ))),
        }
    }

    fn from_entry(&self, entry: EntryRecord) -> Conversions<'static> {
        let record = Record::from(from_entry(&entry));
        Box::new(iter::once(Ok::<_, Error>(record)))
    }
}
