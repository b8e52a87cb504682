//! Record model
//!
//! Two record variants flow through a conversion: the flat [`XdiRecord`] read from
//! text files, and the validated [`EntryRecord`] that maps onto a NeXus entry.
//! [`Record`] is the tagged union the pipeline passes around.

pub mod domain;
pub mod entry;
pub mod node;

pub use domain::{Edge, Element, EntryKind, XasMode};
pub use entry::{
    default_plot, derive_title, EntryDraft, EntryRecord, Instrument, InstrumentName,
    LinkDescriptor, PlotDescriptor,
};
pub use node::{Field, Member, NxGroup, Value};

use nxxas_parser::XdiRecord;
use std::fmt;

/// The kind of a record, used to pick conversion modules and formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Xdi,
    Entry,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Xdi => f.write_str("XDI record"),
            RecordKind::Entry => f.write_str("NXxas entry"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Xdi(Box<XdiRecord>),
    Entry(Box<EntryRecord>),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Xdi(_) => RecordKind::Xdi,
            Record::Entry(_) => RecordKind::Entry,
        }
    }

    /// Suffix that tells apart several outputs sharing one entry index: the mode
    /// of a sub-entry, nothing otherwise.
    pub fn qualifier(&self) -> Option<String> {
        match self {
            Record::Entry(entry) if entry.kind() == EntryKind::SubEntry => {
                Some(entry.mode().slug())
            }
            _ => None,
        }
    }
}

impl From<XdiRecord> for Record {
    fn from(record: XdiRecord) -> Self {
        Record::Xdi(Box::new(record))
    }
}

impl From<EntryRecord> for Record {
    fn from(record: EntryRecord) -> Self {
        Record::Entry(Box::new(record))
    }
}
