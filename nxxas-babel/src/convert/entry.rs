//! Entry records are the conversion hub, so both directions are the identity.

use super::{ConversionModule, Conversions};
use crate::error::Error;
use crate::model::{EntryRecord, Record, RecordKind};
use std::iter;

#[derive(Debug, Clone, Copy, Default)]
pub struct EntryConversion;

impl ConversionModule for EntryConversion {
    fn kind(&self) -> RecordKind {
        RecordKind::Entry
    }

    fn to_entries(&self, record: Record) -> Result<Conversions<'static>, Error> {
        Ok(Box::new(iter::once(Ok::<_, Error>(record))))
    }

    fn from_entry(&self, entry: EntryRecord) -> Conversions<'static> {
        Box::new(iter::once(Ok::<_, Error>(Record::from(entry))))
    }
}
