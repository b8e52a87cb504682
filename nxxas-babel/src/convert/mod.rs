//! Record conversion
//!
//! Conversions go through the entry record as a hub:
//!
//! ```text
//!     source ──to_entries──> EntryRecord* ──from_entry──> target*
//! ```
//!
//! Each registered [`ConversionModule`] knows how to reach the hub from its own
//! record kind and how to come back. Converting a record to its own kind is the
//! identity. Both directions are lazy: the returned [`Conversions`] iterator
//! builds one output at a time and is exhausted after a single pass.

pub mod entry;
pub mod xdi;

use crate::error::Error;
use crate::model::{EntryRecord, Record, RecordKind};
use std::collections::HashMap;
use std::iter;

/// A one-shot sequence of converted records. Each item fails independently.
pub type Conversions<'a> = Box<dyn Iterator<Item = Result<Record, Error>> + 'a>;

/// Mapping between one record kind and the entry hub.
pub trait ConversionModule: Send + Sync {
    fn kind(&self) -> RecordKind;

    /// Zero or more entries from one record of this module's kind.
    fn to_entries(&self, record: Record) -> Result<Conversions<'static>, Error>;

    /// Records of this module's kind from one entry.
    fn from_entry(&self, entry: EntryRecord) -> Conversions<'static>;
}

/// Conversion modules keyed by record kind.
pub struct ConversionRegistry {
    modules: HashMap<RecordKind, Box<dyn ConversionModule>>,
}

impl ConversionRegistry {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Register a module, replacing any module for the same kind.
    pub fn register<M: ConversionModule + 'static>(&mut self, module: M) {
        self.modules.insert(module.kind(), Box::new(module));
    }

    pub fn has(&self, kind: RecordKind) -> bool {
        self.modules.contains_key(&kind)
    }

    fn module(&self, kind: RecordKind) -> Option<&dyn ConversionModule> {
        self.modules.get(&kind).map(|module| module.as_ref())
    }

    /// Convert `record` to `target`, lazily.
    pub fn convert<'a>(&'a self, record: Record, target: RecordKind) -> Result<Conversions<'a>, Error> {
        let source = record.kind();
        if source == target {
            return Ok(Box::new(iter::once(Ok::<_, Error>(record))));
        }
        let (Some(from), Some(to)) = (self.module(source), self.module(target)) else {
            return Err(Error::unsupported(format!(
                "conversion from {source} to {target} is not implemented"
            )));
        };

        let entries = from.to_entries(record)?;
        Ok(Box::new(entries.flat_map(move |entry| -> Conversions<'a> {
            match entry {
                Ok(Record::Entry(entry)) => to.from_entry(*entry),
                Ok(other) => Box::new(iter::once(Err(Error::validation(format!(
                    "expected an entry record, got {}",
                    other.kind()
                ))))),
                Err(err) => Box::new(iter::once(Err(err))),
            }
        })))
    }

    /// Registry with the XDI and entry modules.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(xdi::XdiConversion);
        registry.register(entry::EntryConversion);
        registry
    }
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
