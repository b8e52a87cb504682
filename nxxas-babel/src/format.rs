//! Format trait definition
//!
//! A [`Format`] reads records from files of one kind and/or opens a
//! [`RecordSink`] that stores records of its kind. Formats advertise what they
//! support; the default `load`/`sink` report an unsupported operation.

use crate::container::OutputNaming;
use crate::error::Error;
use crate::model::{Record, RecordKind};
use std::path::Path;

/// A one-shot sequence of records read from one file.
pub type Records = Box<dyn Iterator<Item = Result<Record, Error>>>;

/// Storage backend for container formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// HDF5 when built with the `hdf5` feature, the JSON node tree otherwise.
    #[default]
    Auto,
    /// JSON node tree.
    Tree,
    /// Native HDF5, when built with the `hdf5` feature.
    Hdf5,
}

impl Backend {
    /// The concrete backend this build writes with.
    pub fn resolve(self) -> Backend {
        match self {
            Backend::Auto if cfg!(feature = "hdf5") => Backend::Hdf5,
            Backend::Auto => Backend::Tree,
            other => other,
        }
    }
}

/// Settings shared by loading and saving.
#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// Input files larger than this are refused.
    pub max_file_size: u64,
    pub naming: OutputNaming,
    pub backend: Backend,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            max_file_size: nxxas_parser::loader::DEFAULT_MAX_FILE_SIZE,
            naming: OutputNaming::default(),
            backend: Backend::default(),
        }
    }
}

/// What a sink did with a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Stored at the given location (file or container address).
    Saved(String),
    /// Nothing to store.
    SkippedNoData,
}

/// Destination of one conversion run.
pub trait RecordSink {
    /// Store `record` as part of output number `index` of the run.
    fn save(&mut self, record: &Record, index: usize) -> Result<SaveOutcome, Error>;

    /// Persist everything. Called once at the end of the run.
    fn finish(&mut self) -> Result<(), Error>;
}

/// Trait for record formats
///
/// # Examples
///
/// ```ignore
/// struct CsvFormat;
///
/// impl Format for CsvFormat {
///     fn name(&self) -> &str {
///         "csv"
///     }
///
///     fn record_kind(&self) -> RecordKind {
///         RecordKind::Xdi
///     }
/// }
/// ```
pub trait Format: Send + Sync {
    /// The name of this format (e.g., "xdi", "nexus")
    fn name(&self) -> &str;

    /// Optional description of this format
    fn description(&self) -> &str {
        ""
    }

    /// Kind of the records this format reads and writes
    fn record_kind(&self) -> RecordKind;

    fn supports_loading(&self) -> bool {
        false
    }

    fn supports_saving(&self) -> bool {
        false
    }

    /// Whether `path` looks like a file of this format
    fn detect(&self, _path: &Path) -> bool {
        false
    }

    /// Read the records of one file
    fn load(&self, path: &Path, _options: &FormatOptions) -> Result<Records, Error> {
        Err(Error::unsupported(format!(
            "format '{}' does not support loading ({})",
            self.name(),
            path.display()
        )))
    }

    /// Open a sink writing to `output`
    fn sink(&self, _output: &Path, _options: &FormatOptions) -> Result<Box<dyn RecordSink>, Error> {
        Err(Error::unsupported(format!(
            "format '{}' does not support saving",
            self.name()
        )))
    }
}
