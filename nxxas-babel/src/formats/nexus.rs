//! NeXus containers
//!
//! Saving places every entry of a run in one container file at
//! `/<prefix><NN>[/<mode>]`. Reading NeXus input is not implemented.

use super::file_head;
use crate::container::{Container, ContainerWriter, OutputNaming, TreeContainer, WriteOutcome};
use crate::error::Error;
use crate::format::{Backend, Format, FormatOptions, RecordSink, Records, SaveOutcome};
use crate::model::{Record, RecordKind};
use std::path::Path;

/// HDF5 file signature.
const HDF5_MAGIC: &[u8] = b"\x89HDF\r\n\x1a\n";

/// File extensions recognized as NeXus without looking at the content.
pub const EXTENSIONS: &[&str] = &["nxs", "nx5", "h5", "hdf5"];

#[derive(Debug, Clone, Copy, Default)]
pub struct NexusFormat;

impl Format for NexusFormat {
    fn name(&self) -> &str {
        "nexus"
    }

    fn description(&self) -> &str {
        "NeXus containers holding NXxas entries"
    }

    fn record_kind(&self) -> RecordKind {
        RecordKind::Entry
    }

    fn supports_saving(&self) -> bool {
        true
    }

    fn detect(&self, path: &Path) -> bool {
        let by_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        by_extension || file_head(path, HDF5_MAGIC.len() as u64) == HDF5_MAGIC
    }

    fn load(&self, path: &Path, _options: &FormatOptions) -> Result<Records, Error> {
        Err(Error::unsupported(format!(
            "reading NeXus files is not implemented ({})",
            path.display()
        )))
    }

    fn sink(&self, output: &Path, options: &FormatOptions) -> Result<Box<dyn RecordSink>, Error> {
        Ok(Box::new(NexusSink {
            container: open_container(output, options.backend)?,
            writer: ContainerWriter::new(),
            naming: options.naming.clone(),
        }))
    }
}

fn open_container(output: &Path, backend: Backend) -> Result<Box<dyn Container>, Error> {
    match backend.resolve() {
        Backend::Auto | Backend::Tree => Ok(Box::new(TreeContainer::open(output)?)),
        #[cfg(feature = "hdf5")]
        Backend::Hdf5 => Ok(Box::new(crate::container::hdf5::Hdf5Container::open(output)?)),
        #[cfg(not(feature = "hdf5"))]
        Backend::Hdf5 => Err(Error::Container(
            "the hdf5 backend is not available in this build".into(),
        )),
    }
}

/// Writes entries into one shared container, flushed when the run ends.
pub struct NexusSink {
    container: Box<dyn Container>,
    writer: ContainerWriter,
    naming: OutputNaming,
}

impl RecordSink for NexusSink {
    fn save(&mut self, record: &Record, index: usize) -> Result<SaveOutcome, Error> {
        let Record::Entry(entry) = record else {
            return Err(Error::unsupported(format!(
                "cannot write a {} into a NeXus container",
                record.kind()
            )));
        };
        let address = self.naming.nexus_address(
            self.container.file_path(),
            index,
            record.qualifier().as_deref(),
        );
        match self.writer.write_entry(self.container.as_mut(), entry, &address)? {
            WriteOutcome::Written(_) => Ok(SaveOutcome::Saved(address.to_string())),
            WriteOutcome::SkippedNoData => Ok(SaveOutcome::SkippedNoData),
        }
    }

    fn finish(&mut self) -> Result<(), Error> {
        self.container.flush()
    }
}
