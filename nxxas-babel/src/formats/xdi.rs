//! XDI text files
//!
//! Loading yields one record per file. Saving writes each record to its own
//! file beside the requested output, named `<stem>_<NN>[_<mode>]<.ext>`.

use super::file_head;
use crate::error::Error;
use crate::format::{Format, FormatOptions, RecordSink, Records, SaveOutcome};
use crate::container::OutputNaming;
use crate::model::{Record, RecordKind};
use nxxas_parser::xdi::{encode, looks_like_xdi};
use nxxas_parser::XdiLoader;
use std::fs;
use std::iter;
use std::path::{Path, PathBuf};

/// Bytes read to recognize an XDI file.
const HEAD_LEN: u64 = 4096;

#[derive(Debug, Clone, Copy, Default)]
pub struct XdiFormat;

impl Format for XdiFormat {
    fn name(&self) -> &str {
        "xdi"
    }

    fn description(&self) -> &str {
        "XAS Data Interchange text files"
    }

    fn record_kind(&self) -> RecordKind {
        RecordKind::Xdi
    }

    fn supports_loading(&self) -> bool {
        true
    }

    fn supports_saving(&self) -> bool {
        true
    }

    fn detect(&self, path: &Path) -> bool {
        looks_like_xdi(&String::from_utf8_lossy(&file_head(path, HEAD_LEN)))
    }

    fn load(&self, path: &Path, options: &FormatOptions) -> Result<Records, Error> {
        let loader = XdiLoader::from_path_with_limit(path, options.max_file_size)?;
        let record = loader.decode()?;
        Ok(Box::new(iter::once(Ok::<_, Error>(Record::from(record)))))
    }

    fn sink(&self, output: &Path, options: &FormatOptions) -> Result<Box<dyn RecordSink>, Error> {
        Ok(Box::new(XdiSink {
            output: output.to_path_buf(),
            naming: options.naming.clone(),
        }))
    }
}

/// Writes every record to its own XDI file.
pub struct XdiSink {
    output: PathBuf,
    naming: OutputNaming,
}

impl RecordSink for XdiSink {
    fn save(&mut self, record: &Record, index: usize) -> Result<SaveOutcome, Error> {
        let Record::Xdi(xdi) = record else {
            return Err(Error::unsupported(format!("cannot save a {} as XDI", record.kind())));
        };
        if xdi.data.is_empty() {
            return Ok(SaveOutcome::SkippedNoData);
        }
        let path = self
            .naming
            .file_path(&self.output, index, record.qualifier().as_deref());
        fs::write(&path, encode(xdi)).map_err(|err| Error::io(&path, err))?;
        Ok(SaveOutcome::Saved(path.display().to_string()))
    }

    fn finish(&mut self) -> Result<(), Error> {
        Ok(())
    }
}
