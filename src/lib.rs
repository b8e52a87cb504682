//! # nxxas
//!
//! Conversion of x-ray absorption spectroscopy data between XDI text files and NeXus
//! containers.
//!
//! - [`parser`]: units, the XDI decoder and encoder
//! - [`babel`]: entry records, conversions, container writing, the batch pipeline
//! - [`config`]: layered configuration
//!
//! [`convert`] runs a batch with the given configuration.

pub use nxxas_babel as babel;
pub use nxxas_config as config;
pub use nxxas_parser as parser;

pub use nxxas_babel::{
    ConversionPipeline, ConversionRegistry, EntryRecord, Error, FormatRegistry, PipelineOptions,
    Record, RunReport,
};
pub use nxxas_parser::{UnitValue, XdiRecord};

use nxxas_babel::container::OutputNaming;
use nxxas_babel::{Backend, FormatOptions, Overwrite};
use nxxas_config::{ContainerBackend, NxxasConfig, OverwritePolicy};
use std::path::Path;

/// Pipeline options matching a configuration.
pub fn pipeline_options(config: &NxxasConfig) -> PipelineOptions {
    let convert = &config.convert;
    PipelineOptions {
        overwrite: match convert.overwrite {
            OverwritePolicy::Replace => Overwrite::Replace,
            OverwritePolicy::Prompt => Overwrite::Prompt,
            OverwritePolicy::Refuse => Overwrite::Refuse,
        },
        format: FormatOptions {
            max_file_size: convert.max_file_size,
            naming: OutputNaming {
                entry_prefix: convert.nexus.entry_prefix.clone(),
                index_width: convert.nexus.index_width,
            },
            backend: match convert.nexus.backend {
                ContainerBackend::Auto => Backend::Auto,
                ContainerBackend::Tree => Backend::Tree,
                ContainerBackend::Hdf5 => Backend::Hdf5,
            },
        },
    }
}

/// Convert every file matching `patterns` into `output` with the built-in formats.
///
/// An existing output is replaced unless the configuration says otherwise; `prompt` is
/// treated as a refusal since there is nobody to ask.
pub fn convert<S: AsRef<str>>(
    patterns: &[S],
    output: &Path,
    config: &NxxasConfig,
) -> Result<RunReport, Error> {
    let formats = FormatRegistry::with_defaults();
    let conversions = ConversionRegistry::with_defaults();
    let pipeline = ConversionPipeline::new(&formats, &conversions, pipeline_options(config));
    pipeline.run(
        patterns,
        output,
        config.convert.output_format.as_str(),
        &mut |_| false,
    )
}
