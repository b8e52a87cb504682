//! Shared configuration loader for nxxas.
//!
//! `defaults/nxxas.default.toml` is embedded into the binary so that the documented
//! defaults and runtime behavior stay in sync. Applications layer user files and
//! single-key overrides on top of those defaults via [`Loader`] before
//! deserializing into [`NxxasConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/nxxas.default.toml");

/// Name of the optional per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = "nxxas.toml";

/// Top-level configuration consumed by nxxas applications.
#[derive(Debug, Clone, Deserialize)]
pub struct NxxasConfig {
    pub convert: ConvertConfig,
    pub logging: LoggingConfig,
}

/// Knobs of the `convert` command.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertConfig {
    pub output_format: OutputFormat,
    pub overwrite: OverwritePolicy,
    pub max_file_size: u64,
    pub nexus: NexusConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Nexus,
    Xdi,
}

impl OutputFormat {
    /// Name of the matching record format.
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Nexus => "nexus",
            OutputFormat::Xdi => "xdi",
        }
    }
}

/// What to do with an output file that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverwritePolicy {
    Replace,
    Prompt,
    Refuse,
}

/// Addressing and storage of NeXus output.
#[derive(Debug, Clone, Deserialize)]
pub struct NexusConfig {
    pub entry_prefix: String,
    pub index_width: usize,
    pub backend: ContainerBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerBackend {
    /// HDF5 when the build supports it, the JSON tree otherwise.
    Auto,
    Tree,
    Hdf5,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// A `tracing` filter directive, e.g. `info` or `nxxas_babel=debug`.
    pub level: String,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (used for command-line flags).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<NxxasConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<NxxasConfig, ConfigError> {
    Loader::new().build()
}
