//! Error type shared by the conversion, writing and validation layers.

use nxxas_parser::{DecodeError, LoadError, UnitError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can abort one unit of work.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error(transparent)]
    Unit(#[from] UnitError),

    /// A record breaks a schema rule.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No mapping exists, or the mapping is known but not implemented.
    #[error("not supported: {0}")]
    UnsupportedConversion(String),

    /// The address depth does not fit the record kind.
    #[error("invalid address '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The storage backend rejected an operation.
    #[error("container error: {0}")]
    Container(String),
}

impl Error {
    /// Expected limitations are logged at a lower severity than failures.
    pub fn is_expected(&self) -> bool {
        matches!(self, Error::UnsupportedConversion(_))
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Error::UnsupportedConversion(message.into())
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}

impl From<LoadError> for Error {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Io { path, source } => Error::Io { path, source },
            LoadError::TooLarge { path, size, limit } => Error::Io {
                path,
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("file is {size} bytes, larger than the {limit} byte limit"),
                ),
            },
            LoadError::Decode { path, source } => Error::Decode { path, source },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Container(err.to_string())
    }
}
