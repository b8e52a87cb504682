//! Error types for unit handling, XDI decoding and file loading

use std::path::PathBuf;
use thiserror::Error;

/// A unit expression that does not resolve against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("unknown unit symbol '{0}'")]
    UnknownSymbol(String),
    #[error("malformed unit expression '{0}'")]
    Malformed(String),
}

/// Malformed XDI text. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("XDI text does not start with '# XDI' (line {line}: '{content}')")]
    MissingVersion { line: usize, content: String },
    #[error("XDI text is empty")]
    Empty,
    #[error("invalid XDI header line {line}: '{content}'")]
    InvalidHeaderLine { line: usize, content: String },
    #[error("invalid column declaration 'Column.{index}' on line {line}")]
    InvalidColumn { line: usize, index: String },
    #[error("non-numeric value '{token}' in data row on line {line}")]
    InvalidDataToken { line: usize, token: String },
    #[error("XDI header is not terminated by a '# ---' line")]
    MissingHeaderEnd,
}

/// Failure to read a source file into records.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("'{path}' is {size} bytes, above the {limit} byte limit")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
    #[error("'{path}' is not valid XDI: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}
