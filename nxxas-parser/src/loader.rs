//! XDI file loading
//!
//! `XdiLoader` reads source text from a file or a string and decodes it. Files
//! above a size ceiling are refused before they are read.
//!
//! ```rust,ignore
//! use nxxas_parser::loader::XdiLoader;
//!
//! let record = XdiLoader::from_path("Fe_foil.xdi")?.decode()?;
//! let record = XdiLoader::from_string("# XDI/1.0\n# ---\n").decode()?;
//! ```

use crate::error::LoadError;
use crate::xdi::{looks_like_xdi, XdiDecoder, XdiRecord};
use std::fs;
use std::path::{Path, PathBuf};

/// Default ceiling on the size of a file read into memory (100 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Source text plus where it came from.
pub struct XdiLoader {
    source: String,
    path: PathBuf,
}

impl XdiLoader {
    /// Load from a file path with the default size ceiling.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        Self::from_path_with_limit(path, DEFAULT_MAX_FILE_SIZE)
    }

    /// Load from a file path, refusing files larger than `limit` bytes.
    pub fn from_path_with_limit<P: AsRef<Path>>(path: P, limit: u64) -> Result<Self, LoadError> {
        let path = path.as_ref().to_path_buf();
        let io_error = |source| LoadError::Io {
            path: path.clone(),
            source,
        };
        let size = fs::metadata(&path).map_err(io_error)?.len();
        if size > limit {
            return Err(LoadError::TooLarge { path, size, limit });
        }
        let source = fs::read_to_string(&path).map_err(io_error)?;
        Ok(Self { source, path })
    }

    /// Load from a string.
    pub fn from_string<S: Into<String>>(source: S) -> Self {
        Self {
            source: source.into(),
            path: PathBuf::from("<string>"),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the source opens with the XDI version marker.
    pub fn is_xdi(&self) -> bool {
        looks_like_xdi(&self.source)
    }

    /// Decode the source with the default column namer.
    pub fn decode(&self) -> Result<XdiRecord, LoadError> {
        XdiDecoder::new()
            .decode(&self.source)
            .map_err(|source| LoadError::Decode {
                path: self.path.clone(),
                source,
            })
    }
}
