//! Format registry for format discovery and selection
//!
//! Formats are registered and retrieved by name, or detected from an input path.

use crate::error::Error;
use crate::format::Format;
use std::collections::HashMap;
use std::path::Path;

/// Registry of record formats
///
/// # Examples
///
/// ```ignore
/// let registry = FormatRegistry::with_defaults();
/// let format = registry.get("nexus")?;
/// let sink = format.sink(Path::new("out.nxs"), &FormatOptions::default())?;
/// ```
pub struct FormatRegistry {
    formats: HashMap<String, Box<dyn Format>>,
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        FormatRegistry {
            formats: HashMap::new(),
        }
    }

    /// Register a format
    ///
    /// If a format with the same name already exists, it will be replaced.
    pub fn register<F: Format + 'static>(&mut self, format: F) {
        self.formats
            .insert(format.name().to_string(), Box::new(format));
    }

    /// Get a format by name
    pub fn get(&self, name: &str) -> Result<&dyn Format, Error> {
        self.formats
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| Error::unsupported(format!("unknown format '{name}'")))
    }

    /// Check if a format exists
    pub fn has(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// List all available format names (sorted)
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }

    /// The first format recognizing `path`. Formats that can load are asked
    /// before save-only ones, each group by name.
    pub fn detect(&self, path: &Path) -> Result<&dyn Format, Error> {
        let mut formats: Vec<&dyn Format> = self
            .list_formats()
            .iter()
            .filter_map(|name| self.formats.get(name))
            .map(|f| f.as_ref())
            .collect();
        formats.sort_by_key(|f| !f.supports_loading());
        formats
            .into_iter()
            .find(|f| f.detect(path))
            .ok_or_else(|| {
                Error::unsupported(format!("{}: no format recognizes this file", path.display()))
            })
    }

    /// Create a registry with default formats
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(crate::formats::NexusFormat);
        registry.register(crate::formats::XdiFormat);

        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
