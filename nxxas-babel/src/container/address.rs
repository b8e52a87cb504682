//! Container addressing
//!
//! A container address is `<file-path>?path=<internal-group-path>`; without the
//! query it addresses the root of the container. `file:` URLs are accepted too.
//!
//! ```text
//!     out/Fe.nxs?path=/dataset01/fluorescence_yield
//!     └──file───┘     └────────NodePath────────────┘
//! ```

use crate::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::{form_urlencoded, Url};

/// An absolute path inside a container, `/` being the root group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<String>);

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse an in-container path. `.` and `..` are resolved; a path climbing
    /// above the root is an error. A leading `/` is optional.
    pub fn parse(path: &str) -> Result<Self, Error> {
        Self::root().resolve(path.trim_start_matches('/'))
    }

    /// Resolve `target` against this path: absolute targets start with `/`,
    /// anything else is relative to `self`.
    pub fn resolve(&self, target: &str) -> Result<Self, Error> {
        let mut parts = if target.starts_with('/') {
            Vec::new()
        } else {
            self.0.clone()
        };
        for part in target.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    if parts.pop().is_none() {
                        return Err(Error::Address {
                            address: target.to_string(),
                            reason: format!("climbs above the root from '{self}'"),
                        });
                    }
                }
                name => parts.push(name.to_string()),
            }
        }
        Ok(Self(parts))
    }

    pub fn components(&self) -> &[String] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.0.split_last()?;
        Some(Self(parent.to_vec()))
    }

    pub fn join(&self, name: &str) -> Self {
        let mut parts = self.0.clone();
        parts.push(name.to_string());
        Self(parts)
    }

    /// The relative path leading from `base` to `self`, e.g. `../energy`.
    pub fn relative_to(&self, base: &NodePath) -> String {
        let common = self
            .0
            .iter()
            .zip(&base.0)
            .take_while(|(a, b)| a == b)
            .count();
        let mut parts: Vec<&str> = vec![".."; base.depth() - common];
        parts.extend(self.0[common..].iter().map(String::as_str));
        if parts.is_empty() {
            ".".to_string()
        } else {
            parts.join("/")
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for part in &self.0 {
            write!(f, "/{part}")?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A container file plus the group inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerAddress {
    pub file: PathBuf,
    pub path: NodePath,
}

impl ContainerAddress {
    pub fn new(file: impl Into<PathBuf>, path: NodePath) -> Self {
        Self {
            file: file.into(),
            path,
        }
    }

    /// The root of a container file.
    pub fn root(file: impl Into<PathBuf>) -> Self {
        Self::new(file, NodePath::root())
    }
}

fn invalid(address: &str, reason: impl Into<String>) -> Error {
    Error::Address {
        address: address.to_string(),
        reason: reason.into(),
    }
}

fn internal_path(address: &str, query: Option<&str>) -> Result<NodePath, Error> {
    let path = query
        .and_then(|query| {
            form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "path")
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_default();
    NodePath::parse(&path).map_err(|err| invalid(address, err.to_string()))
}

impl FromStr for ContainerAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("file:") {
            let url = Url::parse(s).map_err(|err| invalid(s, err.to_string()))?;
            let file = url
                .to_file_path()
                .map_err(|_| invalid(s, "not a local file URL"))?;
            return Ok(Self::new(file, internal_path(s, url.query())?));
        }
        let (file, query) = match s.split_once('?') {
            Some((file, query)) => (file, Some(query)),
            None => (s, None),
        };
        if file.is_empty() {
            return Err(invalid(s, "missing file path"));
        }
        Ok(Self::new(file, internal_path(s, query)?))
    }
}

impl fmt::Display for ContainerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file.display())?;
        if !self.path.is_root() {
            write!(f, "?path={}", self.path)?;
        }
        Ok(())
    }
}

/// How the pipeline names its outputs: entry `<n>` of a run is written to
/// `/<prefix><n>` (zero-padded), sub-entries below it by mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNaming {
    pub entry_prefix: String,
    pub index_width: usize,
}

impl Default for OutputNaming {
    fn default() -> Self {
        Self {
            entry_prefix: "dataset".to_string(),
            index_width: 2,
        }
    }
}

impl OutputNaming {
    fn entry_name(&self, index: usize) -> String {
        format!("{}{:0width$}", self.entry_prefix, index, width = self.index_width)
    }

    /// `/dataset01` or `/dataset01/<qualifier>`.
    pub fn entry_path(&self, index: usize, qualifier: Option<&str>) -> NodePath {
        let path = NodePath::root().join(&self.entry_name(index));
        match qualifier {
            Some(qualifier) => path.join(qualifier),
            None => path,
        }
    }

    pub fn nexus_address(&self, file: &Path, index: usize, qualifier: Option<&str>) -> ContainerAddress {
        ContainerAddress::new(file, self.entry_path(index, qualifier))
    }

    /// `<dir>/<stem>_<NN>[_<qualifier>]<.ext>` beside `output`.
    pub fn file_path(&self, output: &Path, index: usize, qualifier: Option<&str>) -> PathBuf {
        let stem = output
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut name = format!("{stem}_{:0width$}", index, width = self.index_width);
        if let Some(qualifier) = qualifier {
            name.push('_');
            name.push_str(qualifier);
        }
        if let Some(extension) = output.extension() {
            name.push('.');
            name.push_str(&extension.to_string_lossy());
        }
        output.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/", "/", 0)]
    #[case("", "/", 0)]
    #[case("/dataset01", "/dataset01", 1)]
    #[case("dataset01/transmission", "/dataset01/transmission", 2)]
    #[case("/a/./b/../c", "/a/c", 2)]
    fn parses_node_paths(#[case] raw: &str, #[case] display: &str, #[case] depth: usize) {
        let path = NodePath::parse(raw).unwrap();
        assert_eq!(path.to_string(), display);
        assert_eq!(path.depth(), depth);
    }

    #[test]
    fn climbing_above_root_fails() {
        assert!(matches!(NodePath::parse("/a/../.."), Err(Error::Address { .. })));
        let plot = NodePath::parse("/dataset01/plot").unwrap();
        assert!(plot.resolve("../../../energy").is_err());
    }

    #[rstest]
    #[case("/dataset01/energy", "/dataset01/plot", "../energy")]
    #[case("/dataset01/plot/energy", "/dataset01", "plot/energy")]
    #[case("/a/b", "/a/b", ".")]
    #[case("/x/y", "/a/b", "../../x/y")]
    fn relative_paths(#[case] target: &str, #[case] base: &str, #[case] expected: &str) {
        let target = NodePath::parse(target).unwrap();
        let base = NodePath::parse(base).unwrap();
        assert_eq!(target.relative_to(&base), expected);
        assert_eq!(base.resolve(expected).unwrap(), target);
    }

    #[rstest]
    #[case("out.nxs", "out.nxs", "/")]
    #[case("out.nxs?path=/dataset01", "out.nxs", "/dataset01")]
    #[case("dir/out.nxs?path=%2Fdataset01%2Ftransmission", "dir/out.nxs", "/dataset01/transmission")]
    #[case("file:///data/out.nxs?path=/dataset02", "/data/out.nxs", "/dataset02")]
    fn parses_addresses(#[case] raw: &str, #[case] file: &str, #[case] path: &str) {
        let address: ContainerAddress = raw.parse().unwrap();
        assert_eq!(address.file, PathBuf::from(file));
        assert_eq!(address.path.to_string(), path);
    }

    #[test]
    fn addresses_display_like_they_parse() {
        let address: ContainerAddress = "out.nxs?path=/dataset01/transmission".parse().unwrap();
        assert_eq!(address.to_string(), "out.nxs?path=/dataset01/transmission");
        assert_eq!(ContainerAddress::root("out.nxs").to_string(), "out.nxs");
    }

    #[test]
    fn rejects_missing_file() {
        assert!("?path=/a".parse::<ContainerAddress>().is_err());
    }

    #[test]
    fn names_entries_by_index_and_mode() {
        let naming = OutputNaming::default();
        assert_eq!(naming.entry_path(1, None).to_string(), "/dataset01");
        assert_eq!(
            naming.entry_path(12, Some("fluorescence_yield")).to_string(),
            "/dataset12/fluorescence_yield"
        );
        let wide = OutputNaming {
            entry_prefix: "scan".into(),
            index_width: 4,
        };
        assert_eq!(wide.entry_path(7, None).to_string(), "/scan0007");
    }

    #[test]
    fn names_files_beside_the_output() {
        let naming = OutputNaming::default();
        assert_eq!(
            naming.file_path(Path::new("out/fe.xdi"), 3, None),
            PathBuf::from("out/fe_03.xdi")
        );
        assert_eq!(
            naming.file_path(Path::new("fe.xdi"), 1, Some("transmission")),
            PathBuf::from("fe_01_transmission.xdi")
        );
    }
}
