//! NeXus containers
//!
//! The [`Container`] trait is the seam between the [`ContainerWriter`] and the
//! storage: groups, attributes, datasets and links addressed by [`NodePath`].
//!
//!     .
//!     ├── address.rs      # NodePath, ContainerAddress, output naming
//!     ├── link.rs         # link resolution (soft / external)
//!     ├── writer.rs       # record -> groups/datasets/attributes/links
//!     ├── tree.rs         # in-memory node tree persisted as JSON (default)
//!     └── hdf5.rs         # native HDF5 files (feature `hdf5`)

pub mod address;
#[cfg(feature = "hdf5")]
pub mod hdf5;
pub mod link;
pub mod tree;
pub mod writer;

pub use address::{ContainerAddress, NodePath, OutputNaming};
pub use link::{resolve_link, ResolvedLink};
pub use tree::TreeContainer;
pub use writer::{ContainerWriter, WriteOutcome};

use crate::error::Error;
use crate::model::Value;
use std::path::Path;

/// Storage for a hierarchy of groups.
///
/// Paths handed to the methods are absolute. Groups are created on demand;
/// datasets and links fail if their name is already taken.
pub trait Container {
    /// The file this container is stored in.
    fn file_path(&self) -> &Path;

    /// Create the group at `path` and any missing ancestors, or reuse it.
    fn require_group(&mut self, path: &NodePath) -> Result<(), Error>;

    /// Whether the group or dataset at `path` has attribute `name`.
    fn has_attribute(&self, path: &NodePath, name: &str) -> Result<bool, Error>;

    /// Set (or replace) an attribute of the group or dataset at `path`.
    fn set_attribute(&mut self, path: &NodePath, name: &str, value: Value) -> Result<(), Error>;

    fn write_dataset(&mut self, path: &NodePath, value: Value) -> Result<(), Error>;

    fn write_link(&mut self, path: &NodePath, link: ResolvedLink) -> Result<(), Error>;

    /// Persist pending changes.
    fn flush(&mut self) -> Result<(), Error>;

    /// Set an attribute unless one with that name already exists.
    fn set_attribute_if_absent(
        &mut self,
        path: &NodePath,
        name: &str,
        value: Value,
    ) -> Result<(), Error> {
        if !self.has_attribute(path, name)? {
            self.set_attribute(path, name, value)?;
        }
        Ok(())
    }
}
