//! Conversion of XAS records between XDI files and NeXus containers
//!
//!     The decoded XDI record (from nxxas-parser) and the validated NXxas entry are the two
//!     record kinds. Every conversion goes through the entry: a ConversionRegistry holds one
//!     module per kind mapping that kind to entries and back, so supporting a new kind means
//!     writing one module, not one per pair.
//!
//!     This is a pure lib: it powers nxxas-cli but does not print, read env vars or prompt.
//!     Interactive confirmation is a callback handed to the pipeline.
//!
//!     The file structure :
//!     .
//!     ├── error.rs                # Error taxonomy shared by every layer
//!     ├── model                   # EntryRecord, enumerated domains, role-tagged members
//!     ├── convert                 # ConversionModule + ConversionRegistry (xdi, entry)
//!     ├── container               # addresses, links, ContainerWriter, tree/hdf5 backends
//!     ├── format.rs               # Format trait, RecordSink
//!     ├── formats                 # xdi, nexus
//!     ├── registry.rs             # FormatRegistry for discovery and selection
//!     ├── pipeline.rs             # batch driver with per-unit failure isolation
//!     ├── definitions.rs          # class definitions, definition/instance validation
//!     └── lib.rs
//!
//! Testing
//!
//!     Unit tests live beside the code. tests/ converts the fixture files end to end into a tree
//!     container and checks the rendered hierarchy.
//!
//! Backends
//!
//!     The writer only talks to the Container trait. The default TreeContainer keeps the
//!     hierarchy in memory and stores it as JSON, which needs no native library and is what the
//!     validate command reads. Native HDF5 output is behind the `hdf5` cargo feature.

pub mod container;
pub mod convert;
pub mod definitions;
pub mod error;
pub mod format;
pub mod formats;
pub mod model;
pub mod pipeline;
pub mod registry;

pub use container::{Container, ContainerAddress, ContainerWriter, NodePath, TreeContainer};
pub use convert::ConversionRegistry;
pub use definitions::{BuiltinDefinitions, DefinitionProvider};
pub use error::Error;
pub use format::{Backend, Format, FormatOptions};
pub use model::{EntryRecord, Record, RecordKind};
pub use pipeline::{ConversionPipeline, Overwrite, PipelineOptions, RunReport};
pub use registry::FormatRegistry;
