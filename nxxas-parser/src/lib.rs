//! # nxxas-parser
//!
//! Text-side building blocks for converting x-ray absorption spectra:
//!
//! - [`units`]: unit-aware scalars and sequences ([`units::UnitValue`]) backed by a
//!   registry of recognized unit symbols.
//! - [`xdi`]: the XDI interchange format, decoded into an [`xdi::XdiRecord`] and
//!   encoded back to text.
//! - [`loader`]: reading XDI files from disk with a size ceiling.
//!
//! Nothing here knows about NeXus; the container side lives in `nxxas-babel`.

pub mod error;
pub mod loader;
pub mod units;
pub mod xdi;

pub use error::{DecodeError, LoadError, UnitError};
pub use loader::XdiLoader;
pub use units::{Magnitude, Unit, UnitValue};
pub use xdi::XdiRecord;
