//! XAS Data Interchange (XDI) text format
//!
//!     Reading goes through [`XdiDecoder`], writing through [`encode`]. Both share the
//!     [`XdiRecord`] model.
//!
//!     File layout:
//!
//!     ```text
//!     # XDI/1.0 GSE/1.0                 version line
//!     # Column.1: energy eV             column declarations (name + optional unit)
//!     # Element.symbol: Co              namespaced fields
//!     # ///                             end of fields
//!     # room temperature                free-text comments
//!     #----                             end of header
//!     7509.0000 -0.51329170             data rows
//!     ```

pub mod columns;
pub mod decoder;
pub mod encoder;
pub mod record;
pub mod tokens;
pub mod values;

pub use columns::{AliasNamer, ColumnNamer};
pub use decoder::{looks_like_xdi, XdiDecoder};
pub use encoder::encode;
pub use record::{Column, DataTable, FieldValue, Namespace, XdiRecord, XdiVersion};
