//! Built-in record formats

pub mod nexus;
pub mod xdi;

pub use nexus::NexusFormat;
pub use xdi::XdiFormat;

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Up to `len` leading bytes of a file; empty if it cannot be read.
pub(crate) fn file_head(path: &Path, len: u64) -> Vec<u8> {
    let mut head = Vec::new();
    if let Ok(file) = File::open(path) {
        let _ = file.take(len).read_to_end(&mut head);
    }
    head
}
