//! Link resolution
//!
//! A [`LinkDescriptor`] names a target node and, optionally, another container
//! file. At write time it becomes either a soft link inside the current
//! container or an external link into another file:
//!
//! - same file (or no file): a soft link relative to the linking group, unless
//!   an absolute link is requested or the relative path climbs upward (`..`),
//!   in which case the absolute in-file path is used.
//! - other file: an external link whose file path is relative to the directory
//!   of the current container, unless an absolute link is requested. The node
//!   path inside the other file is always absolute.

use super::address::NodePath;
use crate::error::Error;
use crate::model::LinkDescriptor;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// A link ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvedLink {
    Soft(String),
    External { file: PathBuf, target: String },
}

/// Lexically normalize a file path: drop `.`, fold `name/..`.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Resolve `link` for the group at `group` inside `container_file`.
pub fn resolve_link(
    link: &LinkDescriptor,
    group: &NodePath,
    container_file: &Path,
    absolute: bool,
) -> Result<ResolvedLink, Error> {
    let target = group.resolve(&link.target_name)?;
    let container_dir = container_file.parent().unwrap_or_else(|| Path::new(""));
    let this_file = normalize(container_file);

    let target_file = link
        .target_filename
        .as_deref()
        .map(|file| normalize(&container_dir.join(file)))
        .filter(|file| *file != this_file);

    match target_file {
        None => {
            let relative = target.relative_to(group);
            let climbs = relative.split('/').any(|part| part == "..");
            if absolute || climbs {
                Ok(ResolvedLink::Soft(target.to_string()))
            } else {
                Ok(ResolvedLink::Soft(relative))
            }
        }
        Some(file) => {
            let file = if absolute {
                file
            } else {
                pathdiff::diff_paths(&file, normalize(container_dir)).unwrap_or(file)
            };
            Ok(ResolvedLink::External {
                file,
                target: target.to_string(),
            })
        }
    }
}
