//! Record -> container
//!
//! [`ContainerWriter`] walks an [`NxGroup`] member by member. Every member
//! carries its role, so dispatch is a match in priority order:
//!
//! ```text
//!     Group      create/reuse a sub-group, recurse; a default view marks
//!                every ancestor's `default` attribute
//!     Attribute  attribute of the current group
//!     Quantity   dataset of the magnitude + `units` attribute
//!     Link       resolved soft or external link
//!     Dataset    plain dataset with its own attributes
//! ```
//!
//! Before the walk the address is prepared: its depth must fit the record's
//! class (0 for NXroot, 1 for NXentry, 2 for NXsubentry) and the missing groups
//! on the way are created and classed.

use super::address::{ContainerAddress, NodePath};
use super::link::resolve_link;
use super::Container;
use crate::error::Error;
use crate::model::{EntryRecord, Member, NxGroup, Value};
use nxxas_parser::{Magnitude, UnitValue};

/// Groups nested deeper than this below the address are refused.
pub const MAX_GROUP_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(NodePath),
    /// The entry has no energy or no intensity values.
    SkippedNoData,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerWriter {
    absolute_links: bool,
}

/// Classes of the groups from the root down to `path` for a record of class
/// `nx_class`, checking the depth rule.
pub fn address_classes(nx_class: &str, path: &NodePath) -> Result<Vec<&'static str>, Error> {
    let depth = path.depth();
    let expected = match nx_class {
        "NXroot" => Some(0),
        "NXentry" => Some(1),
        "NXsubentry" => Some(2),
        _ => None,
    };
    if let Some(expected) = expected {
        if depth != expected {
            return Err(Error::Address {
                address: path.to_string(),
                reason: format!("{nx_class} must be written {expected} level(s) deep, not {depth}"),
            });
        }
    }
    Ok((0..depth)
        .map(|level| if level == 0 { "NXentry" } else { "NXsubentry" })
        .collect())
}

impl ContainerWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every link with an absolute target.
    pub fn with_absolute_links(mut self, absolute: bool) -> Self {
        self.absolute_links = absolute;
        self
    }

    /// Write an entry at `address`, unless it carries no data.
    pub fn write_entry(
        &self,
        container: &mut dyn Container,
        entry: &EntryRecord,
        address: &ContainerAddress,
    ) -> Result<WriteOutcome, Error> {
        if !entry.has_data() {
            tracing::debug!(%address, title = entry.title(), "entry has no data, not written");
            return Ok(WriteOutcome::SkippedNoData);
        }
        entry.check_shape()?;
        self.write(container, entry, address)?;
        Ok(WriteOutcome::Written(address.path.clone()))
    }

    /// Write any group record at `address`.
    pub fn write(
        &self,
        container: &mut dyn Container,
        group: &dyn NxGroup,
        address: &ContainerAddress,
    ) -> Result<(), Error> {
        if address.file != container.file_path() {
            return Err(Error::Address {
                address: address.to_string(),
                reason: format!("container is '{}'", container.file_path().display()),
            });
        }
        self.prepare(container, group.nx_class(), &address.path)?;
        self.write_group(container, group, &address.path, 0)
    }

    /// Create the groups leading to `path`, classing each one unless it
    /// already has a class.
    pub fn prepare(
        &self,
        container: &mut dyn Container,
        nx_class: &str,
        path: &NodePath,
    ) -> Result<(), Error> {
        let classes = address_classes(nx_class, path)?;
        let mut current = NodePath::root();
        container.require_group(&current)?;
        container.set_attribute_if_absent(&current, "NX_class", Value::from("NXroot"))?;
        for (name, class) in path.components().iter().zip(classes) {
            current = current.join(name);
            container.require_group(&current)?;
            container.set_attribute_if_absent(&current, "NX_class", Value::from(class))?;
        }
        Ok(())
    }

    fn write_group(
        &self,
        container: &mut dyn Container,
        group: &dyn NxGroup,
        at: &NodePath,
        depth: usize,
    ) -> Result<(), Error> {
        if depth > MAX_GROUP_DEPTH {
            return Err(Error::validation(format!(
                "'{at}' is nested more than {MAX_GROUP_DEPTH} groups deep"
            )));
        }
        for field in group.fields() {
            let path = at.join(field.name);
            match field.member {
                Member::Group(child) => {
                    container.require_group(&path)?;
                    self.write_group(container, child, &path, depth + 1)?;
                    if child.is_default_view() {
                        mark_default(container, &path)?;
                    }
                }
                Member::Attribute(value) => container.set_attribute(at, field.name, value)?,
                Member::Quantity(quantity) => write_quantity(container, &path, quantity)?,
                Member::Link(link) => {
                    let resolved = resolve_link(link, at, container.file_path(), self.absolute_links)?;
                    container.write_link(&path, resolved)?;
                }
                Member::Dataset { value, attrs } => {
                    container.write_dataset(&path, value)?;
                    for (name, value) in attrs {
                        container.set_attribute(&path, name, value)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Point the `default` attribute of every ancestor at the path towards `view`.
fn mark_default(container: &mut dyn Container, view: &NodePath) -> Result<(), Error> {
    let mut current = view.clone();
    while let Some(parent) = current.parent() {
        if let Some(name) = current.name() {
            container.set_attribute(&parent, "default", Value::from(name))?;
        }
        current = parent;
    }
    Ok(())
}

/// Empty quantities are not written.
fn write_quantity(container: &mut dyn Container, path: &NodePath, quantity: &UnitValue) -> Result<(), Error> {
    if quantity.is_empty() {
        return Ok(());
    }
    let value = match quantity.magnitude() {
        Magnitude::Scalar(value) => Value::Float(*value),
        Magnitude::Array(values) => Value::Floats(values.clone()),
    };
    container.write_dataset(path, value)?;
    if !quantity.unit().is_dimensionless() {
        container.set_attribute(path, "units", Value::from(quantity.unit().to_string()))?;
    }
    Ok(())
}
