//! Native HDF5 backend (feature `hdf5`).

use super::address::NodePath;
use super::link::ResolvedLink;
use super::Container;
use crate::error::Error;
use crate::model::Value;
use hdf5::types::VarLenUnicode;
use hdf5::{File, Group, Location};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

fn h5_error(err: impl Display) -> Error {
    Error::Container(err.to_string())
}

fn unicode(text: &str) -> Result<VarLenUnicode, Error> {
    VarLenUnicode::from_str(text).map_err(h5_error)
}

/// A NeXus file on disk, opened for appending.
pub struct Hdf5Container {
    path: PathBuf,
    file: File,
}

impl Hdf5Container {
    /// Open `path` read/write, creating it if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let file = File::append(&path).map_err(h5_error)?;
        Ok(Self { path, file })
    }

    fn group(&self, path: &NodePath) -> Result<Group, Error> {
        self.file.group(&path.to_string()).map_err(h5_error)
    }

    fn parent_and_name<'a>(&self, path: &'a NodePath) -> Result<(Group, &'a str), Error> {
        let (Some(parent), Some(name)) = (path.parent(), path.name()) else {
            return Err(Error::Container("the root cannot be replaced".into()));
        };
        Ok((self.group(&parent)?, name))
    }

    /// Run `f` on the group or dataset at `path`.
    fn with_location<T>(
        &self,
        path: &NodePath,
        f: impl FnOnce(&Location) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let name = path.to_string();
        match self.file.group(&name) {
            Ok(group) => f(&group),
            Err(_) => {
                let dataset = self.file.dataset(&name).map_err(h5_error)?;
                f(&dataset)
            }
        }
    }
}

fn write_attribute(location: &Location, name: &str, value: &Value) -> Result<(), Error> {
    let exists = location.attr_names().map_err(h5_error)?.iter().any(|n| n == name);
    if exists {
        location.delete_attr(name).map_err(h5_error)?;
    }
    match value {
        Value::Int(v) => location
            .new_attr::<i64>()
            .create(name)
            .and_then(|attr| attr.write_scalar(v)),
        Value::Float(v) => location
            .new_attr::<f64>()
            .create(name)
            .and_then(|attr| attr.write_scalar(v)),
        Value::Text(v) => {
            let v = unicode(v)?;
            location
                .new_attr::<VarLenUnicode>()
                .create(name)
                .and_then(|attr| attr.write_scalar(&v))
        }
        Value::Floats(v) => location
            .new_attr::<f64>()
            .shape(v.len())
            .create(name)
            .and_then(|attr| attr.write_raw(v)),
        Value::Texts(v) => {
            let v = v.iter().map(|s| unicode(s)).collect::<Result<Vec<_>, _>>()?;
            location
                .new_attr::<VarLenUnicode>()
                .shape(v.len())
                .create(name)
                .and_then(|attr| attr.write_raw(&v))
        }
    }
    .map_err(h5_error)
}

fn write_dataset(group: &Group, name: &str, value: &Value) -> Result<(), Error> {
    match value {
        Value::Int(v) => group
            .new_dataset::<i64>()
            .create(name)
            .and_then(|ds| ds.write_scalar(v)),
        Value::Float(v) => group
            .new_dataset::<f64>()
            .create(name)
            .and_then(|ds| ds.write_scalar(v)),
        Value::Text(v) => {
            let v = unicode(v)?;
            group
                .new_dataset::<VarLenUnicode>()
                .create(name)
                .and_then(|ds| ds.write_scalar(&v))
        }
        Value::Floats(v) => group
            .new_dataset::<f64>()
            .shape(v.len())
            .create(name)
            .and_then(|ds| ds.write_raw(v)),
        Value::Texts(v) => {
            let v = v.iter().map(|s| unicode(s)).collect::<Result<Vec<_>, _>>()?;
            group
                .new_dataset::<VarLenUnicode>()
                .shape(v.len())
                .create(name)
                .and_then(|ds| ds.write_raw(&v))
        }
    }
    .map_err(h5_error)
}

impl Container for Hdf5Container {
    fn file_path(&self) -> &Path {
        &self.path
    }

    fn require_group(&mut self, path: &NodePath) -> Result<(), Error> {
        let mut group = self.group(&NodePath::root())?;
        for name in path.components() {
            group = if group.link_exists(name) {
                group.group(name)
            } else {
                group.create_group(name)
            }
            .map_err(h5_error)?;
        }
        Ok(())
    }

    fn has_attribute(&self, path: &NodePath, name: &str) -> Result<bool, Error> {
        self.with_location(path, |location| {
            let names = location.attr_names().map_err(h5_error)?;
            Ok(names.iter().any(|n| n == name))
        })
    }

    fn set_attribute(&mut self, path: &NodePath, name: &str, value: Value) -> Result<(), Error> {
        self.with_location(path, |location| write_attribute(location, name, &value))
    }

    fn write_dataset(&mut self, path: &NodePath, value: Value) -> Result<(), Error> {
        let (parent, name) = self.parent_and_name(path)?;
        write_dataset(&parent, name, &value)
    }

    fn write_link(&mut self, path: &NodePath, link: ResolvedLink) -> Result<(), Error> {
        let (parent, name) = self.parent_and_name(path)?;
        match link {
            ResolvedLink::Soft(target) => parent.link_soft(&target, name),
            ResolvedLink::External { file, target } => {
                parent.link_external(&file.to_string_lossy(), &target, name)
            }
        }
        .map_err(h5_error)
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.file.flush().map_err(h5_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{ContainerAddress, ContainerWriter};
    use crate::model::{EntryKind, EntryRecord, Field, LinkDescriptor, Member, NxGroup, XasMode};
    use nxxas_parser::UnitValue;

    fn entry(kind: EntryKind, mode: XasMode) -> EntryRecord {
        EntryRecord::new(mode, "Fe".parse().unwrap(), "K".parse().unwrap())
            .with_kind(kind)
            .with_energy(UnitValue::try_from((vec![7.0, 7.1], "keV")).unwrap())
            .with_intensity(UnitValue::from(vec![10.0, 20.0]))
    }

    fn text_attr(file: &File, path: &str, name: &str) -> String {
        let attr = if path == "/" {
            file.attr(name)
        } else {
            file.group(path).unwrap().attr(name)
        };
        attr.unwrap().read_scalar::<VarLenUnicode>().unwrap().as_str().to_string()
    }

    /// A group holding `x` and a link `y` to it.
    struct Linked(LinkDescriptor);

    impl NxGroup for Linked {
        fn nx_class(&self) -> &str {
            "NXcollection"
        }

        fn fields(&self) -> Vec<Field<'_>> {
            vec![
                Field::dataset("x", vec![1.0, 2.0]),
                Field::new("y", Member::Link(&self.0)),
            ]
        }
    }

    fn write_group(path: &Path, at: &str, group: &dyn NxGroup, absolute: bool) {
        let mut container = Hdf5Container::open(path).unwrap();
        let address = ContainerAddress::new(path, NodePath::parse(at).unwrap());
        ContainerWriter::new()
            .with_absolute_links(absolute)
            .write(&mut container, group, &address)
            .unwrap();
        container.flush().unwrap();
    }

    #[test]
    fn entries_are_classed_and_defaulted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fe.nxs");
        let mut container = Hdf5Container::open(&path).unwrap();
        let writer = ContainerWriter::new();
        for (name, mode) in [
            ("transmission", XasMode::Transmission),
            ("fluorescence_yield", XasMode::FluorescenceYield),
        ] {
            let address = ContainerAddress::new(
                &path,
                NodePath::parse(&format!("/dataset01/{name}")).unwrap(),
            );
            writer
                .write_entry(&mut container, &entry(EntryKind::SubEntry, mode), &address)
                .unwrap();
        }
        container.flush().unwrap();
        drop(container);

        let file = File::open(&path).unwrap();
        assert_eq!(text_attr(&file, "/", "NX_class"), "NXroot");
        assert_eq!(text_attr(&file, "/", "default"), "dataset01");
        assert_eq!(text_attr(&file, "/dataset01", "NX_class"), "NXentry");
        assert_eq!(text_attr(&file, "/dataset01", "default"), "fluorescence_yield");
        assert_eq!(text_attr(&file, "/dataset01/transmission", "NX_class"), "NXsubentry");
        assert_eq!(text_attr(&file, "/dataset01/transmission", "default"), "plot");

        let energy = file
            .dataset("/dataset01/transmission/plot/energy")
            .unwrap()
            .read_raw::<f64>()
            .unwrap();
        assert_eq!(energy, vec![7.0, 7.1]);
    }

    #[test]
    fn relative_links_follow_their_group() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.nxs");
        let link = LinkDescriptor::internal("x");
        write_group(&path, "/relative", &Linked(link.clone()), false);
        write_group(&path, "/absolute", &Linked(link), true);

        let file = File::open_rw(&path).unwrap();
        file.relink("relative", "moved_relative").unwrap();
        file.relink("absolute", "moved_absolute").unwrap();

        let moved = file.dataset("/moved_relative/y").unwrap().read_raw::<f64>().unwrap();
        assert_eq!(moved, vec![1.0, 2.0]);
        // The absolute target still names the old location.
        assert!(file.dataset("/moved_absolute/y").is_err());
    }

    #[test]
    fn external_links_reach_the_other_file() {
        let dir = tempfile::tempdir().unwrap();
        let other = dir.path().join("other.nxs");
        {
            let mut container = Hdf5Container::open(&other).unwrap();
            container.require_group(&NodePath::parse("/data").unwrap()).unwrap();
            container
                .write_dataset(&NodePath::parse("/data/x").unwrap(), Value::from(vec![3.0, 4.0]))
                .unwrap();
            container.flush().unwrap();
        }

        let path = dir.path().join("main.nxs");
        write_group(
            &path,
            "/external",
            &Linked(LinkDescriptor::external("other.nxs", "/data/x")),
            false,
        );

        let file = File::open(&path).unwrap();
        let values = file.dataset("/external/y").unwrap().read_raw::<f64>().unwrap();
        assert_eq!(values, vec![3.0, 4.0]);
    }
}
