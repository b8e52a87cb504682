//! Class definitions
//!
//! A [`DefinitionProvider`] answers "what does class X contain" by name.
//! [`BuiltinDefinitions`] ships the base classes the writer emits plus the
//! NXxas application definition. Definitions refer to each other by class name
//! and may refer to themselves (an NXcollection holds NXcollections), so the
//! reference graph is walked iteratively with a visited set.

use crate::container::tree::Node;
use crate::container::{Container, NodePath, TreeContainer};
use crate::error::Error;
use crate::model::entry::DEFINITION;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// References deeper than this are refused when walking a definition.
pub const MAX_DEFINITION_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Base,
    Application,
}

/// A group allowed inside a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRef {
    pub name: String,
    pub nx_class: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: String,
    pub category: Category,
    /// Datasets (or links) every instance must carry.
    pub required_fields: Vec<String>,
    /// Attributes every instance must carry.
    pub required_attributes: Vec<String>,
    pub groups: Vec<GroupRef>,
}

impl Definition {
    fn new(name: &str, category: Category) -> Self {
        Self {
            name: name.to_string(),
            category,
            required_fields: Vec::new(),
            required_attributes: Vec::new(),
            groups: Vec::new(),
        }
    }

    fn fields(mut self, names: &[&str]) -> Self {
        self.required_fields = names.iter().map(|n| n.to_string()).collect();
        self
    }

    fn attributes(mut self, names: &[&str]) -> Self {
        self.required_attributes = names.iter().map(|n| n.to_string()).collect();
        self
    }

    fn group(mut self, name: &str, nx_class: &str) -> Self {
        self.groups.push(GroupRef {
            name: name.to_string(),
            nx_class: nx_class.to_string(),
        });
        self
    }
}

/// Lookup of definitions by class name.
pub trait DefinitionProvider {
    /// Every known name, sorted.
    fn names(&self) -> Vec<String>;

    fn lookup(&self, name: &str) -> Option<&Definition>;
}

/// The definitions compiled into the crate.
#[derive(Debug, Clone)]
pub struct BuiltinDefinitions {
    definitions: BTreeMap<String, Definition>,
}

impl BuiltinDefinitions {
    pub fn new() -> Self {
        let definitions = [
            Definition::new("NXroot", Category::Base).group("entry", "NXentry"),
            Definition::new("NXentry", Category::Base)
                .group("data", "NXdata")
                .group("instrument", "NXinstrument")
                .group("subentry", "NXsubentry")
                .group("collection", "NXcollection"),
            Definition::new("NXsubentry", Category::Base)
                .group("data", "NXdata")
                .group("instrument", "NXinstrument")
                .group("collection", "NXcollection"),
            Definition::new("NXdata", Category::Base).attributes(&["signal"]),
            Definition::new("NXinstrument", Category::Base).group("collection", "NXcollection"),
            Definition::new("NXcollection", Category::Base).group("collection", "NXcollection"),
            Definition::new(DEFINITION, Category::Application)
                .fields(&[
                    "definition",
                    "mode",
                    "element",
                    "absorption_edge",
                    "energy",
                    "intensity",
                    "title",
                ])
                .group("plot", "NXdata")
                .group("instrument", "NXinstrument"),
        ];
        Self {
            definitions: definitions
                .into_iter()
                .map(|definition| (definition.name.clone(), definition))
                .collect(),
        }
    }
}

impl Default for BuiltinDefinitions {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionProvider for BuiltinDefinitions {
    fn names(&self) -> Vec<String> {
        self.definitions.keys().cloned().collect()
    }

    fn lookup(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }
}

/// Check that `name` and every class it refers to, directly or not, are
/// defined. Returns the number of distinct classes reached.
pub fn validate_definition(provider: &dyn DefinitionProvider, name: &str) -> Result<usize, Error> {
    let mut visited = HashSet::new();
    let mut stack = vec![(name.to_string(), 0usize)];
    while let Some((class, depth)) = stack.pop() {
        if depth > MAX_DEFINITION_DEPTH {
            return Err(Error::validation(format!(
                "{name}: references nest more than {MAX_DEFINITION_DEPTH} levels deep at {class}"
            )));
        }
        if !visited.insert(class.clone()) {
            continue;
        }
        let definition = provider
            .lookup(&class)
            .ok_or_else(|| Error::validation(format!("{name}: unknown class {class}")))?;
        for group in &definition.groups {
            stack.push((group.nx_class.clone(), depth + 1));
        }
    }
    Ok(visited.len())
}

/// Check a stored tree container: every group is classed with a known class
/// and carries that class's attributes, and every entry declaring an
/// application definition carries its fields.
pub fn validate_instance(provider: &dyn DefinitionProvider, tree: &TreeContainer) -> Result<(), Error> {
    for (path, node) in tree.walk() {
        let Node::Group(group) = node else {
            continue;
        };
        let class = node
            .attr("NX_class")
            .and_then(|value| value.as_text())
            .ok_or_else(|| invalid(tree, &path, "group has no NX_class"))?;
        let definition = provider
            .lookup(class)
            .ok_or_else(|| invalid(tree, &path, &format!("unknown class {class}")))?;
        for attr in &definition.required_attributes {
            if node.attr(attr).is_none() {
                return Err(invalid(tree, &path, &format!("{class} without attribute '{attr}'")));
            }
        }

        let application = group
            .child("definition")
            .and_then(|child| match child {
                Node::Dataset { value, .. } => value.as_text(),
                _ => None,
            });
        if let Some(application) = application {
            let definition = provider
                .lookup(application)
                .filter(|definition| definition.category == Category::Application)
                .ok_or_else(|| {
                    invalid(tree, &path, &format!("unknown application definition {application}"))
                })?;
            for field in &definition.required_fields {
                if group.child(field).is_none() {
                    return Err(invalid(
                        tree,
                        &path,
                        &format!("{application} entry without '{field}'"),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn invalid(tree: &TreeContainer, path: &NodePath, reason: &str) -> Error {
    Error::validation(format!("{}:{path}: {reason}", tree.file_path().display()))
}

/// Validate `target`: a container file if such a file exists, a class name
/// otherwise.
pub fn validate(provider: &dyn DefinitionProvider, target: &str) -> Result<(), Error> {
    let path = Path::new(target);
    if path.is_file() {
        let tree = TreeContainer::load(path)?;
        validate_instance(provider, &tree)
    } else {
        validate_definition(provider, target).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{ContainerAddress, ContainerWriter};
    use crate::model::{Edge, Element, EntryRecord, Value, XasMode};
    use nxxas_parser::UnitValue;

    struct Chain(BTreeMap<String, Definition>);

    impl DefinitionProvider for Chain {
        fn names(&self) -> Vec<String> {
            self.0.keys().cloned().collect()
        }

        fn lookup(&self, name: &str) -> Option<&Definition> {
            self.0.get(name)
        }
    }

    /// `NXc0 -> NXc1 -> ... -> NXc<len-1>`.
    fn chain(len: usize) -> Chain {
        Chain(
            (0..len)
                .map(|i| {
                    let mut definition = Definition::new(&format!("NXc{i}"), Category::Base);
                    if i + 1 < len {
                        definition = definition.group("next", &format!("NXc{}", i + 1));
                    }
                    (definition.name.clone(), definition)
                })
                .collect(),
        )
    }

    fn written_entry(dir: &Path) -> TreeContainer {
        let file = dir.join("fe.nxs");
        let mut tree = TreeContainer::new(&file);
        let entry = EntryRecord::new(
            XasMode::Transmission,
            "Fe".parse::<Element>().unwrap(),
            "K".parse::<Edge>().unwrap(),
        )
        .with_energy(UnitValue::try_from((vec![7100.0, 7110.0], "eV")).unwrap())
        .with_intensity(UnitValue::from(vec![0.1, 0.2]));
        let address = ContainerAddress::new(&file, NodePath::parse("/dataset01").unwrap());
        ContainerWriter::new()
            .write_entry(&mut tree, &entry, &address)
            .unwrap();
        tree
    }

    #[test]
    fn builtin_definitions_are_closed() {
        let builtin = BuiltinDefinitions::new();
        for name in builtin.names() {
            assert!(validate_definition(&builtin, &name).is_ok(), "{name}");
        }
        assert_eq!(validate_definition(&builtin, "NXroot").unwrap(), 6);
    }

    #[test]
    fn self_referencing_classes_terminate() {
        let builtin = BuiltinDefinitions::new();
        assert_eq!(validate_definition(&builtin, "NXcollection").unwrap(), 1);
    }

    #[test]
    fn unknown_classes_are_invalid() {
        let builtin = BuiltinDefinitions::new();
        assert!(matches!(
            validate_definition(&builtin, "NXsample"),
            Err(Error::Validation(_))
        ));
        let broken = Chain(
            [Definition::new("NXa", Category::Base).group("b", "NXmissing")]
                .into_iter()
                .map(|d| (d.name.clone(), d))
                .collect(),
        );
        let err = validate_definition(&broken, "NXa").unwrap_err();
        assert!(err.to_string().contains("NXmissing"));
    }

    #[test]
    fn deep_reference_chains_hit_the_ceiling() {
        assert!(validate_definition(&chain(MAX_DEFINITION_DEPTH + 1), "NXc0").is_ok());
        let err = validate_definition(&chain(MAX_DEFINITION_DEPTH + 2), "NXc0").unwrap_err();
        assert!(err.to_string().contains("levels deep"));
    }

    #[test]
    fn written_entries_are_valid_instances() {
        let dir = tempfile::tempdir().unwrap();
        let tree = written_entry(dir.path());
        assert!(validate_instance(&BuiltinDefinitions::new(), &tree).is_ok());
    }

    #[test]
    fn instances_need_classes_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let builtin = BuiltinDefinitions::new();

        let mut tree = written_entry(dir.path());
        tree.require_group(&NodePath::parse("/dataset01/extra").unwrap())
            .unwrap();
        let err = validate_instance(&builtin, &tree).unwrap_err();
        assert!(err.to_string().contains("/dataset01/extra: group has no NX_class"));

        let mut tree = TreeContainer::new(dir.path().join("bare.nxs"));
        let entry = NodePath::parse("/scan").unwrap();
        tree.require_group(&entry).unwrap();
        tree.set_attribute(&NodePath::root(), "NX_class", Value::from("NXroot"))
            .unwrap();
        tree.set_attribute(&entry, "NX_class", Value::from("NXentry"))
            .unwrap();
        tree.write_dataset(&entry.join("definition"), Value::from(DEFINITION))
            .unwrap();
        let err = validate_instance(&builtin, &tree).unwrap_err();
        assert!(err.to_string().contains("NXxas entry without 'mode'"));
    }

    #[test]
    fn validate_dispatches_on_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut tree = written_entry(dir.path());
        tree.flush().unwrap();
        let builtin = BuiltinDefinitions::new();

        let file = dir.path().join("fe.nxs");
        assert!(validate(&builtin, &file.display().to_string()).is_ok());
        assert!(validate(&builtin, "NXxas").is_ok());
        assert!(validate(&builtin, "NXnothing").is_err());
    }
}
