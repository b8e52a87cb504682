//! In-memory container tree
//!
//! [`TreeContainer`] keeps the whole hierarchy as an ordered node tree and
//! stores it as JSON. Children and attributes keep their insertion order.
//! Opening an existing file loads it, so successive writes append.

use super::address::NodePath;
use super::link::ResolvedLink;
use super::Container;
use crate::error::Error;
use crate::model::Value;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Child>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub name: String,
    #[serde(flatten)]
    pub node: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Group(Group),
    Dataset {
        value: Value,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        attrs: Vec<Attribute>,
    },
    SoftLink {
        target: String,
    },
    ExternalLink {
        file: PathBuf,
        target: String,
    },
}

impl Node {
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn attrs(&self) -> &[Attribute] {
        match self {
            Node::Group(group) => &group.attrs,
            Node::Dataset { attrs, .. } => attrs,
            _ => &[],
        }
    }

    /// Value of attribute `name`.
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs()
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| &attr.value)
    }

    fn attrs_mut(&mut self) -> Option<&mut Vec<Attribute>> {
        match self {
            Node::Group(group) => Some(&mut group.attrs),
            Node::Dataset { attrs, .. } => Some(attrs),
            _ => None,
        }
    }
}

impl Group {
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|child| child.name == name)
            .map(|child| &child.node)
    }

    fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children
            .iter_mut()
            .find(|child| child.name == name)
            .map(|child| &mut child.node)
    }
}

/// A container held in memory and stored as a JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeContainer {
    file: PathBuf,
    root: Node,
}

fn taken(path: &NodePath) -> Error {
    Error::Container(format!("'{path}' already exists"))
}

fn missing(path: &NodePath) -> Error {
    Error::Container(format!("no node at '{path}'"))
}

impl TreeContainer {
    /// An empty container that will be stored at `file`.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            root: Node::Group(Group::default()),
        }
    }

    /// Load `file` if it exists, otherwise start empty.
    pub fn open(file: impl Into<PathBuf>) -> Result<Self, Error> {
        let file = file.into();
        if file.exists() {
            Self::load(file)
        } else {
            Ok(Self::new(file))
        }
    }

    /// Load an existing container file.
    pub fn load(file: impl Into<PathBuf>) -> Result<Self, Error> {
        let file = file.into();
        let reader = File::open(&file).map_err(|err| Error::io(&file, err))?;
        let root: Group = serde_json::from_reader(BufReader::new(reader))
            .map_err(|err| Error::Container(format!("{}: {err}", file.display())))?;
        Ok(Self {
            file,
            root: Node::Group(root),
        })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The node at `path`, following no links.
    pub fn node(&self, path: &NodePath) -> Option<&Node> {
        let mut node = &self.root;
        for name in path.components() {
            node = node.as_group()?.child(name)?;
        }
        Some(node)
    }

    fn node_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        let mut node = &mut self.root;
        for name in path.components() {
            node = match node {
                Node::Group(group) => group.child_mut(name)?,
                _ => return None,
            };
        }
        Some(node)
    }

    /// Every node with its path, parents before children.
    pub fn walk(&self) -> Vec<(NodePath, &Node)> {
        let mut out = Vec::new();
        let mut stack = vec![(NodePath::root(), &self.root)];
        while let Some((path, node)) = stack.pop() {
            if let Node::Group(group) = node {
                for child in group.children.iter().rev() {
                    stack.push((path.join(&child.name), &child.node));
                }
            }
            out.push((path, node));
        }
        out
    }

    fn insert(&mut self, path: &NodePath, node: Node) -> Result<(), Error> {
        let (Some(parent), Some(name)) = (path.parent(), path.name()) else {
            return Err(taken(path));
        };
        self.require_group(&parent)?;
        match self.node_mut(&parent) {
            Some(Node::Group(group)) => {
                if group.child(name).is_some() {
                    return Err(taken(path));
                }
                group.children.push(Child {
                    name: name.to_string(),
                    node,
                });
                Ok(())
            }
            _ => Err(missing(&parent)),
        }
    }

    /// Indented text listing of the tree, one node or attribute per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("/\n");
        render_attrs(&mut out, self.root.attrs(), 1);
        if let Node::Group(group) = &self.root {
            render_children(&mut out, group, 1);
        }
        out
    }
}

fn render_attrs(out: &mut String, attrs: &[Attribute], depth: usize) {
    for attr in attrs {
        let _ = writeln!(out, "{:indent$}@{} = {}", "", attr.name, attr.value, indent = depth * 2);
    }
}

fn render_children(out: &mut String, group: &Group, depth: usize) {
    let indent = depth * 2;
    for child in &group.children {
        let name = &child.name;
        let _ = match &child.node {
            Node::Group(_) => writeln!(out, "{:indent$}{name}/", ""),
            Node::Dataset { value, .. } => writeln!(out, "{:indent$}{name} = {value}", ""),
            Node::SoftLink { target } => writeln!(out, "{:indent$}{name} -> {target}", ""),
            Node::ExternalLink { file, target } => {
                writeln!(out, "{:indent$}{name} -> {}:{target}", "", file.display())
            }
        };
        render_attrs(out, child.node.attrs(), depth + 1);
        if let Node::Group(group) = &child.node {
            render_children(out, group, depth + 1);
        }
    }
}

impl Container for TreeContainer {
    fn file_path(&self) -> &Path {
        &self.file
    }

    fn require_group(&mut self, path: &NodePath) -> Result<(), Error> {
        let mut node = &mut self.root;
        let mut current = NodePath::root();
        for name in path.components() {
            current = current.join(name);
            let Node::Group(group) = node else {
                return Err(taken(&current));
            };
            if group.child(name).is_none() {
                group.children.push(Child {
                    name: name.clone(),
                    node: Node::Group(Group::default()),
                });
            }
            node = group.child_mut(name).ok_or_else(|| missing(&current))?;
        }
        match node {
            Node::Group(_) => Ok(()),
            _ => Err(taken(path)),
        }
    }

    fn has_attribute(&self, path: &NodePath, name: &str) -> Result<bool, Error> {
        let node = self.node(path).ok_or_else(|| missing(path))?;
        Ok(node.attr(name).is_some())
    }

    fn set_attribute(&mut self, path: &NodePath, name: &str, value: Value) -> Result<(), Error> {
        let attrs = self
            .node_mut(path)
            .and_then(Node::attrs_mut)
            .ok_or_else(|| missing(path))?;
        match attrs.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => attrs.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
        Ok(())
    }

    fn write_dataset(&mut self, path: &NodePath, value: Value) -> Result<(), Error> {
        self.insert(
            path,
            Node::Dataset {
                value,
                attrs: Vec::new(),
            },
        )
    }

    fn write_link(&mut self, path: &NodePath, link: ResolvedLink) -> Result<(), Error> {
        let node = match link {
            ResolvedLink::Soft(target) => Node::SoftLink { target },
            ResolvedLink::External { file, target } => Node::ExternalLink { file, target },
        };
        self.insert(path, node)
    }

    fn flush(&mut self) -> Result<(), Error> {
        let Node::Group(root) = &self.root else {
            return Err(Error::Container("root is not a group".into()));
        };
        let file = File::create(&self.file).map_err(|err| Error::io(&self.file, err))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, root)?;
        writer
            .write_all(b"\n")
            .and_then(|_| writer.flush())
            .map_err(|err| Error::io(&self.file, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> NodePath {
        NodePath::parse(raw).unwrap()
    }

    #[test]
    fn require_group_creates_ancestors_once() {
        let mut tree = TreeContainer::new("t.json");
        tree.require_group(&path("/a/b")).unwrap();
        tree.require_group(&path("/a/b")).unwrap();
        tree.require_group(&path("/a/c")).unwrap();

        let a = tree.node(&path("/a")).unwrap().as_group().unwrap();
        let names: Vec<&str> = a.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["b", "c"]);
    }

    #[test]
    fn datasets_do_not_overwrite() {
        let mut tree = TreeContainer::new("t.json");
        tree.write_dataset(&path("/a/x"), Value::Int(1)).unwrap();
        assert!(tree.write_dataset(&path("/a/x"), Value::Int(2)).is_err());
        assert!(tree.require_group(&path("/a/x")).is_err());
        assert!(tree.require_group(&path("/a/x/y")).is_err());
    }

    #[test]
    fn attributes_replace_and_keep_order() {
        let mut tree = TreeContainer::new("t.json");
        let root = NodePath::root();
        tree.set_attribute(&root, "NX_class", "NXroot".into()).unwrap();
        tree.set_attribute(&root, "default", "a".into()).unwrap();
        tree.set_attribute(&root, "default", "b".into()).unwrap();
        tree.set_attribute_if_absent(&root, "NX_class", "other".into())
            .unwrap();

        let attrs = tree.root().attrs();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].value, Value::from("NXroot"));
        assert_eq!(attrs[1].value, Value::from("b"));
    }

    #[test]
    fn attributes_on_missing_nodes_fail() {
        let mut tree = TreeContainer::new("t.json");
        assert!(tree.set_attribute(&path("/nope"), "a", Value::Int(1)).is_err());
        assert!(tree.has_attribute(&path("/nope"), "a").is_err());
    }

    #[test]
    fn walk_lists_parents_first() {
        let mut tree = TreeContainer::new("t.json");
        tree.write_dataset(&path("/a/x"), Value::Int(1)).unwrap();
        tree.write_link(&path("/b"), ResolvedLink::Soft("/a/x".into()))
            .unwrap();
        let paths: Vec<String> = tree.walk().iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(paths, ["/", "/a", "/a/x", "/b"]);
    }

    #[test]
    fn saves_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.nxs");

        let mut tree = TreeContainer::open(&file).unwrap();
        tree.write_dataset(&path("/dataset01/energy"), Value::from(vec![1.0, f64::NAN]))
            .unwrap();
        tree.flush().unwrap();

        let mut tree = TreeContainer::open(&file).unwrap();
        assert!(tree.node(&path("/dataset01/energy")).is_some());
        tree.write_link(
            &path("/dataset02/energy"),
            ResolvedLink::External {
                file: "other.nxs".into(),
                target: "/entry/energy".into(),
            },
        )
        .unwrap();
        tree.flush().unwrap();

        let tree = TreeContainer::load(&file).unwrap();
        assert!(tree.node(&path("/dataset01/energy")).is_some());
        assert!(matches!(
            tree.node(&path("/dataset02/energy")),
            Some(Node::ExternalLink { .. })
        ));
    }

    #[test]
    fn renders_an_indented_listing() {
        let mut tree = TreeContainer::new("t.json");
        tree.set_attribute(&NodePath::root(), "NX_class", "NXroot".into())
            .unwrap();
        tree.write_dataset(&path("/e/energy"), Value::from(vec![1.0, 2.0]))
            .unwrap();
        tree.set_attribute(&path("/e/energy"), "units", "eV".into())
            .unwrap();
        tree.write_link(&path("/e/plot/energy"), ResolvedLink::Soft("/e/energy".into()))
            .unwrap();
        insta::assert_snapshot!(tree.render(), @r###"
        /
          @NX_class = "NXroot"
          e/
            energy = [1, 2]
              @units = "eV"
            plot/
              energy -> /e/energy
        "###);
    }
}
