//! Resolves a logical name or a node handle to its position in the tree.
//!
//! Pre-order depth-first search: each child is tested before its own
//! subtree, and the first match ends the search. A node whose registry is
//! absent is a leaf, including one torn down mid-walk by a reload.

use std::fmt;

use super::key::ComponentKey;
use super::{ComponentTree, NodeHandle};

/// What to look for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentRef {
    /// Match child keys whose logical name equals this.
    Name(String),
    /// Match the child node itself by identity.
    Handle(NodeHandle),
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentRef::Name(name) => write!(f, "'{name}'"),
            ComponentRef::Handle(handle) => write!(f, "component {handle}"),
        }
    }
}

impl From<&str> for ComponentRef {
    fn from(name: &str) -> Self {
        ComponentRef::Name(name.to_string())
    }
}

impl From<NodeHandle> for ComponentRef {
    fn from(handle: NodeHandle) -> Self {
        ComponentRef::Handle(handle)
    }
}

/// A located node. Unload and reload address `(parent, key)`, not the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub key: String,
    pub parent: NodeHandle,
    pub node: NodeHandle,
}

pub fn resolve_by_name<T>(tree: &T, root: NodeHandle, name: &str) -> Option<Resolved>
where
    T: ComponentTree + ?Sized,
{
    search(tree, root, &|key, _| ComponentKey::parse(key).matches_name(name))
}

pub fn resolve_by_handle<T>(tree: &T, root: NodeHandle, target: NodeHandle) -> Option<Resolved>
where
    T: ComponentTree + ?Sized,
{
    search(tree, root, &|_, node| node == target)
}

/// Resolve starting from the tree's own root.
pub fn resolve<T>(tree: &T, target: &ComponentRef) -> Option<Resolved>
where
    T: ComponentTree + ?Sized,
{
    let root = tree.root();
    match target {
        ComponentRef::Name(name) => resolve_by_name(tree, root, name),
        ComponentRef::Handle(handle) => resolve_by_handle(tree, root, *handle),
    }
}

fn search<T>(
    tree: &T,
    parent: NodeHandle,
    is_match: &dyn Fn(&str, NodeHandle) -> bool,
) -> Option<Resolved>
where
    T: ComponentTree + ?Sized,
{
    let children = tree.children(parent)?;
    for (key, node) in children {
        if is_match(&key, node) {
            return Some(Resolved { key, parent, node });
        }
        if let Some(found) = search(tree, node, is_match) {
            return Some(found);
        }
    }
    None
}
