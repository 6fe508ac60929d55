//! Host component tree: the reloadable units that own adapter connections.
//!
//! The tree belongs to the host. The sentinel only reads it through
//! [`ComponentTree`] and asks for unload/reload through [`ComponentHost`].

pub mod key;
pub mod resolver;

pub use key::ComponentKey;
pub use resolver::{resolve, resolve_by_handle, resolve_by_name, ComponentRef, Resolved};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::HostError;

/// Opaque identity of a node in the host's component tree.
///
/// Two handles are equal iff they refer to the same node instance; a
/// reloaded component gets a fresh handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(u64);

impl NodeHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read-only query interface over the host's component tree.
pub trait ComponentTree: Send + Sync {
    /// Entry point of every traversal.
    fn root(&self) -> NodeHandle;

    /// Ordered `(key, child)` entries of `node`'s registry.
    ///
    /// `None` means the node has no registry right now. It may be a leaf, or
    /// its registry may have been torn down by a concurrent reload.
    fn children(&self, node: NodeHandle) -> Option<Vec<(String, NodeHandle)>>;

    /// Configuration stored on `parent` for the child registered under `key`.
    fn child_config(&self, parent: NodeHandle, key: &str) -> Option<Value>;
}

/// Lifecycle operations on the host's component tree.
///
/// The host owns every safety property of the unload/reload sequence.
#[async_trait]
pub trait ComponentHost: ComponentTree {
    async fn unload(&self, parent: NodeHandle, key: &str) -> Result<(), HostError>;

    async fn reload(&self, parent: NodeHandle, key: &str, config: Value) -> Result<(), HostError>;
}
