//! In-process host: component tree, connection registry and notifier in one
//! mutex-guarded state.
//!
//! Records every unload, reload and send so tests and demos can assert on
//! what the sentinel asked the host to do. Failures can be injected per
//! operation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::component::{ComponentHost, ComponentTree, NodeHandle};
use crate::connection::{Connection, ConnectionId, ConnectionRegistry, ConnectionStatus};
use crate::error::HostError;
use crate::notify::Notifier;

/// One call the sentinel made against the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Unload {
        parent: NodeHandle,
        key: String,
    },
    Reload {
        parent: NodeHandle,
        key: String,
        config: Value,
    },
    Send {
        via: ConnectionId,
        target: String,
        content: String,
    },
}

#[derive(Debug, Default)]
struct Node {
    registry: Option<Vec<(String, NodeHandle)>>,
    config: HashMap<String, Value>,
}

#[derive(Debug, Default)]
struct State {
    nodes: HashMap<NodeHandle, Node>,
    next_id: u64,
    connections: Vec<Connection>,
    calls: Vec<HostCall>,
    /// Node that sat under `(parent, key)` before its last unload.
    unloaded: HashMap<(NodeHandle, String), NodeHandle>,
    fail_unload: bool,
    fail_reload: bool,
    fail_send: bool,
}

impl State {
    fn alloc(&mut self) -> NodeHandle {
        let handle = NodeHandle::from_raw(self.next_id);
        self.next_id += 1;
        self.nodes.insert(handle, Node::default());
        handle
    }
}

#[derive(Debug)]
pub struct MemoryHost {
    root: NodeHandle,
    state: Mutex<State>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        let mut state = State::default();
        let root = state.alloc();
        Self {
            root,
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new component under `parent` with its stored config.
    pub fn add_component(&self, parent: NodeHandle, key: &str, config: Value) -> NodeHandle {
        let mut state = self.state();
        let child = state.alloc();
        if let Some(node) = state.nodes.get_mut(&parent) {
            node.registry
                .get_or_insert_with(Vec::new)
                .push((key.to_string(), child));
            node.config.insert(key.to_string(), config);
        }
        child
    }

    /// Drop a node's registry, as a reload in progress would.
    pub fn tear_down(&self, node: NodeHandle) {
        if let Some(n) = self.state().nodes.get_mut(&node) {
            n.registry = None;
        }
    }

    pub fn add_connection(
        &self,
        id: &str,
        platform: &str,
        status: ConnectionStatus,
        component: NodeHandle,
    ) {
        self.state().connections.push(Connection {
            id: ConnectionId::from(id),
            platform: platform.to_string(),
            status,
            component,
        });
    }

    pub fn remove_connection(&self, id: &str) {
        self.state().connections.retain(|c| c.id.as_str() != id);
    }

    pub fn set_status(&self, id: &str, status: ConnectionStatus) {
        if let Some(c) = self.state().connections.iter_mut().find(|c| c.id.as_str() == id) {
            c.status = status;
        }
    }

    pub fn set_fail_unload(&self, fail: bool) {
        self.state().fail_unload = fail;
    }

    pub fn set_fail_reload(&self, fail: bool) {
        self.state().fail_reload = fail;
    }

    pub fn set_fail_send(&self, fail: bool) {
        self.state().fail_send = fail;
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state().calls.clone()
    }

    pub fn reloads(&self) -> Vec<(NodeHandle, String)> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                HostCall::Reload { parent, key, .. } => Some((*parent, key.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn unloads(&self) -> Vec<(NodeHandle, String)> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                HostCall::Unload { parent, key } => Some((*parent, key.clone())),
                _ => None,
            })
            .collect()
    }

    /// `(via, target, content)` of every message sent.
    pub fn sent(&self) -> Vec<(ConnectionId, String, String)> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                HostCall::Send {
                    via,
                    target,
                    content,
                } => Some((via.clone(), target.clone(), content.clone())),
                _ => None,
            })
            .collect()
    }
}

impl ComponentTree for MemoryHost {
    fn root(&self) -> NodeHandle {
        self.root
    }

    fn children(&self, node: NodeHandle) -> Option<Vec<(String, NodeHandle)>> {
        self.state().nodes.get(&node)?.registry.clone()
    }

    fn child_config(&self, parent: NodeHandle, key: &str) -> Option<Value> {
        self.state().nodes.get(&parent)?.config.get(key).cloned()
    }
}

#[async_trait]
impl ComponentHost for MemoryHost {
    async fn unload(&self, parent: NodeHandle, key: &str) -> Result<(), HostError> {
        let mut state = self.state();
        state.calls.push(HostCall::Unload {
            parent,
            key: key.to_string(),
        });
        if state.fail_unload {
            return Err(HostError::Operation(format!("unload of '{key}' refused")));
        }

        let removed = state
            .nodes
            .get_mut(&parent)
            .and_then(|n| n.registry.as_mut())
            .and_then(|reg| {
                let pos = reg.iter().position(|(k, _)| k == key)?;
                Some(reg.remove(pos).1)
            })
            .ok_or_else(|| HostError::Gone(key.to_string()))?;

        state.nodes.remove(&removed);
        state.unloaded.insert((parent, key.to_string()), removed);
        Ok(())
    }

    async fn reload(&self, parent: NodeHandle, key: &str, config: Value) -> Result<(), HostError> {
        let mut state = self.state();
        state.calls.push(HostCall::Reload {
            parent,
            key: key.to_string(),
            config: config.clone(),
        });
        if state.fail_reload {
            return Err(HostError::Operation(format!("reload of '{key}' refused")));
        }
        if !state.nodes.contains_key(&parent) {
            return Err(HostError::Gone(format!("parent of '{key}'")));
        }

        let fresh = state.alloc();
        if let Some(node) = state.nodes.get_mut(&parent) {
            node.registry
                .get_or_insert_with(Vec::new)
                .push((key.to_string(), fresh));
            node.config.insert(key.to_string(), config);
        }

        // Connections owned by the old instance now belong to the new one.
        if let Some(old) = state.unloaded.remove(&(parent, key.to_string())) {
            for conn in state.connections.iter_mut().filter(|c| c.component == old) {
                conn.component = fresh;
            }
        }
        Ok(())
    }
}

impl ConnectionRegistry for MemoryHost {
    fn connections(&self) -> Vec<Connection> {
        self.state().connections.clone()
    }

    fn get(&self, id: &ConnectionId) -> Option<Connection> {
        self.state().connections.iter().find(|c| &c.id == id).cloned()
    }
}

#[async_trait]
impl Notifier for MemoryHost {
    async fn send_message(
        &self,
        via: &ConnectionId,
        target: &str,
        content: &str,
    ) -> Result<(), HostError> {
        let mut state = self.state();
        state.calls.push(HostCall::Send {
            via: via.clone(),
            target: target.to_string(),
            content: content.to_string(),
        });
        if state.fail_send {
            return Err(HostError::Operation("transport down".to_string()));
        }
        Ok(())
    }
}
