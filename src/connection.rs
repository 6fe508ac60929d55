//! Managed connections and the live registry the host exposes for them.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::NodeHandle;

/// Opaque identifier of one managed connection, e.g. `"onebot:12345"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for ConnectionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Lifecycle status of an adapter connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Offline,
    Online,
    Connecting,
    Disconnecting,
    Reconnecting,
}

impl ConnectionStatus {
    pub fn is_online(self) -> bool {
        self == ConnectionStatus::Online
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionStatus::Offline => "Offline",
            ConnectionStatus::Online => "Online",
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Disconnecting => "Disconnecting",
            ConnectionStatus::Reconnecting => "Reconnecting",
        };
        f.write_str(s)
    }
}

/// Live view of one connection as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub platform: String,
    pub status: ConnectionStatus,
    /// Component that owns this connection and is reloaded to recover it.
    pub component: NodeHandle,
}

/// Explicit status transition signalled by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub connection: ConnectionId,
    pub platform: String,
    pub status: ConnectionStatus,
}

impl StatusEvent {
    pub fn new(
        connection: impl Into<ConnectionId>,
        platform: impl Into<String>,
        status: ConnectionStatus,
    ) -> Self {
        Self {
            connection: connection.into(),
            platform: platform.into(),
            status,
        }
    }
}

/// Read-only access to the host's live connection list.
///
/// Reads are always live: a connection that reconnected since the last call
/// reports its new status and component.
pub trait ConnectionRegistry: Send + Sync {
    /// Snapshot of every connection currently known to the host.
    fn connections(&self) -> Vec<Connection>;

    /// Live lookup of a single connection.
    fn get(&self, id: &ConnectionId) -> Option<Connection>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_round_trips_through_serde() {
        let id = ConnectionId::from("discord:42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"discord:42\"");
        let back: ConnectionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn only_online_counts_as_online() {
        assert!(ConnectionStatus::Online.is_online());
        for s in [
            ConnectionStatus::Offline,
            ConnectionStatus::Connecting,
            ConnectionStatus::Disconnecting,
            ConnectionStatus::Reconnecting,
        ] {
            assert!(!s.is_online(), "{s} should not be online");
        }
    }
}
