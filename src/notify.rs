//! Operator notifications sent through one of the managed connections.

use async_trait::async_trait;

use crate::connection::{ConnectionId, ConnectionRegistry, ConnectionStatus};
use crate::error::{HostError, NotifyError};

/// Messaging transport of the host.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `content` to `target` through the connection `via`.
    async fn send_message(
        &self,
        via: &ConnectionId,
        target: &str,
        content: &str,
    ) -> Result<(), HostError>;
}

/// Text sent to the operator channel when a connection leaves `Online`.
pub fn status_message(id: &ConnectionId, status: ConnectionStatus) -> String {
    format!("Bot <{id}> {status}")
}

/// Where notifications go, resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyRoute {
    pub via: ConnectionId,
    pub target: String,
}

impl NotifyRoute {
    /// `None` unless both the notifier connection and target are set.
    pub fn from_config(sid: Option<&str>, target: Option<&str>) -> Option<Self> {
        match (sid, target) {
            (Some(sid), Some(target)) if !sid.is_empty() && !target.is_empty() => Some(Self {
                via: ConnectionId::from(sid),
                target: target.to_string(),
            }),
            _ => None,
        }
    }

    /// Send through this route, failing fast when the notifier connection
    /// is not live.
    pub async fn send(
        &self,
        registry: &dyn ConnectionRegistry,
        notifier: &dyn Notifier,
        content: &str,
    ) -> Result<(), NotifyError> {
        if registry.get(&self.via).is_none() {
            return Err(NotifyError::NotifierUnavailable(self.via.to_string()));
        }
        notifier
            .send_message(&self.via, &self.target, content)
            .await?;
        Ok(())
    }
}
