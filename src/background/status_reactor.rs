//! Status-change reactor: notify the operator when a connection drops, and
//! optionally re-check it later.

use std::time::Duration;

use crate::component::NodeHandle;
use crate::config::MonitorConfig;
use crate::connection::{Connection, ConnectionId, StatusEvent};
use crate::notify::{status_message, NotifyRoute};

/// What to do about operator notification for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyPlan {
    Send { route: NotifyRoute, content: String },
    /// The affected connection is the notifier itself.
    SelfSkipped,
    /// No notifier route is configured.
    NotConfigured,
}

/// Reaction to an actionable (non-online, non-sandbox) status event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub connection: ConnectionId,
    pub notify: NotifyPlan,
    /// Arm a one-shot recheck after this delay.
    pub recheck_after: Option<Duration>,
}

/// Decision taken when a delayed recheck fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recheck {
    /// Still not online: recover the owning component.
    StillDown(NodeHandle),
    /// Came back on its own.
    Recovered,
    /// No longer known to the registry.
    Vanished,
}

#[derive(Debug, Clone)]
pub struct StatusReactor {
    route: Option<NotifyRoute>,
    sandbox_prefix: String,
    recheck_after: Option<Duration>,
}

impl StatusReactor {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            route: config.notify_route(),
            sandbox_prefix: config.sandbox_platform_prefix.clone(),
            recheck_after: config.reload_on_disconnect.then(|| config.disconnect_delay()),
        }
    }

    /// `None` when the event is not actionable.
    pub fn react(&self, event: &StatusEvent) -> Option<Reaction> {
        if !self.sandbox_prefix.is_empty() && event.platform.starts_with(&self.sandbox_prefix) {
            return None;
        }
        if event.status.is_online() {
            return None;
        }

        let notify = match &self.route {
            Some(route) if route.via == event.connection => NotifyPlan::SelfSkipped,
            Some(route) => NotifyPlan::Send {
                route: route.clone(),
                content: status_message(&event.connection, event.status),
            },
            None => NotifyPlan::NotConfigured,
        };

        Some(Reaction {
            connection: event.connection.clone(),
            notify,
            recheck_after: self.recheck_after,
        })
    }

    /// Decide from the connection's live state at fire time.
    pub fn recheck(live: Option<&Connection>) -> Recheck {
        match live {
            None => Recheck::Vanished,
            Some(conn) if conn.status.is_online() => Recheck::Recovered,
            Some(conn) => Recheck::StillDown(conn.component),
        }
    }
}
