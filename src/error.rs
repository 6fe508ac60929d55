//! Error types shared across the sentinel.
//!
//! Every error here is absorbed at the boundary of the component that
//! detected it and turned into log output. None of them may stop the
//! health-check loop or the status reactor.

use thiserror::Error;

/// Failure reported by a host collaborator (component registry, transport).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    /// The host rejected or failed the requested operation.
    #[error("host operation failed: {0}")]
    Operation(String),

    /// The referenced component no longer exists on the host side.
    #[error("component gone: {0}")]
    Gone(String),
}

/// Outcome of a failed recovery attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecoveryError {
    /// Component resolution found no owner for the target.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unloading the resolved component failed.
    #[error("unload of '{key}' failed: {source}")]
    Unload {
        key: String,
        #[source]
        source: HostError,
    },

    /// Reloading the resolved component failed.
    #[error("reload of '{key}' failed: {source}")]
    Reload {
        key: String,
        #[source]
        source: HostError,
    },
}

impl RecoveryError {
    /// Whether the failure happened before any host call was made.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RecoveryError::NotFound(_))
    }
}

/// Outcome of a failed operator notification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifyError {
    /// No notifier is configured, or the notifier connection is not live.
    #[error("notifier connection unavailable: {0}")]
    NotifierUnavailable(String),

    /// The transport accepted the request but failed to deliver it.
    #[error("notification send failed: {0}")]
    Send(#[from] HostError),
}

/// A curfew marker or window that cannot be turned into minute offsets.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CurfewError {
    #[error("malformed time marker '{0}' (expected H:MM or HH:MM)")]
    MalformedMarker(String),

    #[error("time marker '{marker}' out of range: {reason}")]
    OutOfRange { marker: String, reason: &'static str },
}

/// The monitor task has stopped and no longer accepts events.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("adapter monitor stopped")]
pub struct MonitorStopped;
