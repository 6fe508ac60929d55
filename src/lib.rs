//! Adapter Sentinel: supervision loop for bot adapter connections
//!
//! Watches a set of long-lived connections owned by a host, reloads the
//! component that owns a connection once it has gone quiet for too long,
//! and tells an operator channel when a connection drops.
//!
//! ## Architecture
//!
//! - **Activity Tracker**: last-seen timestamp and failure counter per connection
//! - **Curfew Gate**: daily windows during which automatic recovery is suppressed
//! - **Component Resolver**: pre-order search of the host's component tree
//! - **Recovery Driver**: unload then reload a component with its stored config
//! - **Background Monitor**: health-check tick and status-change reactor on one task
//!
//! The host is reached only through the traits in [`component`], [`connection`],
//! [`notify`] and [`clock`]; [`host::MemoryHost`] implements all of them in memory.

pub mod activity;
pub mod background;
pub mod clock;
pub mod commands;
pub mod component;
pub mod config;
pub mod connection;
pub mod curfew;
pub mod error;
pub mod host;
pub mod notify;
pub mod recovery;

// Re-export configuration
pub use config::{ConfigError, MonitorConfig, ReloadAdaptersConfig};

// Re-export the runtime
pub use background::{monitor_channel, AdapterMonitor, MonitorEvent, MonitorHandle, MonitorStats};

// Re-export the host seam
pub use clock::{Clock, ManualClock, SystemClock};
pub use component::{ComponentHost, ComponentKey, ComponentRef, ComponentTree, NodeHandle, Resolved};
pub use connection::{Connection, ConnectionId, ConnectionRegistry, ConnectionStatus, StatusEvent};
pub use notify::{Notifier, NotifyRoute};

pub use activity::{ActivityTracker, FailureCounters};
pub use commands::PingCommand;
pub use curfew::{Curfew, MarkerWindow, TimeWindow};
pub use error::{CurfewError, HostError, MonitorStopped, NotifyError, RecoveryError};
pub use recovery::RecoveryDriver;
