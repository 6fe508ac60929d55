//! Background services: idle-connection health checks and disconnect handling
//!
//! [`AdapterMonitor`] runs as one tokio task fed by a [`MonitorHandle`]. The
//! health checker and status reactor hold the decision logic and never touch
//! the host directly.

pub mod health_check;
pub mod monitor;
pub mod status_reactor;

pub use health_check::{HealthChecker, RecoveryRequest, TickOutcome, TickReport};
pub use monitor::{
    monitor_channel, AdapterMonitor, MonitorEvent, MonitorHandle, MonitorStats, RecoveryOrigin,
};
pub use status_reactor::{NotifyPlan, Reaction, Recheck, StatusReactor};
