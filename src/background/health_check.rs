//! Health check: periodic idle detection per connection.
//!
//! Per-connection state machine driven by [`HealthChecker::tick`]:
//!
//! - `Healthy(0)` -> `Suspect(k)` while idle time exceeds the threshold
//! - `Suspect(k)` -> `Healthy(0)` on fresh activity or a tick within threshold
//! - `Suspect(k)` -> `Recovering` (counter back to 0) once `k > retries`
//!
//! An active curfew bypasses the whole tick: no counter moves and nothing
//! is recovered.

use tracing::{debug, info};

use crate::activity::{ActivityTracker, FailureCounters};
use crate::component::NodeHandle;
use crate::config::ReloadAdaptersConfig;
use crate::connection::{Connection, ConnectionId};
use crate::curfew::Curfew;

/// A connection whose component should be reloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryRequest {
    pub connection: ConnectionId,
    pub component: NodeHandle,
}

/// Result of one health-check tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The curfew gate was active; no state changed.
    CurfewSkipped,
    Checked(TickReport),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Connections that had an idle threshold configured.
    pub checked: usize,
    /// Connections found idle this tick, with their failure count.
    pub idle: Vec<(ConnectionId, u32)>,
    /// Connections that crossed the retry ceiling.
    pub recover: Vec<RecoveryRequest>,
}

/// Owns the activity and failure tables for every watched connection.
#[derive(Debug)]
pub struct HealthChecker {
    plan: ReloadAdaptersConfig,
    curfew: Curfew,
    activity: ActivityTracker,
    failures: FailureCounters,
}

impl HealthChecker {
    pub fn new(config: &ReloadAdaptersConfig, curfew: Curfew) -> Self {
        Self {
            plan: config.clone(),
            curfew,
            activity: ActivityTracker::new(),
            failures: FailureCounters::new(),
        }
    }

    /// Record inbound activity. Fresh activity clears any suspicion.
    pub fn touch(&mut self, id: &ConnectionId, now_ms: u64) {
        self.activity.touch(id, now_ms);
        self.failures.reset(id);
    }

    pub fn failures(&self, id: &ConnectionId) -> u32 {
        self.failures.read(id)
    }

    pub fn last_seen(&self, id: &ConnectionId) -> Option<u64> {
        self.activity.last_seen(id)
    }

    pub fn curfew(&self) -> &Curfew {
        &self.curfew
    }

    /// Connections currently carrying a non-zero failure count.
    pub fn suspect_count(&self) -> usize {
        self.failures.suspects().count()
    }

    /// Evaluate every live connection that has an idle threshold.
    ///
    /// Counters of connections that crossed the ceiling are already reset
    /// when this returns; the caller only has to start the recoveries.
    pub fn tick(
        &mut self,
        connections: &[Connection],
        now_ms: u64,
        minute_of_day: u32,
    ) -> TickOutcome {
        if self.curfew.is_active(minute_of_day) {
            debug!(minute_of_day, "Curfew active, skipping health check");
            return TickOutcome::CurfewSkipped;
        }

        let mut report = TickReport::default();
        for conn in connections {
            let Some(threshold) = self.plan.idle_threshold_ms(&conn.id) else {
                continue;
            };
            report.checked += 1;

            // Never seen counts as idle forever.
            let idle_ms = self.activity.idle_ms(&conn.id, now_ms);
            if idle_ms.is_some_and(|idle| idle <= threshold) {
                self.failures.reset(&conn.id);
                continue;
            }

            let (count, crossed) = self.failures.increment_past(&conn.id, self.plan.retries);
            info!(
                connection = %conn.id,
                idle_ms = ?idle_ms,
                threshold_ms = threshold,
                failures = count,
                "Connection not responding, check"
            );
            report.idle.push((conn.id.clone(), count));

            if crossed {
                info!(
                    connection = %conn.id,
                    component = %conn.component,
                    failures = count,
                    retries = self.plan.retries,
                    "Connection not responding, reload"
                );
                report.recover.push(RecoveryRequest {
                    connection: conn.id.clone(),
                    component: conn.component,
                });
            }
        }
        TickOutcome::Checked(report)
    }
}
