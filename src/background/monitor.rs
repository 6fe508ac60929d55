//! Adapter monitor - the single task that owns all supervision state
//!
//! Activity touches, status changes, the periodic health-check tick and
//! every spawned recovery, notification and delayed recheck are multiplexed
//! in one `select!` loop. The activity tracker and failure counters are owned
//! by the loop and take no lock; only the published stats sit behind one.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::health_check::{HealthChecker, TickOutcome};
use super::status_reactor::{NotifyPlan, Recheck, StatusReactor};
use crate::clock::Clock;
use crate::component::{ComponentHost, ComponentRef, NodeHandle, Resolved};
use crate::config::{ConfigError, MonitorConfig};
use crate::connection::{ConnectionId, ConnectionRegistry, StatusEvent};
use crate::error::{MonitorStopped, NotifyError, RecoveryError};
use crate::notify::Notifier;
use crate::recovery::RecoveryDriver;

/// Input delivered to the monitor task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Inbound traffic was observed on a connection.
    Activity(ConnectionId),
    StatusChanged(StatusEvent),
}

/// Create the bounded channel feeding [`AdapterMonitor::run`].
pub fn monitor_channel(capacity: usize) -> (MonitorHandle, mpsc::Receiver<MonitorEvent>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (MonitorHandle { tx }, rx)
}

/// Cloneable sender side used by the host's event hooks.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    tx: mpsc::Sender<MonitorEvent>,
}

impl MonitorHandle {
    /// Report activity without waiting. Returns `false` when the event was
    /// dropped because the channel is full or the monitor has stopped.
    pub fn touch(&self, id: impl Into<ConnectionId>) -> bool {
        match self.tx.try_send(MonitorEvent::Activity(id.into())) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                debug!(?event, "Monitor channel full, dropping activity touch");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Report a status change. Status changes are never dropped; this waits
    /// for channel capacity.
    pub async fn status_changed(&self, event: StatusEvent) -> Result<(), MonitorStopped> {
        self.tx
            .send(MonitorEvent::StatusChanged(event))
            .await
            .map_err(|_| MonitorStopped)
    }
}

/// Counters published for observers of the monitor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub ticks: u64,
    pub ticks_skipped_curfew: u64,
    pub recoveries_triggered: u64,
    pub recoveries_succeeded: u64,
    pub recoveries_failed: u64,
    pub notifications_sent: u64,
    pub notifications_skipped: u64,
    pub notifications_failed: u64,
    pub rechecks_fired: u64,
    /// Connections with a non-zero failure count after the last tick.
    pub suspect_connections: u64,
}

/// What started a recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOrigin {
    HealthCheck,
    Disconnect,
}

impl fmt::Display for RecoveryOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryOrigin::HealthCheck => write!(f, "health_check"),
            RecoveryOrigin::Disconnect => write!(f, "disconnect"),
        }
    }
}

/// Completion of work spawned into the loop's `JoinSet`.
enum TaskOutcome {
    Recovery {
        connection: ConnectionId,
        origin: RecoveryOrigin,
        result: Result<Resolved, RecoveryError>,
    },
    Notification {
        connection: ConnectionId,
        result: Result<(), NotifyError>,
    },
    RecheckDue {
        connection: ConnectionId,
    },
}

pub struct AdapterMonitor {
    registry: Arc<dyn ConnectionRegistry>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    driver: RecoveryDriver,
    checker: HealthChecker,
    reactor: StatusReactor,
    check_interval: Option<time::Duration>,
    stats: Arc<RwLock<MonitorStats>>,
}

impl AdapterMonitor {
    /// Build a monitor from a validated config.
    pub fn new(
        config: &MonitorConfig,
        host: Arc<dyn ComponentHost>,
        registry: Arc<dyn ConnectionRegistry>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let curfew = config.curfew()?;
        Ok(Self {
            registry,
            notifier,
            clock,
            driver: RecoveryDriver::new(host),
            checker: HealthChecker::new(&config.reload_adapters, curfew),
            reactor: StatusReactor::new(config),
            check_interval: config.reload_adapters.check_interval(),
            stats: Arc::new(RwLock::new(MonitorStats::default())),
        })
    }

    /// Shared view of the monitor counters.
    pub fn stats_handle(&self) -> Arc<RwLock<MonitorStats>> {
        Arc::clone(&self.stats)
    }

    /// Run until `cancel` fires or every [`MonitorHandle`] is dropped.
    ///
    /// Outstanding recoveries, sends and timers are aborted on return.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<MonitorEvent>,
        cancel: CancellationToken,
    ) {
        let mut tasks: JoinSet<TaskOutcome> = JoinSet::new();
        let mut ticker = self.check_interval.map(|period| {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        info!(
            check_interval = ?self.check_interval,
            curfew_windows = self.checker.curfew().windows().len(),
            "Adapter monitor started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Adapter monitor received shutdown signal");
                    break;
                }
                _ = next_tick(&mut ticker) => {
                    self.run_health_check(&mut tasks).await;
                }
                event = events.recv() => match event {
                    Some(MonitorEvent::Activity(id)) => {
                        let now = self.clock.now_ms();
                        self.checker.touch(&id, now);
                    }
                    Some(MonitorEvent::StatusChanged(event)) => {
                        self.on_status_changed(&event, &mut tasks).await;
                    }
                    None => {
                        info!("All monitor handles dropped, stopping");
                        break;
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    self.on_task_finished(joined, &mut tasks).await;
                }
            }
        }

        let pending = tasks.len();
        tasks.shutdown().await;
        info!(aborted_tasks = pending, "Adapter monitor stopped");
    }

    async fn run_health_check(&mut self, tasks: &mut JoinSet<TaskOutcome>) {
        let connections = self.registry.connections();
        let now = self.clock.now_ms();
        let minute = self.clock.minute_of_day();
        let outcome = self.checker.tick(&connections, now, minute);

        let mut stats = self.stats.write().await;
        stats.ticks += 1;
        match outcome {
            TickOutcome::CurfewSkipped => stats.ticks_skipped_curfew += 1,
            TickOutcome::Checked(report) => {
                debug!(
                    checked = report.checked,
                    idle = report.idle.len(),
                    recover = report.recover.len(),
                    "Health check complete"
                );
                stats.suspect_connections = self.checker.suspect_count() as u64;
                for request in report.recover {
                    stats.recoveries_triggered += 1;
                    self.spawn_recovery(
                        tasks,
                        request.connection,
                        request.component,
                        RecoveryOrigin::HealthCheck,
                    );
                }
            }
        }
    }

    async fn on_status_changed(&mut self, event: &StatusEvent, tasks: &mut JoinSet<TaskOutcome>) {
        let Some(reaction) = self.reactor.react(event) else {
            debug!(
                connection = %event.connection,
                platform = %event.platform,
                status = %event.status,
                "Status change ignored"
            );
            return;
        };

        info!(
            connection = %event.connection,
            status = %event.status,
            "Connection left online state"
        );

        match reaction.notify {
            NotifyPlan::Send { route, content } => {
                let registry = Arc::clone(&self.registry);
                let notifier = Arc::clone(&self.notifier);
                let connection = reaction.connection.clone();
                tasks.spawn(async move {
                    let result = route
                        .send(registry.as_ref(), notifier.as_ref(), &content)
                        .await;
                    TaskOutcome::Notification { connection, result }
                });
            }
            NotifyPlan::SelfSkipped => {
                debug!(
                    connection = %reaction.connection,
                    "Notifier connection changed status, not notifying itself"
                );
                self.stats.write().await.notifications_skipped += 1;
            }
            NotifyPlan::NotConfigured => {
                debug!(
                    connection = %reaction.connection,
                    "No notifier configured, skipping notification"
                );
                self.stats.write().await.notifications_skipped += 1;
            }
        }

        if let Some(delay) = reaction.recheck_after {
            let connection = reaction.connection;
            debug!(connection = %connection, delay = ?delay, "Recheck scheduled");
            tasks.spawn(async move {
                time::sleep(delay).await;
                TaskOutcome::RecheckDue { connection }
            });
        }
    }

    async fn on_task_finished(
        &mut self,
        joined: Result<TaskOutcome, JoinError>,
        tasks: &mut JoinSet<TaskOutcome>,
    ) {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => return,
            Err(e) => {
                error!(error = %e, "Monitor task panicked");
                return;
            }
        };

        match outcome {
            TaskOutcome::Recovery {
                connection,
                origin,
                result,
            } => {
                let mut stats = self.stats.write().await;
                match result {
                    Ok(resolved) => {
                        stats.recoveries_succeeded += 1;
                        info!(
                            connection = %connection,
                            origin = %origin,
                            key = %resolved.key,
                            "Component reloaded"
                        );
                    }
                    Err(e) if e.is_not_found() => {
                        stats.recoveries_failed += 1;
                        warn!(
                            connection = %connection,
                            origin = %origin,
                            error = %e,
                            "Recovery target not found"
                        );
                    }
                    Err(e) => {
                        stats.recoveries_failed += 1;
                        error!(
                            connection = %connection,
                            origin = %origin,
                            error = %e,
                            "Recovery failed"
                        );
                    }
                }
            }
            TaskOutcome::Notification { connection, result } => {
                let mut stats = self.stats.write().await;
                match result {
                    Ok(()) => {
                        stats.notifications_sent += 1;
                        debug!(connection = %connection, "Operator notified");
                    }
                    Err(e @ NotifyError::NotifierUnavailable(_)) => {
                        stats.notifications_skipped += 1;
                        warn!(connection = %connection, error = %e, "Notification skipped");
                    }
                    Err(e) => {
                        stats.notifications_failed += 1;
                        error!(connection = %connection, error = %e, "Notification failed");
                    }
                }
            }
            TaskOutcome::RecheckDue { connection } => {
                self.on_recheck_due(connection, tasks).await;
            }
        }
    }

    async fn on_recheck_due(&mut self, connection: ConnectionId, tasks: &mut JoinSet<TaskOutcome>) {
        let mut stats = self.stats.write().await;
        stats.rechecks_fired += 1;

        // Curfew gates the health-check tick only; a disconnect recheck always acts.
        match StatusReactor::recheck(self.registry.get(&connection).as_ref()) {
            Recheck::StillDown(component) => {
                info!(
                    connection = %connection,
                    component = %component,
                    "Connection still down after delay, reload"
                );
                stats.recoveries_triggered += 1;
                self.spawn_recovery(tasks, connection, component, RecoveryOrigin::Disconnect);
            }
            Recheck::Recovered => {
                debug!(connection = %connection, "Connection back online before recheck");
            }
            Recheck::Vanished => {
                debug!(connection = %connection, "Connection gone before recheck");
            }
        }
    }

    fn spawn_recovery(
        &self,
        tasks: &mut JoinSet<TaskOutcome>,
        connection: ConnectionId,
        component: NodeHandle,
        origin: RecoveryOrigin,
    ) {
        let driver = self.driver.clone();
        tasks.spawn(async move {
            let result = driver.recover(&ComponentRef::Handle(component)).await;
            TaskOutcome::Recovery {
                connection,
                origin,
                result,
            }
        });
    }
}

/// Resolves on the next tick, or never when the health check is disabled.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
