//! Per-connection activity stamps and consecutive-failure counters.
//!
//! Both tables are owned by the monitor task and mutated only from its
//! event loop, so neither needs internal locking.

use std::collections::HashMap;

use crate::connection::ConnectionId;

/// Last observed inbound event per connection, in wall-clock milliseconds.
///
/// Entries are never removed; stale ones are bounded by the number of
/// connections ever seen.
#[derive(Debug, Default)]
pub struct ActivityTracker {
    last_seen: HashMap<ConnectionId, u64>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record activity for `id` at `now_ms`.
    pub fn touch(&mut self, id: &ConnectionId, now_ms: u64) {
        // Only allocate a key the first time a connection is seen.
        if let Some(stamp) = self.last_seen.get_mut(id) {
            *stamp = now_ms;
        } else {
            self.last_seen.insert(id.clone(), now_ms);
        }
    }

    pub fn last_seen(&self, id: &ConnectionId) -> Option<u64> {
        self.last_seen.get(id).copied()
    }

    /// Milliseconds since the last activity, `None` if never seen.
    pub fn idle_ms(&self, id: &ConnectionId, now_ms: u64) -> Option<u64> {
        self.last_seen(id).map(|t| now_ms.saturating_sub(t))
    }

    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }
}

/// Consecutive idle-tick counts per connection.
///
/// Counters start lazily at zero. [`FailureCounters::increment`] returns the
/// new value so the caller can compare and reset within the same tick.
#[derive(Debug, Default)]
pub struct FailureCounters {
    counts: HashMap<ConnectionId, u32>,
}

impl FailureCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self, id: &ConnectionId) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, id: &ConnectionId) -> u32 {
        let count = self.counts.entry(id.clone()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn reset(&mut self, id: &ConnectionId) {
        if let Some(count) = self.counts.get_mut(id) {
            *count = 0;
        }
    }

    /// Increment and, when the new count exceeds `ceiling`, reset to zero.
    ///
    /// Returns the count reached before any reset and whether the ceiling
    /// was crossed.
    pub fn increment_past(&mut self, id: &ConnectionId, ceiling: u32) -> (u32, bool) {
        let reached = self.increment(id);
        let crossed = reached > ceiling;
        if crossed {
            self.reset(id);
        }
        (reached, crossed)
    }

    /// Connections with a non-zero count.
    pub fn suspects(&self) -> impl Iterator<Item = (&ConnectionId, u32)> {
        self.counts
            .iter()
            .filter(|(_, c)| **c > 0)
            .map(|(id, c)| (id, *c))
    }
}
