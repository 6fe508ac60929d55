//! Time sources for activity stamps and curfew checks.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Timelike;

/// Source of "now" for the monitor.
///
/// Activity stamps use wall-clock milliseconds; the curfew gate only needs
/// the local time of day.
pub trait Clock: Send + Sync {
    /// Wall-clock milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;

    /// Local minute of day, `hours * 60 + minutes`, in `[0, 1440)`.
    fn minute_of_day(&self) -> u32;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }

    fn minute_of_day(&self) -> u32 {
        let now = chrono::Local::now();
        now.hour() * 60 + now.minute()
    }
}

/// Settable clock for tests and replays.
///
/// Clones share the same underlying time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
    minute: Arc<AtomicU32>,
}

impl ManualClock {
    pub fn new(now_ms: u64, minute_of_day: u32) -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(now_ms)),
            minute: Arc::new(AtomicU32::new(minute_of_day % 1440)),
        }
    }

    pub fn advance_ms(&self, delta_ms: u64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    pub fn set_minute_of_day(&self, minute: u32) {
        self.minute.store(minute % 1440, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn minute_of_day(&self) -> u32 {
        self.minute.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(1_000, 60);
        let other = clock.clone();
        clock.advance_ms(500);
        assert_eq!(other.now_ms(), 1_500);
        other.set_minute_of_day(1441);
        assert_eq!(clock.minute_of_day(), 1);
    }

    #[test]
    fn system_clock_minute_in_range() {
        assert!(SystemClock.minute_of_day() < 1440);
        assert!(SystemClock.now_ms() > 0);
    }
}
