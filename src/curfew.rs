//! Curfew gate: time-of-day windows during which automatic recovery is
//! suppressed.
//!
//! Windows are parsed once from `"H:MM"` / `"HH:MM"` markers into minute
//! offsets. A window is open at minute `t` iff `start < t < end`; boundary
//! minutes are excluded and windows with `start >= end` never open.

use serde::{Deserialize, Serialize};

use crate::error::CurfewError;

/// Minutes in a day.
pub const MINUTES_PER_DAY: u16 = 1440;

/// Human-readable window as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerWindow {
    pub start: String,
    pub end: String,
}

impl MarkerWindow {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Convert an `"H:MM"` or `"HH:MM"` marker to `hours * 60 + minutes`.
pub fn marker_to_minutes(marker: &str) -> Result<u16, CurfewError> {
    let malformed = || CurfewError::MalformedMarker(marker.to_string());

    let (hours, minutes) = marker.trim().split_once(':').ok_or_else(malformed)?;
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(hours) || hours.len() > 2 || !digits(minutes) || minutes.len() != 2 {
        return Err(malformed());
    }

    let h: u16 = hours.parse().map_err(|_| malformed())?;
    let m: u16 = minutes.parse().map_err(|_| malformed())?;
    if h > 23 {
        return Err(CurfewError::OutOfRange {
            marker: marker.to_string(),
            reason: "hours must be 0-23",
        });
    }
    if m > 59 {
        return Err(CurfewError::OutOfRange {
            marker: marker.to_string(),
            reason: "minutes must be 0-59",
        });
    }
    Ok(h * 60 + m)
}

/// A window of minute-of-day offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: u16,
    pub end: u16,
}

impl TimeWindow {
    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub fn parse(marker: &MarkerWindow) -> Result<Self, CurfewError> {
        Ok(Self {
            start: marker_to_minutes(&marker.start)?,
            end: marker_to_minutes(&marker.end)?,
        })
    }

    pub fn is_open(&self, minute: u32) -> bool {
        u32::from(self.start) < minute && minute < u32::from(self.end)
    }

    /// `start >= end`: the window never opens (midnight spans included).
    pub fn is_permanently_closed(&self) -> bool {
        self.start >= self.end
    }
}

/// Ordered list of windows; "in curfew" means any window is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Curfew {
    windows: Vec<TimeWindow>,
}

impl Curfew {
    pub fn new(windows: Vec<TimeWindow>) -> Self {
        Self { windows }
    }

    pub fn from_markers(markers: &[MarkerWindow]) -> Result<Self, CurfewError> {
        let windows = markers
            .iter()
            .map(TimeWindow::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { windows })
    }

    pub fn is_active(&self, minute_of_day: u32) -> bool {
        self.windows.iter().any(|w| w.is_open(minute_of_day))
    }

    pub fn windows(&self) -> &[TimeWindow] {
        &self.windows
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Format a minute offset back to `HH:MM`.
pub fn format_minutes(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
