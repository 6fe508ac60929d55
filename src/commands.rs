//! Chat commands answered by the sentinel itself.

use crate::config::{defaults, MonitorConfig};

/// Liveness probe: `ping` answers `pong` to sufficiently privileged callers.
#[derive(Debug, Clone, Copy)]
pub struct PingCommand {
    enabled: bool,
    min_authority: u8,
}

impl PingCommand {
    pub const NAME: &'static str = "ping";
    pub const REPLY: &'static str = "pong";

    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            enabled: config.ping,
            min_authority: defaults::PING_MIN_AUTHORITY,
        }
    }

    /// Reply to `input`, or `None` when the command does not apply.
    pub fn reply(&self, input: &str, authority: u8) -> Option<String> {
        if !self.enabled || authority < self.min_authority {
            return None;
        }
        (input.trim() == Self::NAME).then(|| Self::REPLY.to_string())
    }
}
