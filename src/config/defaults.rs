//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Config Loading
// ============================================================================

/// Environment variable holding the path of the config file.
pub const CONFIG_ENV_VAR: &str = "SENTINEL_CONFIG";

/// Config file looked up in the working directory when the env var is unset.
pub const LOCAL_CONFIG_FILE: &str = "sentinel.toml";

// ============================================================================
// Health-Check Loop
// ============================================================================

/// Idle ticks tolerated before a connection is reloaded.
pub const RELOAD_RETRIES: u32 = 2;

/// Health-check tick period (ms). 120 000 = 2 minutes.
pub const CHECK_INTERVAL_MS: u64 = 120_000;

// ============================================================================
// Status-Change Reactor
// ============================================================================

/// Delay before a disconnected connection is re-checked and reloaded (ms).
pub const RELOAD_ON_DISCONNECT_DELAY_MS: u64 = 10_000;

/// Platforms starting with this prefix never trigger notifications or reloads.
pub const SANDBOX_PLATFORM_PREFIX: &str = "sandbox";

// ============================================================================
// Commands
// ============================================================================

/// Minimum caller authority for the `ping` command.
pub const PING_MIN_AUTHORITY: u8 = 3;
