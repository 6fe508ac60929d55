//! Monitor Configuration - every tunable of the sentinel as a TOML value
//!
//! Each struct implements `Default`, so an absent file or section yields
//! the built-in behaviour.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;
use crate::connection::ConnectionId;
use crate::curfew::{Curfew, MarkerWindow};
use crate::notify::NotifyRoute;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration of the sentinel.
///
/// Load with `MonitorConfig::load()` which searches:
/// 1. `$SENTINEL_CONFIG` env var
/// 2. `./sentinel.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Connection used to send operator notifications. Disconnects of this
    /// connection never notify about themselves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_sid: Option<String>,

    /// Destination channel for notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_target: Option<String>,

    /// Answer the `ping` command.
    #[serde(default = "default_true")]
    pub ping: bool,

    /// Re-check and reload a connection some time after it disconnects.
    #[serde(default)]
    pub reload_on_disconnect: bool,

    #[serde(default = "default_disconnect_delay")]
    pub reload_on_disconnect_delay_ms: u64,

    #[serde(default = "default_sandbox_prefix")]
    pub sandbox_platform_prefix: String,

    /// Idle-connection health checks
    #[serde(default)]
    pub reload_adapters: ReloadAdaptersConfig,

    /// Windows during which automatic recovery is suppressed
    #[serde(default)]
    pub curfew: Vec<MarkerWindow>,
}

fn default_true() -> bool { true }
fn default_disconnect_delay() -> u64 { defaults::RELOAD_ON_DISCONNECT_DELAY_MS }
fn default_sandbox_prefix() -> String { defaults::SANDBOX_PLATFORM_PREFIX.to_string() }

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            notify_sid: None,
            notify_target: None,
            ping: true,
            reload_on_disconnect: false,
            reload_on_disconnect_delay_ms: default_disconnect_delay(),
            sandbox_platform_prefix: default_sandbox_prefix(),
            reload_adapters: ReloadAdaptersConfig::default(),
            curfew: Vec::new(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration using the standard search order:
    /// 1. `$SENTINEL_CONFIG` environment variable
    /// 2. `./sentinel.toml` in the current working directory
    /// 3. Built-in defaults
    ///
    /// A candidate that fails to parse or validate is skipped with a warning.
    pub fn load() -> Self {
        for path in Self::candidate_paths() {
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!(path = %path.display(), "Loaded sentinel config");
                    return config;
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to load sentinel config, falling back"
                    );
                }
            }
        }

        info!("No usable sentinel config found, using built-in defaults");
        Self::default()
    }

    /// Existing config files in search order: `$SENTINEL_CONFIG`, then
    /// `./sentinel.toml`.
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                paths.push(p);
            } else {
                warn!(path = %path, "SENTINEL_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            paths.push(local);
        }
        paths
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents, &path.display().to_string())
    }

    /// Parse and validate a TOML document. `origin` names it in errors.
    pub fn from_toml_str(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in &super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate the config before any component consults it.
    ///
    /// Malformed curfew markers are rejected here; the curfew gate assumes
    /// well-formed minute offsets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_ranges(self);
        for w in &warnings {
            warn!("{}", w);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Parsed curfew gate.
    pub fn curfew(&self) -> Result<Curfew, ConfigError> {
        Curfew::from_markers(&self.curfew)
            .map_err(|e| ConfigError::Validation(vec![format!("curfew: {e}")]))
    }

    pub fn notify_route(&self) -> Option<NotifyRoute> {
        NotifyRoute::from_config(self.notify_sid.as_deref(), self.notify_target.as_deref())
    }

    pub fn disconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reload_on_disconnect_delay_ms)
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse error ({origin}): {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Reload Adapters
// ============================================================================

/// Idle-connection detection and reload policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadAdaptersConfig {
    /// Idle ticks tolerated before reloading; recovery fires once the
    /// count exceeds this.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Tick period. 0 disables the health-check loop.
    #[serde(default = "default_check_interval")]
    pub check_interval_ms: u64,

    /// Per-connection idle threshold (ms). Connections without an entry
    /// are not health-checked.
    #[serde(default)]
    pub intervals: BTreeMap<ConnectionId, u64>,
}

fn default_retries() -> u32 { defaults::RELOAD_RETRIES }
fn default_check_interval() -> u64 { defaults::CHECK_INTERVAL_MS }

impl Default for ReloadAdaptersConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            check_interval_ms: default_check_interval(),
            intervals: BTreeMap::new(),
        }
    }
}

impl ReloadAdaptersConfig {
    /// Tick period, `None` when the loop is disabled.
    pub fn check_interval(&self) -> Option<Duration> {
        (self.check_interval_ms > 0).then(|| Duration::from_millis(self.check_interval_ms))
    }

    pub fn idle_threshold_ms(&self, id: &ConnectionId) -> Option<u64> {
        self.intervals.get(id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = MonitorConfig::default();
        assert_eq!(config.reload_adapters.retries, 2);
        assert_eq!(
            config.reload_adapters.check_interval(),
            Some(Duration::from_secs(120))
        );
        assert!(config.ping);
        assert!(!config.reload_on_disconnect);
        assert!(config.notify_route().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = MonitorConfig::from_toml_str("", "test").unwrap();
        assert_eq!(config.reload_adapters.retries, 2);
        assert_eq!(config.sandbox_platform_prefix, "sandbox");
        assert!(config.curfew().unwrap().is_empty());
    }

    #[test]
    fn full_document_parses() {
        let toml_str = r#"
notify_sid = "onebot:10000"
notify_target = "private:42"
ping = false
reload_on_disconnect = true
reload_on_disconnect_delay_ms = 5000

[reload_adapters]
retries = 3
check_interval_ms = 60000

[reload_adapters.intervals]
"onebot:10000" = 600000
"discord:77" = 300000

[[curfew]]
start = "1:00"
end = "6:30"
"#;
        let config = MonitorConfig::from_toml_str(toml_str, "test").unwrap();
        assert_eq!(config.reload_adapters.retries, 3);
        assert_eq!(
            config
                .reload_adapters
                .idle_threshold_ms(&ConnectionId::from("discord:77")),
            Some(300_000)
        );
        assert_eq!(
            config
                .reload_adapters
                .idle_threshold_ms(&ConnectionId::from("telegram:1")),
            None
        );
        assert_eq!(config.disconnect_delay(), Duration::from_secs(5));
        let route = config.notify_route().unwrap();
        assert_eq!(route.target, "private:42");
        let curfew = config.curfew().unwrap();
        assert_eq!(curfew.windows()[0].start, 60);
        assert_eq!(curfew.windows()[0].end, 390);
    }

    #[test]
    fn zero_check_interval_disables_loop() {
        let config = MonitorConfig::from_toml_str(
            "[reload_adapters]\ncheck_interval_ms = 0\n",
            "test",
        )
        .unwrap();
        assert!(config.reload_adapters.check_interval().is_none());
    }

    #[test]
    fn malformed_curfew_rejected_at_load() {
        let err = MonitorConfig::from_toml_str(
            "[[curfew]]\nstart = \"25:00\"\nend = \"6:00\"\n",
            "test",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("curfew[0].start"));
    }

    #[test]
    fn parse_error_names_origin() {
        let err = MonitorConfig::from_toml_str("retries = [", "inline.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("inline.toml"));
    }

    #[test]
    fn to_toml_round_trips() {
        let mut config = MonitorConfig::default();
        config.notify_sid = Some("onebot:1".to_string());
        config
            .reload_adapters
            .intervals
            .insert(ConnectionId::from("onebot:1"), 1_000);
        config.curfew.push(MarkerWindow::new("2:00", "3:00"));
        let text = config.to_toml().unwrap();
        let back = MonitorConfig::from_toml_str(&text, "roundtrip").unwrap();
        assert_eq!(back.notify_sid.as_deref(), Some("onebot:1"));
        assert_eq!(back.reload_adapters.intervals.len(), 1);
        assert_eq!(back.curfew, config.curfew);
    }
}
