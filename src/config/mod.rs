//! Sentinel Configuration Module
//!
//! Monitor configuration loaded from a TOML file.
//!
//! ## Loading Order
//!
//! 1. `SENTINEL_CONFIG` environment variable (path to TOML file)
//! 2. `sentinel.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! let config = MonitorConfig::load();
//! let curfew = config.curfew()?;
//! ```

mod monitor_config;
pub mod defaults;
pub mod validation;

pub use monitor_config::*;
