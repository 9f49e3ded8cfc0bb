//! Configuration management for jsonmend
//!
//! Timing and budget knobs for the watch loop and the repair engine. Every
//! value has a default, so a config file only needs the keys it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

/// File-level configuration, loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MendConfig {
    /// Watch loop timing
    #[serde(default)]
    pub watch: WatchSection,

    /// Repair engine budgets
    #[serde(default)]
    pub repair: RepairSection,
}

/// `[watch]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchSection {
    /// Notifications this soon after our own write are discarded
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Pause before reading a file an external writer just changed
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

/// `[repair]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairSection {
    /// Verbatim retries allowed for non-positional failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause before each verbatim retry
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Corrective single-character edits allowed in one repair chain
    #[serde(default = "default_max_edits")]
    pub max_edits: u32,
}

// Default value providers
fn default_debounce_ms() -> u64 {
    5_000
}

fn default_settle_ms() -> u64 {
    1_000
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    5_000
}

fn default_max_edits() -> u32 {
    256
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl Default for RepairSection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            max_edits: default_max_edits(),
        }
    }
}

impl MendConfig {
    /// Load configuration from `path`, or use defaults when no path is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("{} ({})", e, path.display())))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Runtime settings for the watch loop.
    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig {
            debounce_window: Duration::from_millis(self.watch.debounce_ms),
            settle_delay: Duration::from_millis(self.watch.settle_ms),
        }
    }

    /// Runtime settings for the repair engine.
    pub fn repair_config(&self) -> RepairConfig {
        RepairConfig {
            max_retries: self.repair.max_retries,
            retry_delay: Duration::from_millis(self.repair.retry_delay_ms),
            max_edits: self.repair.max_edits,
        }
    }
}

/// Runtime configuration for the watch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Minimum time after our own write before a notification counts.
    /// Default: 5 seconds
    pub debounce_window: Duration,

    /// How long to let an external writer finish before reading.
    /// Default: 1 second
    pub settle_delay: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        MendConfig::default().watch_config()
    }
}

/// Runtime configuration for the repair engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairConfig {
    /// Verbatim retries for failures that carry no usable position.
    /// Default: 5
    pub max_retries: u32,

    /// Delay before each verbatim retry. Longer than the debounce window
    /// so a concurrent writer has time to let go of the file.
    /// Default: 5 seconds
    pub retry_delay: Duration,

    /// Ceiling on corrective edits within one repair chain.
    /// Default: 256
    pub max_edits: u32,
}

impl Default for RepairConfig {
    fn default() -> Self {
        MendConfig::default().repair_config()
    }
}
