//! Configuration file handling.
//!
//! This module provides loading and saving of netsweep configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/netsweep/config.toml`
//! - macOS: `~/Library/Application Support/netsweep/config.toml`
//! - Windows: `%APPDATA%\netsweep\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! nmap_path = "nmap"
//! default_mode = "normal"
//! default_timing = "T3"
//! default_format = "table"
//! command_timeout_secs = 900
//! concurrency = 4
//! abort_on_host_failure = false
//! allow_non_private = false
//! ```

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::{ScanMode, Timing};

/// Application configuration.
///
/// Every field has a default, so a partial file (or none at all) is valid.
/// Command-line flags take precedence over these values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The nmap binary, by name (looked up on `PATH`) or absolute path.
    ///
    /// Default: "nmap"
    pub nmap_path: String,

    /// Scan mode used when `--mode` is not given.
    ///
    /// Valid values: "quick", "normal", "deep" (any case; anything else is "normal")
    /// Default: "normal"
    #[serde(deserialize_with = "lenient_mode")]
    pub default_mode: ScanMode,

    /// Timing template used when `--timing` is not given.
    ///
    /// Valid values: "T2", "T3", "T4" (any case; anything else is "T3")
    /// Default: "T3"
    #[serde(deserialize_with = "lenient_timing")]
    pub default_timing: Timing,

    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json"
    /// Default: "table"
    pub default_format: String,

    /// Per-process timeout in seconds. 0 disables it.
    ///
    /// Default: 900
    pub command_timeout_secs: u64,

    /// How many hosts are port-scanned at once. 1 scans strictly one at a time.
    ///
    /// Default: 4
    pub concurrency: usize,

    /// Abort the whole scan when one host's port scan fails, instead of
    /// recording that host with no ports.
    ///
    /// Default: false
    pub abort_on_host_failure: bool,

    /// Skip the RFC1918 target guardrail.
    ///
    /// Default: false
    pub allow_non_private: bool,
}

fn lenient_mode<'de, D>(deserializer: D) -> std::result::Result<ScanMode, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|raw| ScanMode::normalize(&raw))
}

fn lenient_timing<'de, D>(deserializer: D) -> std::result::Result<Timing, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|raw| Timing::normalize(&raw))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nmap_path: "nmap".to_string(),
            default_mode: ScanMode::Normal,
            default_timing: Timing::T3,
            default_format: "table".to_string(),
            command_timeout_secs: 900,
            concurrency: 4,
            abort_on_host_failure: false,
            allow_non_private: false,
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`, falling back to defaults if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("netsweep")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
