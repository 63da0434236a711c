//! Optional configuration file

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use aula_f87::EngineConfig;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    pub timing: TimingConfig,
    pub transaction: TransactionConfig,
}

impl Config {
    /// Get the config file path for this platform
    pub fn path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "aula-ctl").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load config from file, or use defaults if it doesn't exist
    pub fn load() -> Result<Self, Box<dyn Error>> {
        match Self::path() {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(&path)?;
                let config = toml::from_str(&contents)
                    .map_err(|e| format!("{}: {e}", path.display()))?;
                tracing::debug!("loaded config from {}", path.display());
                Ok(config)
            },
            _ => Ok(Self::default()),
        }
    }

    /// Timing and verification settings for the transaction engine
    pub fn engine(&self) -> EngineConfig {
        let timing = &self.timing;
        EngineConfig {
            read_timeout: timing.read_timeout,
            max_reads: timing.max_reads,
            full_read_timeout: timing.read_timeout_full,
            full_max_reads: timing.max_reads_full,
            echo_timeout: timing.echo_timeout,
            raw_timeout: timing.raw_timeout,
            verify: self.transaction.verify,
            ..EngineConfig::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Preferred HID usage page, e.g. 0xFF13
    pub page: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Per-read timeout while reading the config before a write
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,
    /// Per-read timeout for the `read` command
    #[serde(with = "humantime_serde")]
    pub read_timeout_full: Duration,
    /// Wait for the echo of each written fragment
    #[serde(with = "humantime_serde")]
    pub echo_timeout: Duration,
    /// Per-read timeout after a raw frame
    #[serde(with = "humantime_serde")]
    pub raw_timeout: Duration,
    /// Responses polled while reading the config before a write
    pub max_reads: usize,
    /// Responses polled by the `read` command
    pub max_reads_full: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            read_timeout: engine.read_timeout,
            read_timeout_full: engine.full_read_timeout,
            echo_timeout: engine.echo_timeout,
            raw_timeout: engine.raw_timeout,
            max_reads: engine.max_reads,
            max_reads_full: engine.full_max_reads,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Read the config back after saving
    pub verify: bool,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self { verify: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine() {
        let config = Config::default();
        assert_eq!(config.engine(), EngineConfig::default());
        assert_eq!(config.device.page, None);
    }

    #[test]
    fn partial_file() {
        let config: Config = toml::from_str(
            r#"
[device]
page = 0xFF13

[timing]
echo_timeout = "50ms"
max_reads_full = 20

[transaction]
verify = false
"#,
        )
        .unwrap();
        assert_eq!(config.device.page, Some(0xFF13));
        let engine = config.engine();
        assert_eq!(engine.echo_timeout, Duration::from_millis(50));
        assert_eq!(engine.full_max_reads, 20);
        assert_eq!(engine.read_timeout, Duration::from_millis(300));
        assert!(!engine.verify);
    }

    #[test]
    fn roundtrip_pretty() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(toml::from_str::<Config>(&text).unwrap(), config);
    }

    #[test]
    fn empty_file() {
        assert_eq!(toml::from_str::<Config>("").unwrap(), Config::default());
    }
}
