/// Application configuration management
/// Stores poll intervals and preferences in ~/.config/hostwatch/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::MetricClass;
use crate::utils::constants::*;

/// What a sub-display does after one of its polls fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Re-arm the failed class at its normal interval
    #[default]
    Retry,
    /// Record the error and stop polling that class until restart
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Intervals {
    #[serde(with = "duration_str")]
    pub cpu: Duration,
    #[serde(with = "duration_str")]
    pub memory: Duration,
    #[serde(with = "duration_str")]
    pub swap: Duration,
    #[serde(with = "duration_str")]
    pub disk: Duration,
    #[serde(with = "duration_str")]
    pub containers: Duration,
    #[serde(with = "duration_str")]
    pub container_stats: Duration,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            cpu: CPU_INTERVAL,
            memory: MEMORY_INTERVAL,
            swap: SWAP_INTERVAL,
            disk: DISK_INTERVAL,
            containers: CONTAINERS_INTERVAL,
            container_stats: CONTAINER_STATS_INTERVAL,
        }
    }
}

impl Intervals {
    pub fn for_class(&self, class: MetricClass) -> Duration {
        match class {
            MetricClass::Cpu => self.cpu,
            MetricClass::Memory => self.memory,
            MetricClass::Swap => self.swap,
            MetricClass::Disk => self.disk,
            MetricClass::Containers => self.containers,
            MetricClass::ContainerStats => self.container_stats,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    #[serde(with = "duration_str")]
    pub containers: Duration,
    #[serde(with = "duration_str")]
    pub container_stats: Duration,
    /// Deadline for OS metric calls; unbounded when unset
    #[serde(with = "opt_duration_str", skip_serializing_if = "Option::is_none")]
    pub system: Option<Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            containers: CONTAINERS_TIMEOUT,
            container_stats: CONTAINER_STATS_TIMEOUT,
            system: None,
        }
    }
}

impl Timeouts {
    pub fn for_class(&self, class: MetricClass) -> Option<Duration> {
        match class {
            MetricClass::Containers => Some(self.containers),
            MetricClass::ContainerStats => Some(self.container_stats),
            _ => self.system,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub on_failure: FailurePolicy,
    pub disk_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    pub intervals: Intervals,
    pub timeouts: Timeouts,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            on_failure: FailurePolicy::default(),
            disk_path: PathBuf::from(DEFAULT_DISK_PATH),
            log_file: None,
            intervals: Intervals::default(),
            timeouts: Timeouts::default(),
        }
    }
}

impl AppConfig {
    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine the user config directory")?
            .join(APP_NAME);

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, falling back to defaults when absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to file, creating the parent directory
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Where dashboard runs write their log
    pub fn log_path(&self) -> PathBuf {
        if let Some(path) = &self.log_file {
            return path.clone();
        }

        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_NAME)
            .join(format!("{}.log", APP_NAME))
    }
}

/// Durations as humantime strings ("800ms", "2s")
mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

mod opt_duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => super::duration_str::serialize(duration, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
