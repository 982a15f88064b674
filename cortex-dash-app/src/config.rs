//! `cortex-dash.yaml` loading, env overrides and validation.

use cortex_dash_core::{DashboardConfig, GaugeThresholds, ReconcilerConfig};
use cortex_dash_transport::BackoffPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "cortex-dash.yaml";
pub const DEFAULT_URL: &str = "ws://127.0.0.1:8000/ws/chat";

pub const CONFIG_PATH_ENV: &str = "CORTEX_DASH_CONFIG";
pub const URL_ENV: &str = "CORTEX_DASH_URL";
pub const LOG_ENV: &str = "CORTEX_DASH_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub url: String,
    pub log_level: String,
    pub backoff: BackoffConfig,
    pub countdown: CountdownConfig,
    pub logs: LogsConfig,
    pub gauges: GaugesConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub base_ms: u64,
    pub cap_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownConfig {
    pub resync_tolerance_secs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    pub max_entries: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaugesConfig {
    pub equity: GaugeThresholds,
    pub prosperity: GaugeThresholds,
    pub load: GaugeThresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            log_level: "info".to_string(),
            backoff: BackoffConfig::default(),
            countdown: CountdownConfig::default(),
            logs: LogsConfig::default(),
            gauges: GaugesConfig::default(),
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        let policy = BackoffPolicy::default();
        Self {
            base_ms: policy.base.as_millis() as u64,
            cap_ms: policy.cap.as_millis() as u64,
        }
    }
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            resync_tolerance_secs: ReconcilerConfig::default().resync_tolerance_secs,
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            max_entries: cortex_dash_core::log::DEFAULT_MAX_ENTRIES,
        }
    }
}

impl Default for GaugesConfig {
    fn default() -> Self {
        let dashboard = DashboardConfig::default();
        Self {
            equity: dashboard.equity,
            prosperity: dashboard.prosperity,
            load: dashboard.load,
        }
    }
}

impl Config {
    /// Load a config file that must exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Load an explicitly requested file, or `cortex-dash.yaml` in the working
    /// directory when present, or fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup; empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.url = url.trim().to_string();
        }
        if let Some(level) = lookup(LOG_ENV).filter(|v| !v.trim().is_empty()) {
            self.log_level = level.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint()?;

        if self.backoff.base_ms == 0 {
            return Err(ConfigError::Invalid(
                "backoff.base_ms must be greater than zero".to_string(),
            ));
        }
        if self.backoff.cap_ms < self.backoff.base_ms {
            return Err(ConfigError::Invalid(format!(
                "backoff.cap_ms ({}) is below backoff.base_ms ({})",
                self.backoff.cap_ms, self.backoff.base_ms
            )));
        }
        if self.logs.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "logs.max_entries must be greater than zero".to_string(),
            ));
        }

        for (name, thresholds) in [
            ("equity", &self.gauges.equity),
            ("prosperity", &self.gauges.prosperity),
            ("load", &self.gauges.load),
        ] {
            thresholds
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("gauges.{}: {}", name, e)))?;
        }

        Ok(())
    }

    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.url)
            .map_err(|e| ConfigError::Invalid(format!("url '{}': {}", self.url, e)))?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(ConfigError::Invalid(format!(
                "url must use ws:// or wss://, got '{}'",
                other
            ))),
        }
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            base: Duration::from_millis(self.backoff.base_ms),
            cap: Duration::from_millis(self.backoff.cap_ms),
        }
    }

    pub fn dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            reconciler: ReconcilerConfig {
                resync_tolerance_secs: self.countdown.resync_tolerance_secs,
            },
            max_log_entries: self.logs.max_entries,
            equity: self.gauges.equity,
            prosperity: self.gauges.prosperity,
            load: self.gauges.load,
        }
    }
}
