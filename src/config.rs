use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "session-timer";

/// Ticks faster than this only burn CPU
const MIN_TICK_INTERVAL_MS: u64 = 50;

/// User configuration, read from `<config dir>/session-timer/config.json`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Record file; relative paths resolve against the working directory
    #[serde(default = "default_record_file")]
    pub record_file: PathBuf,

    /// How often the elapsed time display refreshes
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default = "default_log_file")]
    pub log_file: Option<PathBuf>,
}

fn default_record_file() -> PathBuf {
    PathBuf::from("record.txt")
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_log_file() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(APP_DIR).join("session-timer.log"))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            record_file: default_record_file(),
            tick_interval_ms: default_tick_interval_ms(),
            log_file: default_log_file(),
        }
    }
}

impl AppConfig {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json"))
    }

    /// Load from the default location, falling back to defaults.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(MIN_TICK_INTERVAL_MS))
    }
}
