//! Client configuration: `tracker.ron`, then environment and flag overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tracker_core::TrackerSettings;
use tracker_engine::ClientSettings;

use super::logging::LogDestination;

pub const DEFAULT_CONFIG_FILE: &str = "tracker.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub base_url: String,
    pub api_prefix: String,
    pub poll_interval_secs: u64,
    pub keyword_refresh_secs: u64,
    pub result_count: u32,
    pub history_limit: u32,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub log_level: String,
    pub log_destination: LogDestination,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        let tracker = TrackerSettings::default();
        Self {
            base_url: client.base_url,
            api_prefix: client.api_prefix,
            poll_interval_secs: client.poll_interval.as_secs(),
            keyword_refresh_secs: tracker.keyword_refresh_interval.as_secs(),
            result_count: client.result_count,
            history_limit: client.history_limit,
            connect_timeout_secs: client.connect_timeout.as_secs(),
            request_timeout_secs: client.request_timeout.as_secs(),
            log_level: "info".to_string(),
            log_destination: LogDestination::default(),
        }
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub result_count: Option<u32>,
}

impl TrackerConfig {
    /// Loads `explicit` if given (it must exist), else `./tracker.ron` when
    /// present, else defaults. Also returns the file that was read, if any.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|path| path.is_file()),
        };
        match path {
            Some(path) => Ok((Self::from_file(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        ron::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn apply(mut self, overrides: &Overrides) -> Self {
        if let Some(base_url) = &overrides.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(secs) = overrides.poll_interval_secs {
            self.poll_interval_secs = secs;
        }
        if let Some(count) = overrides.result_count {
            self.result_count = count;
        }
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be at least 1");
        }
        if self.result_count == 0 {
            bail!("result_count must be at least 1");
        }
        if tracker_logging::parse_level(&self.log_level).is_none() {
            bail!("unknown log_level {:?}", self.log_level);
        }
        Ok(())
    }

    pub fn log_level(&self) -> log::LevelFilter {
        tracker_logging::parse_level(&self.log_level).unwrap_or(log::LevelFilter::Info)
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            api_prefix: self.api_prefix.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            result_count: self.result_count,
            history_limit: self.history_limit,
        }
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            keyword_refresh_interval: Duration::from_secs(self.keyword_refresh_secs),
            ..TrackerSettings::default()
        }
    }
}
