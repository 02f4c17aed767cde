//! Layered runtime settings.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. An optional config file (TOML unless the extension says otherwise)
//! 3. `ALARMWATCH_*` environment variables
//! 4. Command-line overrides
//!
//! ```toml
//! base_url = "http://backend.local:8000"
//! alarm_endpoint = "/api/event_result"
//! interval_ms = 5000
//! install_endpoint = "/api/install_state"
//! sync_interval_ms = 10000
//! timeout_ms = 10000
//! ```

use std::path::Path;
use std::time::Duration;

use alarmwatch_adapters::http::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use alarmwatch_engine::{
    DEFAULT_ALARM_ENDPOINT, DEFAULT_DETAIL_HINT, DEFAULT_INSTALL_ENDPOINT, DEFAULT_POLL_INTERVAL,
    DEFAULT_SYNC_INTERVAL, MIN_POLL_INTERVAL, MIN_SYNC_INTERVAL,
};
use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::warn;

/// Prefix for environment overrides, e.g. `ALARMWATCH_BASE_URL`.
pub const ENV_PREFIX: &str = "ALARMWATCH";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub base_url: String,
    pub alarm_endpoint: String,
    pub interval_ms: u64,
    pub install_endpoint: String,
    pub sync_interval_ms: u64,
    pub timeout_ms: u64,
    pub detail_hint: String,
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub alarm_endpoint: Option<String>,
    pub interval_ms: Option<u64>,
    pub install_endpoint: Option<String>,
    pub sync_interval_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
}

impl Settings {
    /// Load defaults, `path` (if any) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, Environment::with_prefix(ENV_PREFIX))
    }

    /// Like [`load`](Self::load) with an explicit environment source.
    pub fn load_from(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("alarm_endpoint", DEFAULT_ALARM_ENDPOINT)?
            .set_default("interval_ms", millis(DEFAULT_POLL_INTERVAL))?
            .set_default("install_endpoint", DEFAULT_INSTALL_ENDPOINT)?
            .set_default("sync_interval_ms", millis(DEFAULT_SYNC_INTERVAL))?
            .set_default("timeout_ms", millis(DEFAULT_TIMEOUT))?
            .set_default("detail_hint", DEFAULT_DETAIL_HINT)?;

        if let Some(path) = path {
            let file = if path.extension().is_some() {
                File::from(path)
            } else {
                File::from(path).format(FileFormat::Toml)
            };
            builder = builder.add_source(file);
        }

        let config = builder
            .add_source(env.try_parsing(true))
            .build()
            .with_context(|| match path {
                Some(p) => format!("Failed to load config from {}", p.display()),
                None => "Failed to load config".to_string(),
            })?;

        Ok(config.try_deserialize()?)
    }

    /// Apply command-line values on top.
    ///
    /// A poll interval under the 500ms floor is ignored and the value from
    /// the lower layers kept.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(v) = overrides.base_url {
            self.base_url = v;
        }
        if let Some(v) = overrides.alarm_endpoint {
            self.alarm_endpoint = v;
        }
        if let Some(v) = overrides.interval_ms {
            if Duration::from_millis(v) < MIN_POLL_INTERVAL {
                warn!(
                    "--interval-ms {} is below the {}ms floor, keeping {}ms",
                    v,
                    millis(MIN_POLL_INTERVAL),
                    self.interval_ms
                );
            } else {
                self.interval_ms = v;
            }
        }
        if let Some(v) = overrides.install_endpoint {
            self.install_endpoint = v;
        }
        if let Some(v) = overrides.sync_interval_ms {
            self.sync_interval_ms = v;
        }
        if let Some(v) = overrides.timeout_ms {
            self.timeout_ms = v;
        }
        self
    }

    /// Reject unusable values and bring intervals in line with the engine.
    ///
    /// A poll interval under 500ms that came from the file or environment
    /// falls back to the default; a sync interval under 2s is raised to 2s.
    pub fn validate(mut self) -> Result<Self> {
        if self.base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        if self.alarm_endpoint.trim().is_empty() || self.install_endpoint.trim().is_empty() {
            bail!("endpoints must not be empty");
        }
        if self.timeout_ms == 0 {
            bail!("timeout_ms must be greater than zero");
        }

        if self.interval() < MIN_POLL_INTERVAL {
            warn!(
                "interval_ms {} is below the {}ms floor, using {}ms",
                self.interval_ms,
                millis(MIN_POLL_INTERVAL),
                millis(DEFAULT_POLL_INTERVAL)
            );
            self.interval_ms = millis(DEFAULT_POLL_INTERVAL) as u64;
        }
        if self.sync_interval() < MIN_SYNC_INTERVAL {
            warn!(
                "sync_interval_ms {} is below the {}ms floor, using the floor",
                self.sync_interval_ms,
                millis(MIN_SYNC_INTERVAL)
            );
            self.sync_interval_ms = millis(MIN_SYNC_INTERVAL) as u64;
        }

        Ok(self)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn millis(d: Duration) -> i64 {
    d.as_millis() as i64
}
