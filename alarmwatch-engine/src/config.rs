//! Polling configuration and its validation rules.

use std::time::Duration;

/// Default alarm/event endpoint.
pub const DEFAULT_ALARM_ENDPOINT: &str = "/api/event_result";

/// Default time between alarm polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Smallest accepted alarm poll interval. Shorter values are ignored.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A cycle started within this window of the previous one is skipped.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

/// Default install-state endpoint.
pub const DEFAULT_INSTALL_ENDPOINT: &str = "/api/install_state";

/// Default time between install-state checks.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_millis(10_000);

/// Smallest install-state interval. Shorter values are raised to this.
pub const MIN_SYNC_INTERVAL: Duration = Duration::from_millis(2000);

/// Suffix appended to alarm messages in notifications.
pub const DEFAULT_DETAIL_HINT: &str = " See the event trigger tasks for details.";

/// Effective alarm polling configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub endpoint: String,
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ALARM_ENDPOINT.to_string(),
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollConfig {
    /// Merge the fields present in `options`.
    ///
    /// An interval below [`MIN_POLL_INTERVAL`] is dropped and the previous
    /// interval kept. Returns `true` if anything changed.
    pub fn merge(&mut self, options: &PollOptions) -> bool {
        let mut changed = false;

        if let Some(endpoint) = &options.endpoint {
            if *endpoint != self.endpoint {
                self.endpoint = endpoint.clone();
                changed = true;
            }
        }

        if let Some(interval) = options.interval {
            if interval < MIN_POLL_INTERVAL {
                tracing::debug!(
                    "Ignoring poll interval {:?} below floor {:?}",
                    interval,
                    MIN_POLL_INTERVAL
                );
            } else if interval != self.interval {
                self.interval = interval;
                changed = true;
            }
        }

        changed
    }
}

/// Partial configuration accepted by `configure` and `start`.
///
/// # Example
///
/// ```rust
/// use alarmwatch_engine::PollOptions;
/// use std::time::Duration;
///
/// let opts = PollOptions::new()
///     .endpoint("/api/event_result")
///     .interval(Duration::from_secs(5));
/// assert!(opts.endpoint.is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollOptions {
    pub endpoint: Option<String>,
    pub interval: Option<Duration>,
}

impl PollOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Convenience for callers that think in milliseconds.
    pub fn interval_ms(self, ms: u64) -> Self {
        self.interval(Duration::from_millis(ms))
    }
}
