//! Periodic install-state synchronisation.

use std::sync::Arc;
use std::time::Duration;

use alarmwatch_types::{InstallStateResponse, InstallStatus};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::backend::{Backend, BackendError};
use crate::config::{DEFAULT_INSTALL_ENDPOINT, DEFAULT_SYNC_INTERVAL, MIN_SYNC_INTERVAL};
use crate::status::StatusWatch;

/// Result of one install-state check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The backend reported a status different from the cached one, which
    /// was updated.
    Changed(InstallStatus),
    /// The backend confirmed the cached status.
    Unchanged(InstallStatus),
    /// The response carried no recognised signal.
    Unrecognised,
    /// The request failed.
    Failed,
}

/// Polls the install-state endpoint and mirrors the result into a
/// [`StatusWatch`].
///
/// Only recognised signals change the status; failures and unknown values
/// keep the last known good one.
#[derive(Debug, Clone)]
pub struct InstallStateSync {
    backend: Arc<dyn Backend>,
    status: StatusWatch,
    endpoint: String,
    interval: Duration,
}

impl InstallStateSync {
    pub fn new(backend: Arc<dyn Backend>, status: StatusWatch) -> Self {
        Self {
            backend,
            status,
            endpoint: DEFAULT_INSTALL_ENDPOINT.to_string(),
            interval: DEFAULT_SYNC_INTERVAL,
        }
    }

    /// Set the install-state endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the check interval. Values below the 2 second floor are raised
    /// to it.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_SYNC_INTERVAL);
        self
    }

    pub fn interval_duration(&self) -> Duration {
        self.interval
    }

    pub fn endpoint_path(&self) -> &str {
        &self.endpoint
    }

    pub fn status(&self) -> &StatusWatch {
        &self.status
    }

    /// Ask the backend for its install status without touching the cache.
    ///
    /// Returns `Ok(None)` for a response without a recognised signal.
    pub async fn fetch_status(&self) -> Result<Option<InstallStatus>, BackendError> {
        let body = self.backend.get(&self.endpoint).await?;
        Ok(InstallStateResponse::parse(&body).and_then(|r| r.install_status()))
    }

    /// Run one check and apply the result to the status.
    pub async fn check_once(&self) -> SyncOutcome {
        match self.fetch_status().await {
            Ok(Some(reported)) => {
                if self.status.set(reported) {
                    info!("Install state changed to {}", reported);
                    SyncOutcome::Changed(reported)
                } else {
                    SyncOutcome::Unchanged(reported)
                }
            }
            Ok(None) => SyncOutcome::Unrecognised,
            Err(e) => {
                debug!("Install-state fetch from {} failed: {}", self.endpoint, e);
                SyncOutcome::Failed
            }
        }
    }

    /// Run [`check_once`](Self::check_once) every interval in a background
    /// task. The first check happens one interval from now.
    pub fn spawn(self) -> SyncHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let period = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let outcome = self.check_once().await;
                        debug!("Install-state check: {:?}", outcome);
                    }
                    res = stop_rx.changed() => {
                        // A dropped handle counts as a stop request
                        if res.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        SyncHandle { stop_tx, task }
    }
}

/// Handle for the background install-state loop.
///
/// Dropping the handle also ends the loop, without waiting for it.
#[derive(Debug)]
pub struct SyncHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Stop the loop and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ScriptedBackend;

    const EP: &str = DEFAULT_INSTALL_ENDPOINT;

    fn setup(initial: InstallStatus) -> (Arc<ScriptedBackend>, InstallStateSync) {
        let backend = Arc::new(ScriptedBackend::new());
        let sync = InstallStateSync::new(backend.clone(), StatusWatch::new(initial));
        (backend, sync)
    }

    #[tokio::test]
    async fn test_install_signal_transitions() {
        let (backend, sync) = setup(InstallStatus::Uninstall);
        backend.push_ok(EP, r#"{"state":"install"}"#);

        assert_eq!(sync.check_once().await, SyncOutcome::Changed(InstallStatus::Install));
        assert_eq!(sync.status().get(), InstallStatus::Install);

        // Same signal again is not a transition
        assert_eq!(sync.check_once().await, SyncOutcome::Unchanged(InstallStatus::Install));
    }

    #[tokio::test]
    async fn test_status_field_accepted() {
        let (backend, sync) = setup(InstallStatus::Install);
        backend.push_ok(EP, r#"{"status":"uninstall"}"#);

        assert_eq!(sync.check_once().await, SyncOutcome::Changed(InstallStatus::Uninstall));
        assert_eq!(sync.status().get(), InstallStatus::Uninstall);
    }

    #[tokio::test]
    async fn test_unknown_signal_keeps_last_known_good() {
        let (backend, sync) = setup(InstallStatus::Install);
        backend.push_ok(EP, r#"{"state":"installing"}"#);
        backend.push_ok(EP, "garbage");

        assert_eq!(sync.check_once().await, SyncOutcome::Unrecognised);
        assert_eq!(sync.check_once().await, SyncOutcome::Unrecognised);
        assert_eq!(sync.status().get(), InstallStatus::Install);
    }

    #[tokio::test]
    async fn test_failure_keeps_last_known_good() {
        let (backend, sync) = setup(InstallStatus::Install);
        backend.push_err(EP, "timeout");

        assert_eq!(sync.check_once().await, SyncOutcome::Failed);
        assert_eq!(sync.status().get(), InstallStatus::Install);
    }

    #[test]
    fn test_interval_floor() {
        let (_backend, sync) = setup(InstallStatus::Uninstall);
        assert_eq!(sync.interval_duration(), DEFAULT_SYNC_INTERVAL);

        let sync = sync.interval(Duration::from_millis(100));
        assert_eq!(sync.interval_duration(), MIN_SYNC_INTERVAL);

        let sync = sync.interval(Duration::from_secs(30));
        assert_eq!(sync.interval_duration(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_loop_ticks_each_interval() {
        let (backend, sync) = setup(InstallStatus::Uninstall);
        backend.push_ok(EP, r#"{"state":"uninstall"}"#);
        backend.push_ok(EP, r#"{"state":"install"}"#);
        let status = sync.status().clone();

        let handle = sync.interval(Duration::from_secs(10)).spawn();

        tokio::time::sleep(Duration::from_millis(9_900)).await;
        assert_eq!(backend.calls(EP), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(backend.calls(EP), 1);
        assert_eq!(status.get(), InstallStatus::Uninstall);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.calls(EP), 2);
        assert_eq!(status.get(), InstallStatus::Install);

        handle.stop().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.calls(EP), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_ends_loop() {
        let (backend, sync) = setup(InstallStatus::Uninstall);
        backend.push_ok(EP, r#"{"state":"install"}"#);

        let handle = sync.interval(Duration::from_secs(2)).spawn();
        // The loop owns a reference to the backend while it runs
        assert_eq!(Arc::strong_count(&backend), 2);

        drop(handle);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(Arc::strong_count(&backend), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.calls(EP), 0);
    }
}
