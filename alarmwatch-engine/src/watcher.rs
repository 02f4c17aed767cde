//! Wiring between the install-state sync and the alarm polling service.
//!
//! [`AlarmWatch`] owns one [`PollingService`], one [`StatusWatch`] and one
//! [`InstallStateSync`]. Starting it performs the boot-time install check,
//! subscribes an observer that turns status transitions into `start` and
//! `stop` calls, and spawns the periodic install-state loop.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use alarmwatch_types::InstallStatus;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::backend::Backend;
use crate::config::{PollOptions, DEFAULT_DETAIL_HINT};
use crate::service::PollingService;
use crate::sink::NotificationSink;
use crate::status::{StatusSubscription, StatusWatch};
use crate::sync::{InstallStateSync, SyncHandle};

/// Hook run whenever the backend reports the client as uninstalled.
///
/// Implementations clear whatever local client state should not survive an
/// uninstall (cached credentials, UI state and so on).
pub trait ClientStateReset: Send + Sync + fmt::Debug {
    fn reset(&self);
}

impl<R: ClientStateReset + ?Sized> ClientStateReset for Arc<R> {
    fn reset(&self) {
        (**self).reset()
    }
}

/// A reset that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReset;

impl ClientStateReset for NoopReset {
    fn reset(&self) {}
}

/// The assembled polling engine.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use alarmwatch_engine::{AlarmWatch, ChannelSink, ScriptedBackend};
///
/// # tokio_test::block_on(async {
/// let backend = Arc::new(ScriptedBackend::new());
/// backend.push_ok("/api/install_state", r#"{"state": "install"}"#);
/// backend.push_ok("/api/event_result", r#"[{"id": "a", "message": "disk full"}]"#);
///
/// let (sink, mut alarms) = ChannelSink::create();
/// let watch = AlarmWatch::builder(backend, Arc::new(sink)).build();
///
/// let handle = watch.start().await;
/// assert!(handle.service().is_running());
/// assert!(alarms.try_recv().is_ok());
///
/// handle.stop().await;
/// # });
/// ```
#[derive(Debug)]
pub struct AlarmWatch {
    service: PollingService,
    status: StatusWatch,
    sync: InstallStateSync,
    reset: Arc<dyn ClientStateReset>,
}

impl AlarmWatch {
    pub fn builder(
        backend: Arc<dyn Backend>,
        sink: Arc<dyn NotificationSink>,
    ) -> AlarmWatchBuilder {
        AlarmWatchBuilder::new(backend, sink)
    }

    pub fn service(&self) -> &PollingService {
        &self.service
    }

    pub fn status(&self) -> &StatusWatch {
        &self.status
    }

    /// One install-state check, applied directly to the service.
    ///
    /// `install` starts polling; `uninstall` stops it and runs the client
    /// reset. A failed or unrecognised check leaves everything as it is and
    /// returns `None`.
    pub async fn boot(&self) -> Option<InstallStatus> {
        let reported = match self.sync.fetch_status().await {
            Ok(Some(status)) => status,
            Ok(None) => {
                debug!("Boot install check returned no recognised state");
                return None;
            }
            Err(e) => {
                debug!("Boot install check failed, polling stays off: {}", e);
                return None;
            }
        };

        info!("Boot install check: {}", reported);
        self.status.set(reported);
        match reported {
            InstallStatus::Install => self.service.start(PollOptions::new()).await,
            InstallStatus::Uninstall => {
                self.service.stop();
                self.reset.reset();
            }
        }
        Some(reported)
    }

    /// Run the boot check, then follow install-state transitions until the
    /// returned handle is stopped.
    pub async fn start(self) -> WatchHandle {
        self.boot().await;

        // Subscribed after boot so the boot transition is not replayed
        let subscription = self.status.subscribe();
        let observer = tokio::spawn(observe(
            subscription,
            self.service.clone(),
            self.reset.clone(),
        ));
        let sync = self.sync.spawn();

        WatchHandle {
            service: self.service,
            status: self.status,
            sync,
            observer,
        }
    }
}

async fn observe(
    mut subscription: StatusSubscription,
    service: PollingService,
    reset: Arc<dyn ClientStateReset>,
) {
    while let Some(status) = subscription.changed().await {
        match status {
            InstallStatus::Install => service.start(PollOptions::new()).await,
            InstallStatus::Uninstall => {
                service.stop();
                reset.reset();
            }
        }
    }
}

/// Builder for [`AlarmWatch`].
#[derive(Debug)]
pub struct AlarmWatchBuilder {
    backend: Arc<dyn Backend>,
    sink: Arc<dyn NotificationSink>,
    poll: PollOptions,
    install_endpoint: Option<String>,
    sync_interval: Option<Duration>,
    detail_hint: Option<String>,
    status: Option<StatusWatch>,
    reset: Option<Arc<dyn ClientStateReset>>,
}

impl AlarmWatchBuilder {
    fn new(backend: Arc<dyn Backend>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            backend,
            sink,
            poll: PollOptions::new(),
            install_endpoint: None,
            sync_interval: None,
            detail_hint: None,
            status: None,
            reset: None,
        }
    }

    /// Alarm endpoint (default `/api/event_result`).
    pub fn alarm_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.poll = self.poll.endpoint(endpoint);
        self
    }

    /// Alarm poll interval (default 5s, values under 500ms are ignored).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll = self.poll.interval(interval);
        self
    }

    /// Install-state endpoint (default `/api/install_state`).
    pub fn install_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.install_endpoint = Some(endpoint.into());
        self
    }

    /// Install-state interval (default 10s, raised to at least 2s).
    pub fn sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = Some(interval);
        self
    }

    /// Suffix appended to alarm messages.
    pub fn detail_hint(mut self, hint: impl Into<String>) -> Self {
        self.detail_hint = Some(hint.into());
        self
    }

    /// Share an existing status value instead of creating one.
    pub fn status(mut self, status: StatusWatch) -> Self {
        self.status = Some(status);
        self
    }

    /// Hook run on every uninstall.
    pub fn reset(mut self, reset: Arc<dyn ClientStateReset>) -> Self {
        self.reset = Some(reset);
        self
    }

    pub fn build(self) -> AlarmWatch {
        let service = PollingService::with_detail_hint(
            self.backend.clone(),
            self.sink,
            self.detail_hint
                .unwrap_or_else(|| DEFAULT_DETAIL_HINT.to_string()),
        );
        service.configure(self.poll);

        let status = self.status.unwrap_or_default();

        let mut sync = InstallStateSync::new(self.backend, status.clone());
        if let Some(endpoint) = self.install_endpoint {
            sync = sync.endpoint(endpoint);
        }
        if let Some(interval) = self.sync_interval {
            sync = sync.interval(interval);
        }

        AlarmWatch {
            service,
            status,
            sync,
            reset: self.reset.unwrap_or_else(|| Arc::new(NoopReset)),
        }
    }
}

/// A running [`AlarmWatch`].
#[derive(Debug)]
pub struct WatchHandle {
    service: PollingService,
    status: StatusWatch,
    sync: SyncHandle,
    observer: JoinHandle<()>,
}

impl WatchHandle {
    pub fn service(&self) -> &PollingService {
        &self.service
    }

    pub fn status(&self) -> &StatusWatch {
        &self.status
    }

    /// Stop the install-state loop, the observer and alarm polling.
    pub async fn stop(self) {
        self.sync.stop().await;
        self.observer.abort();
        self.service.stop();
    }
}
