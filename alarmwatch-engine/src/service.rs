//! The alarm polling service and its fetch-and-process cycle.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use alarmwatch_types::{parse_alarms, AlarmKey};

use crate::backend::Backend;
use crate::config::{PollConfig, PollOptions, DEBOUNCE_WINDOW, DEFAULT_DETAIL_HINT};
use crate::dedup::DedupCache;
use crate::sink::NotificationSink;

/// What a single poll cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The service is stopped; nothing was fetched.
    NotRunning,
    /// Another cycle began less than [`DEBOUNCE_WINDOW`] ago.
    Debounced,
    /// The request failed. The cycle was abandoned.
    FetchFailed,
    /// The service stopped (or restarted) while the request was in flight;
    /// the response was dropped.
    Discarded,
    /// The response was processed.
    Processed {
        /// Records in the response.
        fetched: usize,
        /// Records not seen before, each forwarded to the sink.
        surfaced: usize,
    },
}

/// Polls the alarm endpoint and surfaces each new alarm exactly once.
///
/// The service is cheap to clone; clones share one lifecycle. `start` and
/// `stop` are idempotent and may be called from any task: at most one
/// repeating timer exists at a time, and stopping clears the set of seen
/// alarms so a later session starts fresh.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use alarmwatch_engine::{ChannelSink, PollOptions, PollingService, ScriptedBackend};
///
/// # tokio_test::block_on(async {
/// let backend = Arc::new(ScriptedBackend::new());
/// backend.push_ok("/api/event_result", r#"[{"id": 1, "message": "door open"}]"#);
///
/// let (sink, mut alarms) = ChannelSink::create();
/// let service = PollingService::new(backend, Arc::new(sink));
///
/// service.start(PollOptions::new()).await;
/// assert!(service.is_running());
/// assert!(alarms.try_recv().unwrap().starts_with("door open"));
///
/// service.stop();
/// assert!(!service.is_running());
/// # });
/// ```
#[derive(Clone)]
pub struct PollingService {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn Backend>,
    sink: Arc<dyn NotificationSink>,
    detail_hint: String,
    state: Mutex<ServiceState>,
}

#[derive(Debug, Default)]
struct ServiceState {
    config: PollConfig,
    running: bool,
    /// Bumped on every start so work from an earlier session can be told apart.
    session: u64,
    seen: DedupCache,
    last_cycle: Option<Instant>,
    timer: Option<JoinHandle<()>>,
}

impl PollingService {
    /// Create a stopped service with the default configuration.
    pub fn new(backend: Arc<dyn Backend>, sink: Arc<dyn NotificationSink>) -> Self {
        Self::with_detail_hint(backend, sink, DEFAULT_DETAIL_HINT)
    }

    /// Like [`new`](Self::new), with a custom suffix for alarm messages.
    pub fn with_detail_hint(
        backend: Arc<dyn Backend>,
        sink: Arc<dyn NotificationSink>,
        detail_hint: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                sink,
                detail_hint: detail_hint.into(),
                state: Mutex::new(ServiceState::default()),
            }),
        }
    }

    /// Merge `options` into the configuration.
    ///
    /// Intervals below the floor are ignored. A new interval applies from
    /// the next scheduled tick. Returns `true` if anything changed.
    pub fn configure(&self, options: PollOptions) -> bool {
        self.inner.state.lock().config.merge(&options)
    }

    /// Start polling.
    ///
    /// Does nothing if already running. Otherwise applies `options`, runs one
    /// cycle immediately and then repeats it every configured interval.
    /// Errors in the immediate cycle are swallowed.
    pub async fn start(&self, options: PollOptions) {
        let session = {
            let mut state = self.inner.state.lock();
            if state.running {
                return;
            }
            state.config.merge(&options);
            state.running = true;
            state.session += 1;
            info!(
                "Alarm polling started: endpoint={}, interval={:?}",
                state.config.endpoint, state.config.interval
            );
            state.session
        };

        // Rolls the session back if this future is dropped mid-cycle
        let _guard = StartGuard {
            inner: &self.inner,
            session,
        };

        let outcome = self.inner.run_cycle().await;
        debug!("Initial alarm cycle: {:?}", outcome);

        // Stopped (or stopped and restarted) while the first cycle ran
        let mut state = self.inner.state.lock();
        if state.running && state.session == session && state.timer.is_none() {
            state.timer = Some(spawn_timer(Arc::downgrade(&self.inner), session));
        }
    }

    /// Stop polling, cancel the timer and forget every seen alarm.
    ///
    /// Safe to call when already stopped. A request still in flight is not
    /// aborted but its response will be discarded.
    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        if state.running {
            info!("Alarm polling stopped");
        }
        state.running = false;
        state.seen.clear();
        state.last_cycle = None;
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running
    }

    /// Run one cycle now, outside the timer.
    ///
    /// Subject to the same debounce guard as scheduled cycles.
    pub async fn poll_now(&self) -> CycleOutcome {
        self.inner.run_cycle().await
    }

    /// Forget every seen alarm without changing the run state.
    pub fn clear_history(&self) {
        self.inner.state.lock().seen.clear();
    }

    /// The current effective configuration.
    pub fn config(&self) -> PollConfig {
        self.inner.state.lock().config.clone()
    }

    /// Number of alarm keys currently remembered.
    pub fn seen_count(&self) -> usize {
        self.inner.state.lock().seen.len()
    }
}

impl Inner {
    async fn run_cycle(&self) -> CycleOutcome {
        let (endpoint, session) = {
            let mut state = self.state.lock();
            if !state.running {
                return CycleOutcome::NotRunning;
            }

            let now = Instant::now();
            if let Some(last) = state.last_cycle {
                if now.duration_since(last) < DEBOUNCE_WINDOW {
                    debug!("Skipping alarm cycle: previous one started {:?} ago", now - last);
                    return CycleOutcome::Debounced;
                }
            }
            state.last_cycle = Some(now);
            (state.config.endpoint.clone(), state.session)
        };

        let body = match self.backend.get(&endpoint).await {
            Ok(body) => body,
            Err(e) => {
                debug!("Alarm fetch from {} failed: {}", endpoint, e);
                return CycleOutcome::FetchFailed;
            }
        };
        let alarms = parse_alarms(&body);

        let fresh = {
            let mut state = self.state.lock();
            if !state.running || state.session != session {
                debug!("Discarding alarm response that arrived after stop");
                return CycleOutcome::Discarded;
            }

            let fresh: Vec<String> = alarms
                .iter()
                .filter(|record| state.seen.insert(AlarmKey::derive(record)))
                .map(|record| record.render(&self.detail_hint))
                .collect();

            let evicted = state.seen.prune();
            if evicted > 0 {
                debug!("Pruned {} old alarm keys, {} remain", evicted, state.seen.len());
            }
            fresh
        };

        // Sinks may call back into the service, so the lock is released first
        for text in &fresh {
            self.sink.notify(text);
        }

        CycleOutcome::Processed {
            fetched: alarms.len(),
            surfaced: fresh.len(),
        }
    }
}

/// Undoes a `start` whose future was dropped before its timer was installed.
/// Declared before the state guard in `start` so it drops after it.
struct StartGuard<'a> {
    inner: &'a Inner,
    session: u64,
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        if state.running && state.session == self.session && state.timer.is_none() {
            debug!("Alarm polling start was cancelled, rolling back");
            state.running = false;
            state.seen.clear();
            state.last_cycle = None;
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(timer) = self.state.get_mut().timer.take() {
            timer.abort();
        }
    }
}

// The task only holds a weak reference so dropping the last service handle
// ends it.
fn spawn_timer(inner: Weak<Inner>, session: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let interval = {
                let Some(inner) = inner.upgrade() else { break };
                let state = inner.state.lock();
                if !state.running || state.session != session {
                    break;
                }
                state.config.interval
            };

            tokio::time::sleep(interval).await;

            let Some(inner) = inner.upgrade() else { break };
            let outcome = inner.run_cycle().await;
            debug!("Scheduled alarm cycle: {:?}", outcome);
        }
    })
}

impl std::fmt::Debug for PollingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("PollingService")
            .field("config", &state.config)
            .field("running", &state.running)
            .field("seen", &state.seen.len())
            .finish()
    }
}
