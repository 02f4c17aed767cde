//! # alarmwatch-engine
//!
//! Polling and notification engine for an installation/alarm backend.
//!
//! The engine keeps a client in step with a remote backend:
//!
//! - [`InstallStateSync`] periodically asks the backend whether this client
//!   is installed and mirrors the answer into a [`StatusWatch`].
//! - [`PollingService`] fetches alarm records while installed, and forwards
//!   each alarm it has not seen before to a [`NotificationSink`].
//! - [`AlarmWatch`] wires the two together: install starts polling,
//!   uninstall stops it and clears the seen alarms.
//!
//! The engine never speaks HTTP itself. It talks to a [`Backend`], which the
//! `alarmwatch-adapters` crate implements over reqwest.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use alarmwatch_engine::{AlarmWatch, Backend, TracingSink};
//!
//! async fn run(backend: Arc<dyn Backend>) {
//!     let watch = AlarmWatch::builder(backend, Arc::new(TracingSink))
//!         .poll_interval(Duration::from_secs(5))
//!         .sync_interval(Duration::from_secs(10))
//!         .build();
//!
//!     // Boot check, then follow install/uninstall transitions
//!     let handle = watch.start().await;
//!
//!     // ... application runs ...
//!
//!     handle.stop().await;
//! }
//! ```
//!
//! ## Guarantees
//!
//! - `start` and `stop` are idempotent; at most one alarm timer exists.
//! - Each logical alarm reaches the sink once per running session.
//! - Cycles starting within 200ms of each other are collapsed.
//! - Network and parse failures only abort the current cycle.

mod backend;
mod config;
mod dedup;
mod service;
mod sink;
mod status;
mod sync;
mod watcher;

pub use backend::{Backend, BackendError, ScriptedBackend};
pub use config::{
    PollConfig, PollOptions, DEBOUNCE_WINDOW, DEFAULT_ALARM_ENDPOINT, DEFAULT_DETAIL_HINT,
    DEFAULT_INSTALL_ENDPOINT, DEFAULT_POLL_INTERVAL, DEFAULT_SYNC_INTERVAL, MIN_POLL_INTERVAL,
    MIN_SYNC_INTERVAL,
};
pub use dedup::{DedupCache, HIGH_WATER_MARK, RETAIN_AFTER_PRUNE};
pub use service::{CycleOutcome, PollingService};
pub use sink::{ChannelSink, NotificationSink, TracingSink};
pub use status::{StatusSubscription, StatusWatch};
pub use sync::{InstallStateSync, SyncHandle, SyncOutcome};
pub use watcher::{AlarmWatch, AlarmWatchBuilder, ClientStateReset, NoopReset, WatchHandle};

// Re-export types for convenience
pub use alarmwatch_types::{AlarmKey, AlarmRecord, InstallStatus};
