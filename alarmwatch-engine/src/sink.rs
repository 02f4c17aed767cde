//! Notification sinks: where newly surfaced alarms go.

use std::fmt::Debug;
use std::sync::Arc;

use tokio::sync::mpsc;

/// Receives one call per newly surfaced alarm.
///
/// Calls are never batched. The [`PollingService`](crate::PollingService)
/// releases its state lock before notifying, so a sink may call back into it
/// (for example to `stop()` after a critical alarm).
pub trait NotificationSink: Send + Sync + Debug {
    /// Display one warning-level, user-dismissible notification.
    fn notify(&self, text: &str);
}

impl<S: NotificationSink + ?Sized> NotificationSink for Arc<S> {
    fn notify(&self, text: &str) {
        (**self).notify(text)
    }
}

/// Forward notifications through an unbounded channel.
///
/// Useful for handing alarms to another task (a UI loop, a test).
///
/// # Example
///
/// ```rust
/// use alarmwatch_engine::{ChannelSink, NotificationSink};
///
/// let (sink, mut rx) = ChannelSink::create();
/// sink.notify("door open");
/// assert_eq!(rx.try_recv().unwrap(), "door open");
/// ```
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }

    /// Create a sink together with the receiving end.
    pub fn create() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, text: &str) {
        // Receiver gone means nobody is listening any more
        let _ = self.tx.send(text.to_string());
    }
}

/// Emit each notification as a `WARN` tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, text: &str) {
        tracing::warn!(target: "alarmwatch::alarm", "{}", text);
    }
}
