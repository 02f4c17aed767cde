//! Observable install status.

use std::sync::Arc;

use alarmwatch_types::InstallStatus;
use tokio::sync::watch;

/// The process-wide install status, observable by subscribers.
///
/// Subscribers are only woken by actual transitions: setting the value it
/// already has is a no-op, and a fresh subscription does not report the
/// current value as a change.
///
/// # Example
///
/// ```rust
/// use alarmwatch_engine::StatusWatch;
/// use alarmwatch_types::InstallStatus;
///
/// # tokio_test::block_on(async {
/// let status = StatusWatch::new(InstallStatus::Uninstall);
/// let mut sub = status.subscribe();
///
/// assert!(!status.set(InstallStatus::Uninstall)); // unchanged
/// assert!(status.set(InstallStatus::Install));
/// assert_eq!(sub.changed().await, Some(InstallStatus::Install));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct StatusWatch {
    tx: Arc<watch::Sender<InstallStatus>>,
}

impl Default for StatusWatch {
    fn default() -> Self {
        Self::new(InstallStatus::default())
    }
}

impl StatusWatch {
    pub fn new(initial: InstallStatus) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn get(&self) -> InstallStatus {
        *self.tx.borrow()
    }

    /// Set the status. Returns `true` (and notifies subscribers) only if
    /// the value changed.
    pub fn set(&self, status: InstallStatus) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        })
    }

    /// Subscribe to future transitions. Drop the subscription to unsubscribe.
    pub fn subscribe(&self) -> StatusSubscription {
        StatusSubscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A subscription to [`StatusWatch`] transitions.
///
/// Transitions that happen faster than the subscriber reads them are
/// coalesced: `changed` reports the latest value.
#[derive(Debug)]
pub struct StatusSubscription {
    rx: watch::Receiver<InstallStatus>,
}

impl StatusSubscription {
    /// Wait for the next transition.
    ///
    /// Returns `None` once every [`StatusWatch`] handle has been dropped.
    pub async fn changed(&mut self) -> Option<InstallStatus> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    pub fn current(&self) -> InstallStatus {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_set_reports_change() {
        let status = StatusWatch::default();
        assert_eq!(status.get(), InstallStatus::Uninstall);

        assert!(!status.set(InstallStatus::Uninstall));
        assert!(status.set(InstallStatus::Install));
        assert!(!status.set(InstallStatus::Install));
        assert_eq!(status.get(), InstallStatus::Install);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_does_not_fire_initially() {
        let status = StatusWatch::new(InstallStatus::Install);
        let mut sub = status.subscribe();
        assert_eq!(sub.current(), InstallStatus::Install);

        let fired = tokio::time::timeout(Duration::from_secs(1), sub.changed()).await;
        assert!(fired.is_err(), "subscription must not fire without a transition");
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_value_does_not_notify() {
        let status = StatusWatch::new(InstallStatus::Install);
        let mut sub = status.subscribe();

        status.set(InstallStatus::Install);
        let fired = tokio::time::timeout(Duration::from_secs(1), sub.changed()).await;
        assert!(fired.is_err());
    }

    #[tokio::test]
    async fn test_transitions_are_observed() {
        let status = StatusWatch::default();
        let mut sub = status.subscribe();

        status.set(InstallStatus::Install);
        assert_eq!(sub.changed().await, Some(InstallStatus::Install));

        status.set(InstallStatus::Uninstall);
        assert_eq!(sub.changed().await, Some(InstallStatus::Uninstall));
    }

    #[tokio::test]
    async fn test_dropping_watch_ends_subscription() {
        let status = StatusWatch::default();
        let mut sub = status.subscribe();
        drop(status);
        assert_eq!(sub.changed().await, None);
    }

    #[test]
    fn test_unsubscribe_on_drop() {
        let status = StatusWatch::default();
        let sub = status.subscribe();
        assert_eq!(status.subscriber_count(), 1);
        drop(sub);
        assert_eq!(status.subscriber_count(), 0);
    }
}
