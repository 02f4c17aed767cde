//! The seam between the engine and the remote service.

use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

/// Error type returned by [`Backend`] implementations.
///
/// The engine never inspects it beyond logging, so any error will do.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Something that can GET an endpoint and return the response body.
///
/// The engine only ever issues body-less reads and parses the returned text
/// itself, so a body that is not JSON is not an error at this level.
///
/// `alarmwatch-adapters` provides an HTTP implementation; [`ScriptedBackend`]
/// serves canned responses for tests and demos.
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Fetch the body at `endpoint`.
    async fn get(&self, endpoint: &str) -> Result<String, BackendError>;
}

#[async_trait]
impl<B: Backend + ?Sized> Backend for Arc<B> {
    async fn get(&self, endpoint: &str) -> Result<String, BackendError> {
        (**self).get(endpoint).await
    }
}

/// A backend that replays queued responses per endpoint.
///
/// Each call pops the next queued response for the endpoint; once the queue
/// is empty the last response is repeated. Endpoints with nothing queued fail
/// with a "connection refused" style error.
///
/// # Example
///
/// ```rust
/// use alarmwatch_engine::{Backend, ScriptedBackend};
///
/// # tokio_test::block_on(async {
/// let backend = ScriptedBackend::new();
/// backend.push_ok("/api/install_state", r#"{"state":"install"}"#);
///
/// let body = backend.get("/api/install_state").await.unwrap();
/// assert!(body.contains("install"));
/// assert_eq!(backend.calls("/api/install_state"), 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    inner: Mutex<ScriptState>,
}

#[derive(Debug, Default)]
struct ScriptState {
    queued: HashMap<String, VecDeque<Result<String, String>>>,
    last: HashMap<String, Result<String, String>>,
    calls: HashMap<String, usize>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response body for `endpoint`.
    pub fn push_ok(&self, endpoint: &str, body: impl Into<String>) {
        self.push(endpoint, Ok(body.into()));
    }

    /// Queue a failure for `endpoint`.
    pub fn push_err(&self, endpoint: &str, message: impl Into<String>) {
        self.push(endpoint, Err(message.into()));
    }

    fn push(&self, endpoint: &str, response: Result<String, String>) {
        self.inner
            .lock()
            .queued
            .entry(endpoint.to_string())
            .or_default()
            .push_back(response);
    }

    /// Number of calls made to `endpoint` so far.
    pub fn calls(&self, endpoint: &str) -> usize {
        self.inner.lock().calls.get(endpoint).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn get(&self, endpoint: &str) -> Result<String, BackendError> {
        let response = {
            let mut state = self.inner.lock();
            *state.calls.entry(endpoint.to_string()).or_default() += 1;

            let next = state
                .queued
                .get_mut(endpoint)
                .and_then(|queue| queue.pop_front());
            match next {
                Some(response) => {
                    state.last.insert(endpoint.to_string(), response.clone());
                    response
                }
                None => state
                    .last
                    .get(endpoint)
                    .cloned()
                    .unwrap_or_else(|| Err(format!("connection refused: {}", endpoint))),
            }
        };

        response.map_err(BackendError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_backend_replays_in_order() {
        let backend = ScriptedBackend::new();
        backend.push_ok("/a", "one");
        backend.push_err("/a", "boom");
        backend.push_ok("/a", "three");

        assert_eq!(backend.get("/a").await.unwrap(), "one");
        assert!(backend.get("/a").await.is_err());
        assert_eq!(backend.get("/a").await.unwrap(), "three");
        // Queue drained: last response repeats
        assert_eq!(backend.get("/a").await.unwrap(), "three");
        assert_eq!(backend.calls("/a"), 4);
    }

    #[tokio::test]
    async fn test_scripted_backend_unknown_endpoint() {
        let backend = ScriptedBackend::new();
        let err = backend.get("/missing").await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(backend.calls("/missing"), 1);
        assert_eq!(backend.calls("/other"), 0);
    }
}
