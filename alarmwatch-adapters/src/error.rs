//! Error types for adapters.

use thiserror::Error;

/// Errors that can occur when talking to the alarm backend.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to read the response body.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The base URL or endpoint could not form a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else if err.is_builder() {
            AdapterError::InvalidUrl(err.to_string())
        } else if err.is_decode() || err.is_body() {
            AdapterError::Parse(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alarmwatch_engine::BackendError;

    #[test]
    fn test_display() {
        assert_eq!(AdapterError::Timeout.to_string(), "Request timed out");
        assert_eq!(
            AdapterError::Http("API returned status 503".into()).to_string(),
            "HTTP request failed: API returned status 503"
        );
    }

    #[test]
    fn test_into_backend_error() {
        let err: BackendError = AdapterError::Connection("refused".into()).into();
        assert_eq!(err.to_string(), "Connection failed: refused");
        assert!(err.downcast_ref::<AdapterError>().is_some());
    }
}
