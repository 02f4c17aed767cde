//! Install state reported by the backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Backend-reported installation mode.
///
/// Alarm polling is only meaningful while the backend components are
/// installed; the engine starts and stops its alarm loop on transitions
/// between these two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallStatus {
    /// Backend components are installed; alarms should be polled.
    Install,
    /// Backend components are absent; polling is stopped.
    #[default]
    Uninstall,
}

impl InstallStatus {
    /// Parse a raw signal string.
    ///
    /// Only the exact values `"install"` and `"uninstall"` are recognised.
    pub fn from_signal(signal: &str) -> Option<Self> {
        match signal {
            "install" => Some(InstallStatus::Install),
            "uninstall" => Some(InstallStatus::Uninstall),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstallStatus::Install => "install",
            InstallStatus::Uninstall => "uninstall",
        }
    }

    pub fn is_installed(&self) -> bool {
        matches!(self, InstallStatus::Install)
    }
}

impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response body of the install-state endpoint.
///
/// Either field may carry the signal; `state` wins when both are present and
/// non-empty. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InstallStateResponse {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl InstallStateResponse {
    /// Decode a response body. Anything that is not a JSON object with
    /// string-or-missing `state`/`status` fields yields `None`.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    /// The raw signal string, `state` first, then `status`.
    pub fn signal(&self) -> Option<&str> {
        self.state
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.status.as_deref().filter(|s| !s.is_empty()))
    }

    /// The recognised install status, if any.
    pub fn install_status(&self) -> Option<InstallStatus> {
        self.signal().and_then(InstallStatus::from_signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_signal() {
        assert_eq!(InstallStatus::from_signal("install"), Some(InstallStatus::Install));
        assert_eq!(InstallStatus::from_signal("uninstall"), Some(InstallStatus::Uninstall));
        assert_eq!(InstallStatus::from_signal("Install"), None);
        assert_eq!(InstallStatus::from_signal("success"), None);
        assert_eq!(InstallStatus::from_signal(""), None);
    }

    #[test]
    fn test_default_is_uninstall() {
        assert_eq!(InstallStatus::default(), InstallStatus::Uninstall);
        assert!(!InstallStatus::default().is_installed());
    }

    #[test]
    fn test_state_field_preferred() {
        let resp = InstallStateResponse::parse(r#"{"state":"install","status":"uninstall"}"#)
            .unwrap();
        assert_eq!(resp.install_status(), Some(InstallStatus::Install));
    }

    #[test]
    fn test_status_field_fallback() {
        let resp = InstallStateResponse::parse(r#"{"status":"uninstall"}"#).unwrap();
        assert_eq!(resp.install_status(), Some(InstallStatus::Uninstall));

        // Empty state falls through to status
        let resp = InstallStateResponse::parse(r#"{"state":"","status":"install"}"#).unwrap();
        assert_eq!(resp.install_status(), Some(InstallStatus::Install));
    }

    #[test]
    fn test_unrecognised_signal() {
        let resp = InstallStateResponse::parse(r#"{"state":"pending"}"#).unwrap();
        assert_eq!(resp.signal(), Some("pending"));
        assert_eq!(resp.install_status(), None);

        let resp = InstallStateResponse::parse(r#"{}"#).unwrap();
        assert_eq!(resp.install_status(), None);
    }

    #[test]
    fn test_malformed_body() {
        assert!(InstallStateResponse::parse("not json").is_none());
        assert!(InstallStateResponse::parse(r#"{"state": 3}"#).is_none());
        assert!(InstallStateResponse::parse("").is_none());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&InstallStatus::Install).unwrap();
        assert_eq!(json, r#""install""#);
        assert_eq!(InstallStatus::Uninstall.to_string(), "uninstall");
    }
}
