//! # alarmwatch-types
//!
//! Wire types shared by the alarmwatch engine, its adapters and the CLI.
//!
//! The backend is treated as an opaque HTTP service returning JSON. This crate
//! captures the two payloads the client cares about:
//!
//! - **Install state**: `{ "state": "install" }` or `{ "status": "uninstall" }`,
//!   decoded into [`InstallStatus`] via [`InstallStateResponse`].
//! - **Alarm lists**: either a bare array of records or `{ "data": [...] }`,
//!   decoded into [`AlarmRecord`]s via [`extract_alarms`].
//!
//! Each record yields an [`AlarmKey`] that identifies the "same logical alarm"
//! across polls, so a consumer can surface every alarm exactly once.
//!
//! ## Example
//!
//! ```rust
//! use alarmwatch_types::{extract_alarms, AlarmKey};
//! use serde_json::json;
//!
//! let body = json!({ "data": [
//!     { "id": 7, "message": "door open" },
//!     { "timestamp": 1703160000, "msg": "smoke" },
//! ]});
//!
//! let alarms = extract_alarms(body);
//! assert_eq!(alarms.len(), 2);
//! assert_eq!(AlarmKey::derive(&alarms[0]).as_str(), "7");
//! assert_eq!(AlarmKey::derive(&alarms[1]).as_str(), "1703160000|smoke");
//! ```

mod key;
mod record;
mod status;

pub use key::*;
pub use record::*;
pub use status::*;
