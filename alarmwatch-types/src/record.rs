//! Alarm records returned by the event endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field under which an enveloped response carries its alarm list.
pub const DATA_FIELD: &str = "data";

/// One alarm/event record as returned by the backend.
///
/// Records are opaque: the client never mutates them and only consults the
/// optional `id`, `timestamp`, `message` and `msg` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmRecord(Value);

impl AlarmRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The underlying JSON value.
    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Look up a top-level field, treating `null` as absent.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    /// The message-like field: `message`, falling back to `msg`.
    pub fn message(&self) -> Option<&Value> {
        self.field("message").or_else(|| self.field("msg"))
    }

    /// Human-readable text for a notification.
    ///
    /// A string record is shown as-is. Otherwise the first non-empty of
    /// `message` and `msg` is shown followed by `detail_hint`; a record with
    /// neither is shown as compact JSON.
    pub fn render(&self, detail_hint: &str) -> String {
        if let Value::String(s) = &self.0 {
            return s.clone();
        }

        let text = ["message", "msg"]
            .iter()
            .filter_map(|name| self.field(name))
            .map(coerce_to_string)
            .find(|text| !text.is_empty());

        match text {
            Some(text) => format!("{}{}", text, detail_hint),
            None => serde_json::to_string(&self.0).unwrap_or_else(|_| format!("{:?}", self.0)),
        }
    }
}

impl From<Value> for AlarmRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Extract the alarm list from a decoded response body.
///
/// Accepts a bare array or an object carrying the array under
/// [`DATA_FIELD`]. Anything else yields an empty list.
pub fn extract_alarms(body: Value) -> Vec<AlarmRecord> {
    match body {
        Value::Array(items) => items.into_iter().map(AlarmRecord).collect(),
        Value::Object(mut map) => match map.remove(DATA_FIELD) {
            Some(Value::Array(items)) => items.into_iter().map(AlarmRecord).collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Parse a raw response body and extract its alarms.
///
/// A body that is not valid JSON is treated as carrying no alarms.
pub fn parse_alarms(body: &str) -> Vec<AlarmRecord> {
    serde_json::from_str::<Value>(body)
        .map(extract_alarms)
        .unwrap_or_default()
}

/// String form of a scalar the way a loosely typed client would print it:
/// strings verbatim, everything else as JSON text.
pub(crate) fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_bare_array() {
        let alarms = extract_alarms(json!([{ "id": 1 }, { "id": 2 }]));
        assert_eq!(alarms.len(), 2);
        assert_eq!(alarms[1].field("id"), Some(&json!(2)));
    }

    #[test]
    fn test_extract_data_envelope() {
        let alarms = extract_alarms(json!({ "data": [{ "id": "a" }], "total": 1 }));
        assert_eq!(alarms.len(), 1);
    }

    #[test]
    fn test_extract_other_shapes_are_empty() {
        assert!(extract_alarms(json!({})).is_empty());
        assert!(extract_alarms(json!({ "data": "nope" })).is_empty());
        assert!(extract_alarms(json!({ "items": [1, 2] })).is_empty());
        assert!(extract_alarms(json!(null)).is_empty());
        assert!(extract_alarms(json!(42)).is_empty());
        assert!(extract_alarms(json!("text")).is_empty());
    }

    #[test]
    fn test_parse_alarms_invalid_json() {
        assert!(parse_alarms("<html>502 Bad Gateway</html>").is_empty());
        assert!(parse_alarms("").is_empty());
        assert_eq!(parse_alarms(r#"[{"id":1}]"#).len(), 1);
    }

    #[test]
    fn test_message_falls_back_to_msg() {
        let record = AlarmRecord::new(json!({ "msg": "fan stalled" }));
        assert_eq!(record.message(), Some(&json!("fan stalled")));

        let record = AlarmRecord::new(json!({ "message": null, "msg": "fan stalled" }));
        assert_eq!(record.message(), Some(&json!("fan stalled")));
    }

    #[test]
    fn test_render_with_message() {
        let record = AlarmRecord::new(json!({ "id": 1, "message": "Intrusion on camera 3" }));
        assert_eq!(record.render(" (see tasks)"), "Intrusion on camera 3 (see tasks)");
    }

    #[test]
    fn test_render_string_record() {
        let record = AlarmRecord::new(json!("raw alarm"));
        assert_eq!(record.render(" (see tasks)"), "raw alarm");
    }

    #[test]
    fn test_render_without_message_is_json() {
        let record = AlarmRecord::new(json!({ "id": 9 }));
        assert_eq!(record.render(" (see tasks)"), r#"{"id":9}"#);

        let record = AlarmRecord::new(json!({ "id": 9, "message": "" }));
        assert_eq!(record.render(" (see tasks)"), r#"{"id":9,"message":""}"#);
    }

    #[test]
    fn test_render_empty_message_uses_msg() {
        let record = AlarmRecord::new(json!({ "message": "", "msg": "fan" }));
        assert_eq!(record.render(" (see tasks)"), "fan (see tasks)");
    }
}
