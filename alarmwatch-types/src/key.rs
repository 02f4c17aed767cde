//! Stable deduplication keys for alarm records.

use std::fmt;

use serde_json::{Map, Value};

use crate::record::{coerce_to_string, AlarmRecord};

/// Identity of a logical alarm.
///
/// Two records with equal keys are "the same alarm" and are surfaced once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlarmKey(String);

impl AlarmKey {
    /// Derive the key for a record.
    ///
    /// Tried in order, the first that applies wins:
    ///
    /// 1. the `id` field's string form;
    /// 2. `"{timestamp}|{message}"` when both a `timestamp` and a `message`
    ///    (or `msg`) field are present;
    /// 3. a canonical JSON serialization of the whole record, object keys
    ///    sorted so field order in the response does not matter;
    /// 4. the record's debug form if serialization fails.
    ///
    /// This never panics.
    pub fn derive(record: &AlarmRecord) -> Self {
        if let Some(id) = record.field("id") {
            return AlarmKey(coerce_to_string(id));
        }

        if let (Some(ts), Some(msg)) = (record.field("timestamp"), record.message()) {
            return AlarmKey(format!("{}|{}", coerce_to_string(ts), coerce_to_string(msg)));
        }

        match serde_json::to_string(&canonicalize(record.value())) {
            Ok(s) => AlarmKey(s),
            Err(_) => AlarmKey(format!("{:?}", record.value())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AlarmKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AlarmKey {
    fn from(s: &str) -> Self {
        AlarmKey(s.to_string())
    }
}

impl From<String> for AlarmKey {
    fn from(s: String) -> Self {
        AlarmKey(s)
    }
}

impl From<&AlarmRecord> for AlarmKey {
    fn from(record: &AlarmRecord) -> Self {
        AlarmKey::derive(record)
    }
}

// Rebuild objects with sorted keys, independent of serde_json's map backing.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k.clone(), canonicalize(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
