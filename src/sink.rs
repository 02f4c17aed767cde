//! Terminal notification sink.

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

use alarmwatch_engine::NotificationSink;

/// Writes one line per alarm to a terminal (or any writer).
pub struct TerminalSink<W: Write + Send = io::Stdout> {
    out: Mutex<W>,
    prefix: String,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            prefix: "[alarm]".to_string(),
        }
    }

    /// Replace the line prefix (default `[alarm]`). An empty prefix prints
    /// the text alone.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> NotificationSink for TerminalSink<W> {
    fn notify(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        let result = if self.prefix.is_empty() {
            writeln!(out, "{}", text)
        } else {
            writeln!(out, "{} {}", self.prefix, text)
        };
        if let Err(e) = result.and_then(|_| out.flush()) {
            tracing::warn!("Failed to write alarm notification: {}", e);
        }
    }
}

impl<W: Write + Send> fmt::Debug for TerminalSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalSink")
            .field("prefix", &self.prefix)
            .finish()
    }
}
