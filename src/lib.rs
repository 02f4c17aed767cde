//! # alarmwatch
//!
//! Command-line client that keeps up with an installation/alarm backend.
//!
//! The heavy lifting lives in `alarmwatch-engine`; this crate adds what a
//! runnable process needs around it:
//!
//! - **[`settings`]**: layered configuration (defaults, TOML file,
//!   `ALARMWATCH_*` environment, command line)
//! - **[`sink`]**: a [`TerminalSink`] that prints one line per new alarm
//!
//! ## Usage
//!
//! ```bash
//! alarmwatch --base-url http://backend.local:8000 --interval-ms 2000
//! alarmwatch --config alarmwatch.toml --once
//! ```

pub mod settings;
pub mod sink;

pub use settings::{Overrides, Settings};
pub use sink::TerminalSink;
