//! # alarmwatch-adapters
//!
//! Backend adapters for the alarmwatch polling engine.
//!
//! The engine only knows the [`Backend`](alarmwatch_engine::Backend) seam:
//! "GET this endpoint and give me the body". This crate provides the
//! implementations used outside of tests.
//!
//! ## Supported Transports
//!
//! - **HTTP** (`http` feature, on by default) - plain GET requests against
//!   the alarm server's JSON API via reqwest
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use alarmwatch_adapters::http::HttpBackend;
//! use alarmwatch_engine::Backend;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let backend = HttpBackend::builder()
//!         .base_url("http://localhost:8000")
//!         .build()?;
//!
//!     let body = backend.get("/api/install_state").await?;
//!     println!("{}", body);
//!     Ok(())
//! }
//! ```

pub mod error;

#[cfg(feature = "http")]
pub mod http;

pub use error::AdapterError;

#[cfg(feature = "http")]
pub use http::{HttpBackend, HttpBackendBuilder};
