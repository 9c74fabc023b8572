//! # Bookwire Client
//!
//! Client side of the bookwire facility-booking service:
//!
//! - [`requests`] - typed request constructors for every operation
//! - [`service`] - synchronous caller with timeout/retry and optional
//!   at-most-once response memoization
//! - [`responses`] - extraction helpers for response payloads
//! - [`monitor`] - long-lived listener for availability pushes

pub mod config;
pub mod error;
pub mod monitor;
pub mod requests;
pub mod responses;
pub mod service;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use monitor::MonitorSession;
pub use service::ClientService;
