//! # Bookwire Server
//!
//! Server side of the bookwire facility-booking service:
//!
//! - [`booking`] - concurrent, conflict-checking booking engine
//! - [`catalog`] - facility catalog consumed from the startup collaborator
//! - [`monitor`] - availability-monitoring subscriptions and pushes
//! - [`dedup`] - time-bounded duplicate suppression for at-most-once mode
//! - [`faults`] - simulated message loss and response withholding
//! - [`semantics`] - standalone at-least-once retry wrapper
//! - [`dispatch`] - operation dispatch and error-to-response mapping
//! - [`listener`] - UDP receive loop

pub mod booking;
pub mod catalog;
pub mod config;
pub mod dedup;
pub mod dispatch;
pub mod error;
pub mod faults;
pub mod listener;
pub mod monitor;
pub mod semantics;

pub use booking::BookingEngine;
pub use catalog::FacilityCatalog;
pub use config::ServerConfig;
pub use dedup::DedupCache;
pub use dispatch::Dispatcher;
pub use error::{Result, ServerError};
pub use listener::Server;
pub use monitor::MonitoringService;
