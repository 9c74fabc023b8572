//! # Bookwire Protocol
//!
//! Wire format and RPC envelopes for the bookwire facility-booking service.
//!
//! Key components:
//! - [`wire`] - **Tagged binary codec** (4-byte header, length-prefixed values)
//! - [`message`] - **RPC envelopes** (`Request`, `Response`, `Operation`)
//! - [`types`] - **Domain entities** (`Facility`, `Booking`, `AvailabilitySnapshot`)
//!
//! Every value on the wire starts with a 4-byte header: a one-byte type tag
//! followed by a 3-byte little-endian size field. Requests and responses are
//! three-field objects whose fields are consumed in fixed declared order.
//!
//! This crate is transport-agnostic: it produces and consumes byte buffers
//! and knows nothing about sockets.

pub mod keys;
pub mod message;
pub mod types;
pub mod wire;

pub use message::{Operation, Request, Response, ResponseOutcome};
pub use types::{AvailabilitySnapshot, Booking, Facility, FacilityType};
pub use wire::{WireError, WireReader, WireResult, WireType, WireWriter};

/// Minutes in a booking week (7 days x 24 hours x 60 minutes).
pub const MINUTES_IN_WEEK: i32 = 7 * 24 * 60;
