//! Domain entities with their wire encodings.
//!
//! Each entity has a dedicated encode/decode pair rather than a shared
//! reflective path; object fields travel in fixed declared order.

mod availability;
mod booking;
mod facility;

pub use availability::AvailabilitySnapshot;
pub use booking::Booking;
pub use facility::{Facility, FacilityType};
