//! String keys used in request parameter maps and response data maps.
//!
//! Both sides of the wire must agree on these exactly; they are part of the
//! protocol, not an implementation detail.

/// Response data key signalling failure content.
pub const ERROR: &str = "error";

/// Response data key carrying an encoded availability snapshot in pushes.
pub const AVAILABILITY: &str = "availability";

/// Response data key carrying the id of a freshly created booking.
pub const BOOKING_ID: &str = "bookingId";

/// Prefix for the per-facility entries of a list-facilities response
/// (`facility-0`, `facility-1`, ...).
pub const FACILITY_PREFIX: &str = "facility-";

// Request parameter names.
pub const FACILITY_ID: &str = "facilityId";
pub const CHECK_TIME_START: &str = "checkTimeStart";
pub const CHECK_TIME_END: &str = "checkTimeEnd";
pub const BOOKING_START_TIME: &str = "bookingStartTime";
pub const BOOKING_END_TIME: &str = "bookingEndTime";
pub const OFFSET_TIME: &str = "offsetTime";
pub const DURATION: &str = "duration";
