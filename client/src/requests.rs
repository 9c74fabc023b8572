//! Typed request constructors.
//!
//! Each constructor draws a fresh correlation id and pre-encodes its
//! parameters as raw blobs, so the caller never touches the wire layer.

use std::collections::BTreeMap;

use bookwire_protocol::{keys, wire, Operation, Request};

fn with_params(operation: Operation, params: &[(&str, i32)]) -> Request {
    let parameters: BTreeMap<String, Vec<u8>> = params
        .iter()
        .map(|(name, value)| (name.to_string(), wire::encode_i32(*value)))
        .collect();
    Request::new(operation, parameters)
}

pub fn query_availability(facility_id: i32, check_start: i32, check_end: i32) -> Request {
    with_params(
        Operation::QueryAvailability,
        &[
            (keys::FACILITY_ID, facility_id),
            (keys::CHECK_TIME_START, check_start),
            (keys::CHECK_TIME_END, check_end),
        ],
    )
}

pub fn book_facility(facility_id: i32, start: i32, end: i32) -> Request {
    with_params(
        Operation::BookFacility,
        &[
            (keys::FACILITY_ID, facility_id),
            (keys::BOOKING_START_TIME, start),
            (keys::BOOKING_END_TIME, end),
        ],
    )
}

pub fn change_booking(booking_id: i32, offset: i32) -> Request {
    with_params(
        Operation::ChangeBooking,
        &[(keys::BOOKING_ID, booking_id), (keys::OFFSET_TIME, offset)],
    )
}

pub fn extend_booking(booking_id: i32, offset: i32) -> Request {
    with_params(
        Operation::ExtendBooking,
        &[(keys::BOOKING_ID, booking_id), (keys::OFFSET_TIME, offset)],
    )
}

pub fn monitor_facility(facility_id: i32, duration_minutes: i32) -> Request {
    with_params(
        Operation::MonitorFacility,
        &[
            (keys::FACILITY_ID, facility_id),
            (keys::DURATION, duration_minutes),
        ],
    )
}

pub fn list_facilities() -> Request {
    Request::new(Operation::ListFacilities, BTreeMap::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_are_encoded_blobs() {
        let request = book_facility(7, 600, 630);
        assert_eq!(request.operation, Operation::BookFacility);
        assert_eq!(
            wire::decode_i32(&request.parameters[keys::FACILITY_ID]).unwrap(),
            7
        );
        assert_eq!(
            wire::decode_i32(&request.parameters[keys::BOOKING_START_TIME]).unwrap(),
            600
        );
        assert_eq!(
            wire::decode_i32(&request.parameters[keys::BOOKING_END_TIME]).unwrap(),
            630
        );
    }

    #[test]
    fn each_request_gets_a_fresh_id() {
        let a = list_facilities();
        let b = list_facilities();
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn list_facilities_has_no_parameters() {
        assert!(list_facilities().parameters.is_empty());
    }
}
