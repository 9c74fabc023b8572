//! Extraction helpers for response payloads.

use bookwire_protocol::{keys, wire, AvailabilitySnapshot, Facility, Response};

use crate::error::{ClientError, Result};

/// The booking id carried by a successful book-facility response.
pub fn booking_id(response: &Response) -> Result<i32> {
    let blob = response
        .data
        .get(keys::BOOKING_ID)
        .ok_or_else(|| ClientError::MissingData(keys::BOOKING_ID.to_owned()))?;
    Ok(wire::decode_i32(blob)?)
}

/// The facility list of a list-facilities response, in listing order.
pub fn facilities(response: &Response) -> Result<Vec<Facility>> {
    let mut facilities = Vec::new();
    for index in 0.. {
        match response.data.get(&format!("{}{index}", keys::FACILITY_PREFIX)) {
            Some(blob) => facilities.push(Facility::decode(blob)?),
            None => break,
        }
    }
    Ok(facilities)
}

/// The snapshot carried by a monitoring push.
pub fn availability(response: &Response) -> Result<AvailabilitySnapshot> {
    let blob = response
        .data
        .get(keys::AVAILABILITY)
        .ok_or_else(|| ClientError::MissingData(keys::AVAILABILITY.to_owned()))?;
    Ok(AvailabilitySnapshot::decode(blob)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookwire_protocol::FacilityType;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    #[test]
    fn extracts_booking_id() {
        let response = Response::success(
            Uuid::new_v4(),
            BTreeMap::from([(keys::BOOKING_ID.to_owned(), wire::encode_i32(1234))]),
        );
        assert_eq!(booking_id(&response).unwrap(), 1234);

        let empty = Response::ok(Uuid::new_v4());
        assert!(matches!(
            booking_id(&empty).unwrap_err(),
            ClientError::MissingData(_)
        ));
    }

    #[test]
    fn extracts_facility_list() {
        let mut data = BTreeMap::new();
        for (index, name) in ["Pod A", "Pod B"].iter().enumerate() {
            let facility = Facility::new(index as i32 + 1, *name, FacilityType::StudyPod);
            data.insert(
                format!("{}{index}", keys::FACILITY_PREFIX),
                facility.encode().unwrap(),
            );
        }
        let response = Response::success(Uuid::new_v4(), data);

        let listed = facilities(&response).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "Pod A");
        assert_eq!(listed[1].name, "Pod B");
    }

    #[test]
    fn extracts_availability() {
        let mut snapshot = AvailabilitySnapshot::new(7);
        snapshot.set_booked(615, true);
        let response = Response::success(
            Uuid::new_v4(),
            BTreeMap::from([(keys::AVAILABILITY.to_owned(), snapshot.encode().unwrap())]),
        );
        assert!(availability(&response).unwrap().is_booked(615));
    }
}
