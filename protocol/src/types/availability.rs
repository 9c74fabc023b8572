use crate::wire::{WireError, WireReader, WireResult, WireWriter};
use crate::MINUTES_IN_WEEK;

/// Packed occupancy bytes for one week: 10080 bits.
const WEEK_BYTES: usize = (MINUTES_IN_WEEK as usize) / 8;

/// Occupancy of one facility for the whole week, one bit per minute,
/// set iff the minute is claimed by any booking.
///
/// Bits are packed most-significant-first: minute 0 is the high bit of
/// byte 0. On the wire this is an object of (`facilityId`: Int32,
/// `booked`: Bytes[1260]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilitySnapshot {
    pub facility_id: i32,
    booked: Vec<u8>,
}

impl AvailabilitySnapshot {
    /// An all-free week.
    pub fn new(facility_id: i32) -> Self {
        Self {
            facility_id,
            booked: vec![0u8; WEEK_BYTES],
        }
    }

    /// Marks one minute of the week.
    ///
    /// Out-of-range minutes are ignored; the vector covers exactly one
    /// week and there is nothing meaningful to record beyond it.
    pub fn set_booked(&mut self, minute: usize, booked: bool) {
        if minute >= MINUTES_IN_WEEK as usize {
            return;
        }
        let mask = 0x80u8 >> (minute % 8);
        if booked {
            self.booked[minute / 8] |= mask;
        } else {
            self.booked[minute / 8] &= !mask;
        }
    }

    pub fn is_booked(&self, minute: usize) -> bool {
        if minute >= MINUTES_IN_WEEK as usize {
            return false;
        }
        self.booked[minute / 8] & (0x80u8 >> (minute % 8)) != 0
    }

    /// Number of occupied minutes in the week.
    pub fn booked_minutes(&self) -> usize {
        self.booked.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn encode(&self) -> WireResult<Vec<u8>> {
        let mut writer = WireWriter::new();
        writer.begin_object(2)?;
        writer.put_str("facilityId")?;
        writer.put_i32(self.facility_id);
        writer.put_str("booked")?;
        writer.put_bytes(&self.booked)?;
        Ok(writer.into_bytes())
    }

    pub fn decode(bytes: &[u8]) -> WireResult<Self> {
        let mut reader = WireReader::new(bytes);
        reader.begin_object(2)?;
        reader.expect_field("facilityId")?;
        let facility_id = reader.read_i32()?;
        reader.expect_field("booked")?;
        let booked = reader.read_bytes()?;
        if booked.len() != WEEK_BYTES {
            return Err(WireError::BadSize {
                declared: booked.len(),
                expected: WEEK_BYTES,
            });
        }
        let booked = booked.to_vec();
        reader.finish()?;
        Ok(Self {
            facility_id,
            booked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_packing_is_msb_first() {
        let mut snapshot = AvailabilitySnapshot::new(7);
        snapshot.set_booked(0, true);
        snapshot.set_booked(9, true);

        let bytes = snapshot.encode().unwrap();
        // object header, "facilityId" + value, "booked" name + bytes header.
        let booked_offset = 4 + (4 + 10) + (4 + 4) + (4 + 6) + 4;
        assert_eq!(bytes[booked_offset], 0b1000_0000);
        assert_eq!(bytes[booked_offset + 1], 0b0100_0000);
    }

    #[test]
    fn roundtrip_preserves_every_minute() {
        let mut snapshot = AvailabilitySnapshot::new(3);
        for minute in [0usize, 614, 615, 616, 10079] {
            snapshot.set_booked(minute, true);
        }

        let decoded = AvailabilitySnapshot::decode(&snapshot.encode().unwrap()).unwrap();
        assert_eq!(decoded, snapshot);
        assert!(decoded.is_booked(615));
        assert!(!decoded.is_booked(613));
        assert!(decoded.is_booked(10079));
        assert_eq!(decoded.booked_minutes(), 5);
    }

    #[test]
    fn set_and_clear() {
        let mut snapshot = AvailabilitySnapshot::new(1);
        snapshot.set_booked(100, true);
        assert!(snapshot.is_booked(100));
        snapshot.set_booked(100, false);
        assert!(!snapshot.is_booked(100));
        assert_eq!(snapshot.booked_minutes(), 0);
    }

    #[test]
    fn wrong_vector_length_rejected() {
        let mut writer = WireWriter::new();
        writer.begin_object(2).unwrap();
        writer.put_str("facilityId").unwrap();
        writer.put_i32(1);
        writer.put_str("booked").unwrap();
        writer.put_bytes(&[0u8; 12]).unwrap();

        let result = AvailabilitySnapshot::decode(&writer.into_bytes());
        assert!(matches!(result, Err(WireError::BadSize { .. })));
    }
}
