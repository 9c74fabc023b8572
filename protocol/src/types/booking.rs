use crate::wire::{WireReader, WireResult, WireWriter};
use crate::MINUTES_IN_WEEK;

/// A claim on a contiguous range of weekly minute-slots of one facility.
///
/// `start_minute` is inclusive, `end_minute` exclusive, both within the
/// 10080-minute week. Ids are positive and unique across the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Booking {
    pub id: i32,
    pub facility_id: i32,
    pub start_minute: i32,
    pub end_minute: i32,
}

impl Booking {
    /// Whether the slot range is well-formed.
    pub fn is_valid_range(&self) -> bool {
        0 <= self.start_minute
            && self.start_minute < self.end_minute
            && self.end_minute <= MINUTES_IN_WEEK
    }

    pub fn duration_minutes(&self) -> i32 {
        self.end_minute - self.start_minute
    }

    pub fn encode(&self) -> WireResult<Vec<u8>> {
        let mut writer = WireWriter::new();
        writer.begin_object(4)?;
        writer.put_str("id")?;
        writer.put_i32(self.id);
        writer.put_str("facilityId")?;
        writer.put_i32(self.facility_id);
        writer.put_str("startMinute")?;
        writer.put_i32(self.start_minute);
        writer.put_str("endMinute")?;
        writer.put_i32(self.end_minute);
        Ok(writer.into_bytes())
    }

    pub fn decode(bytes: &[u8]) -> WireResult<Self> {
        let mut reader = WireReader::new(bytes);
        reader.begin_object(4)?;
        reader.expect_field("id")?;
        let id = reader.read_i32()?;
        reader.expect_field("facilityId")?;
        let facility_id = reader.read_i32()?;
        reader.expect_field("startMinute")?;
        let start_minute = reader.read_i32()?;
        reader.expect_field("endMinute")?;
        let end_minute = reader.read_i32()?;
        reader.finish()?;
        Ok(Self {
            id,
            facility_id,
            start_minute,
            end_minute,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let booking = Booking {
            id: 31337,
            facility_id: 7,
            start_minute: 600,
            end_minute: 630,
        };
        assert_eq!(Booking::decode(&booking.encode().unwrap()).unwrap(), booking);
    }

    #[test]
    fn range_validation() {
        let mut booking = Booking {
            id: 1,
            facility_id: 1,
            start_minute: 0,
            end_minute: MINUTES_IN_WEEK,
        };
        assert!(booking.is_valid_range());

        booking.start_minute = -1;
        assert!(!booking.is_valid_range());

        booking.start_minute = 100;
        booking.end_minute = 100;
        assert!(!booking.is_valid_range());

        booking.end_minute = MINUTES_IN_WEEK + 1;
        assert!(!booking.is_valid_range());
    }
}
