use std::collections::BTreeMap;

use num_enum::FromPrimitive;
use uuid::Uuid;

use super::{put_uuid, read_uuid};
use crate::wire::{WireReader, WireResult, WireWriter};

/// Operations a client may invoke.
///
/// Ordinals are part of the wire format. Decoding resolves an ordinal
/// through this mapping and falls back to [`Operation::Unknown`] for
/// out-of-range values: an unknown operation is a valid wire state that the
/// dispatcher rejects explicitly, not a decode-time failure.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
pub enum Operation {
    QueryAvailability = 0,
    BookFacility = 1,
    ChangeBooking = 2,
    MonitorFacility = 3,
    ListFacilities = 4,
    ExtendBooking = 5,

    #[num_enum(default)]
    Unknown = -1,
}

impl Operation {
    /// Whether repeating the operation is safe. Idempotent operations are
    /// re-executed on duplicate delivery rather than suppressed.
    pub fn is_idempotent(self) -> bool {
        matches!(
            self,
            Self::QueryAvailability | Self::MonitorFacility | Self::ListFacilities
        )
    }
}

/// An RPC call. The correlation id is globally unique per call and ties the
/// request to its response and to any later push related to it.
///
/// Parameter values are raw encoded blobs: each is a complete wire
/// encoding, produced and consumed by the operation that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub request_id: Uuid,
    pub operation: Operation,
    pub parameters: BTreeMap<String, Vec<u8>>,
}

impl Request {
    /// Builds a request with a fresh correlation id.
    pub fn new(operation: Operation, parameters: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            operation,
            parameters,
        }
    }

    /// Idempotency is derived from the operation; it is never transmitted.
    pub fn is_idempotent(&self) -> bool {
        self.operation.is_idempotent()
    }

    pub fn encode(&self) -> WireResult<Vec<u8>> {
        let mut writer = WireWriter::new();
        writer.begin_object(3)?;
        writer.put_str("requestId")?;
        put_uuid(&mut writer, self.request_id)?;
        writer.put_str("operation")?;
        writer.put_enum(self.operation as i32);
        writer.put_str("parameters")?;
        writer.put_bytes_map(&self.parameters)?;
        Ok(writer.into_bytes())
    }

    pub fn decode(bytes: &[u8]) -> WireResult<Self> {
        let mut reader = WireReader::new(bytes);
        reader.begin_object(3)?;
        reader.expect_field("requestId")?;
        let request_id = read_uuid(&mut reader)?;
        reader.expect_field("operation")?;
        let operation = Operation::from(reader.read_enum_ordinal()?);
        reader.expect_field("parameters")?;
        let parameters = reader.read_bytes_map()?;
        reader.finish()?;
        Ok(Self {
            request_id,
            operation,
            parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{self, WireError};

    fn sample_request() -> Request {
        let mut parameters = BTreeMap::new();
        parameters.insert("facilityId".to_owned(), wire::encode_i32(7));
        parameters.insert("duration".to_owned(), wire::encode_i32(5));
        Request::new(Operation::MonitorFacility, parameters)
    }

    #[test]
    fn roundtrip() {
        let request = sample_request();
        let decoded = Request::decode(&request.encode().unwrap()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn uuid_serializes_msb_first() {
        let request = sample_request();
        let bytes = request.encode().unwrap();
        // object header + "requestId" string + bytes header, then the id.
        let id_offset = 4 + (4 + 9) + 4;
        assert_eq!(
            &bytes[id_offset..id_offset + 16],
            request.request_id.as_bytes()
        );
    }

    #[test]
    fn unknown_ordinal_decodes_to_unknown() {
        let mut request = sample_request();
        request.operation = Operation::Unknown;
        let bytes = request.encode().unwrap();
        let decoded = Request::decode(&bytes).unwrap();
        assert_eq!(decoded.operation, Operation::Unknown);

        assert_eq!(Operation::from(99), Operation::Unknown);
        assert_eq!(Operation::from(-5), Operation::Unknown);
        assert_eq!(Operation::from(3), Operation::MonitorFacility);
    }

    #[test]
    fn idempotency_is_derived() {
        assert!(Operation::QueryAvailability.is_idempotent());
        assert!(Operation::MonitorFacility.is_idempotent());
        assert!(Operation::ListFacilities.is_idempotent());
        assert!(!Operation::BookFacility.is_idempotent());
        assert!(!Operation::ChangeBooking.is_idempotent());
        assert!(!Operation::ExtendBooking.is_idempotent());
        assert!(!Operation::Unknown.is_idempotent());
    }

    #[test]
    fn reordered_fields_fail_to_decode() {
        let request = sample_request();
        let mut writer = crate::wire::WireWriter::new();
        writer.begin_object(3).unwrap();
        // operation written first: positionally invalid.
        writer.put_str("operation").unwrap();
        writer.put_enum(request.operation as i32);
        writer.put_str("requestId").unwrap();
        writer.put_bytes(request.request_id.as_bytes()).unwrap();
        writer.put_str("parameters").unwrap();
        writer.put_bytes_map(&request.parameters).unwrap();

        let result = Request::decode(&writer.into_bytes());
        assert!(matches!(result, Err(WireError::FieldMismatch { .. })));
    }
}
