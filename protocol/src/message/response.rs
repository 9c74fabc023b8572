use std::collections::BTreeMap;

use uuid::Uuid;

use super::{put_uuid, read_uuid};
use crate::keys;
use crate::wire::{self, WireReader, WireResult, WireWriter};

/// The four outcome states a response can encode.
///
/// `status` and the presence of an `error` data entry are independent axes:
/// a failed status marks a transport/protocol failure, while a successful
/// status with an error entry marks a business-rule failure that was
/// nonetheless a successful exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// `status=true`, no error entry.
    Success,
    /// `status=true` with an error entry: a business-rule failure.
    ApplicationError,
    /// `status=false` with an error entry: a transport/protocol failure.
    ProtocolError,
    /// `status=false`, no error entry: a failure whose description itself
    /// could not be carried.
    Failure,
}

/// An RPC result, echoing the correlation id of the originating request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub request_id: Uuid,
    pub status: bool,
    pub data: BTreeMap<String, Vec<u8>>,
}

impl Response {
    pub fn success(request_id: Uuid, data: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            request_id,
            status: true,
            data,
        }
    }

    /// A successful exchange with no payload.
    pub fn ok(request_id: Uuid) -> Self {
        Self::success(request_id, BTreeMap::new())
    }

    /// A business-rule failure: the exchange succeeded, the operation did
    /// not. Falls back to [`Response::failure`] if the message itself
    /// cannot be encoded.
    pub fn application_error(request_id: Uuid, message: &str) -> Self {
        match wire::encode_str(message) {
            Ok(blob) => Self {
                request_id,
                status: true,
                data: BTreeMap::from([(keys::ERROR.to_owned(), blob)]),
            },
            Err(_) => Self::failure(request_id),
        }
    }

    /// A transport/protocol failure. Falls back to [`Response::failure`]
    /// if the message itself cannot be encoded.
    pub fn protocol_error(request_id: Uuid, message: &str) -> Self {
        match wire::encode_str(message) {
            Ok(blob) => Self {
                request_id,
                status: false,
                data: BTreeMap::from([(keys::ERROR.to_owned(), blob)]),
            },
            Err(_) => Self::failure(request_id),
        }
    }

    /// A failure carrying no description.
    pub fn failure(request_id: Uuid) -> Self {
        Self {
            request_id,
            status: false,
            data: BTreeMap::new(),
        }
    }

    pub fn outcome(&self) -> ResponseOutcome {
        match (self.status, self.data.contains_key(keys::ERROR)) {
            (true, false) => ResponseOutcome::Success,
            (true, true) => ResponseOutcome::ApplicationError,
            (false, true) => ResponseOutcome::ProtocolError,
            (false, false) => ResponseOutcome::Failure,
        }
    }

    /// True only for a fully successful operation.
    pub fn is_success(&self) -> bool {
        self.outcome() == ResponseOutcome::Success
    }

    /// Decodes the error entry, if one is present and well-formed.
    pub fn error_message(&self) -> Option<String> {
        self.data
            .get(keys::ERROR)
            .and_then(|blob| wire::decode_str(blob).ok())
    }

    pub fn encode(&self) -> WireResult<Vec<u8>> {
        let mut writer = WireWriter::new();
        writer.begin_object(3)?;
        writer.put_str("requestId")?;
        put_uuid(&mut writer, self.request_id)?;
        writer.put_str("status")?;
        writer.put_bool(self.status);
        writer.put_str("data")?;
        writer.put_bytes_map(&self.data)?;
        Ok(writer.into_bytes())
    }

    pub fn decode(bytes: &[u8]) -> WireResult<Self> {
        let mut reader = WireReader::new(bytes);
        reader.begin_object(3)?;
        reader.expect_field("requestId")?;
        let request_id = read_uuid(&mut reader)?;
        reader.expect_field("status")?;
        let status = reader.read_bool()?;
        reader.expect_field("data")?;
        let data = reader.read_bytes_map()?;
        reader.finish()?;
        Ok(Self {
            request_id,
            status,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let id = Uuid::new_v4();
        let mut data = BTreeMap::new();
        data.insert(keys::BOOKING_ID.to_owned(), wire::encode_i32(42));
        let response = Response::success(id, data);

        let decoded = Response::decode(&response.encode().unwrap()).unwrap();
        assert_eq!(decoded, response);
        assert_eq!(decoded.outcome(), ResponseOutcome::Success);
    }

    #[test]
    fn four_outcome_states() {
        let id = Uuid::new_v4();
        assert_eq!(Response::ok(id).outcome(), ResponseOutcome::Success);
        assert_eq!(
            Response::application_error(id, "booking conflict").outcome(),
            ResponseOutcome::ApplicationError
        );
        assert_eq!(
            Response::protocol_error(id, "duplicate request").outcome(),
            ResponseOutcome::ProtocolError
        );
        assert_eq!(Response::failure(id).outcome(), ResponseOutcome::Failure);

        // Only the fully successful state counts as success.
        assert!(Response::ok(id).is_success());
        assert!(!Response::application_error(id, "x").is_success());
        assert!(!Response::protocol_error(id, "x").is_success());
        assert!(!Response::failure(id).is_success());
    }

    #[test]
    fn outcomes_survive_the_wire() {
        let id = Uuid::new_v4();
        for response in [
            Response::ok(id),
            Response::application_error(id, "not available"),
            Response::protocol_error(id, "malformed"),
            Response::failure(id),
        ] {
            let decoded = Response::decode(&response.encode().unwrap()).unwrap();
            assert_eq!(decoded.outcome(), response.outcome());
        }
    }

    #[test]
    fn error_message_extraction() {
        let id = Uuid::new_v4();
        let response = Response::application_error(id, "facility not found");
        assert_eq!(
            response.error_message().as_deref(),
            Some("facility not found")
        );
        assert_eq!(Response::ok(id).error_message(), None);
    }
}
