//! RPC envelopes.
//!
//! A [`Request`] and a [`Response`] are each encoded as a three-field
//! object, fields consumed in fixed declared order:
//!
//! ```text
//! Request  = (requestId: Bytes[16], operation: Enum,    parameters: Map<String, Bytes>)
//! Response = (requestId: Bytes[16], status:    Bool,    data:       Map<String, Bytes>)
//! ```
//!
//! Correlation ids are UUIDs serialized as 16 raw bytes, most-significant
//! eight bytes first, independent of the header's little-endian size field.

mod request;
mod response;

pub use request::{Operation, Request};
pub use response::{Response, ResponseOutcome};

use uuid::Uuid;

use crate::wire::{WireReader, WireResult, WireWriter};

pub(crate) fn put_uuid(writer: &mut WireWriter, id: Uuid) -> WireResult<()> {
    writer.put_bytes(id.as_bytes())
}

pub(crate) fn read_uuid(reader: &mut WireReader<'_>) -> WireResult<Uuid> {
    let raw = reader.read_bytes()?;
    let bytes: [u8; 16] = raw.try_into().map_err(|_| crate::wire::WireError::BadSize {
        declared: raw.len(),
        expected: 16,
    })?;
    Ok(Uuid::from_bytes(bytes))
}
