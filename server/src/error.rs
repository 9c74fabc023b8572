use bookwire_protocol::wire::WireError;
use thiserror::Error;

/// Server-side failures.
///
/// The first four variants are recovered at the server boundary and
/// converted to structured responses. `Inconsistency` marks slot-table /
/// booking-index divergence: an implementation bug, surfaced loudly and
/// never silently repaired.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("facility unavailable: {0}")]
    UnavailableFacility(String),

    #[error("booking unavailable: {0}")]
    UnavailableBooking(String),

    #[error("duplicate non-idempotent request")]
    DuplicateRequest,

    #[error("internal consistency fault: {0}")]
    Inconsistency(String),

    #[error("retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
