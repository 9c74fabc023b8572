use bookwire_protocol::wire::WireError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The client exhausted its retry budget without hearing back. This is
    /// the client's own terminal failure, reported to its caller.
    #[error("no response after {attempts} attempts")]
    TransportFailure { attempts: u32 },

    #[error("cannot resolve server address {0:?}")]
    BadServerAddress(String),

    #[error("response is missing data entry {0:?}")]
    MissingData(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
