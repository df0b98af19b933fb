//! Unified error type for all store operations.

/// Things that can go wrong when using the store.
///
/// Payloads are plain strings so the error stays `Clone` and comparable in
/// tests. Nothing is retried internally; every variant is surfaced to the
/// caller as-is.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// File system problem (missing, unreadable, unwritable).
    #[error("i/o error: {0}")]
    Io(String),
    /// Failed to encode the collection to bytes.
    #[error("encode error: {0}")]
    Encode(String),
    /// Failed to decode bytes into records (empty, malformed, wrong shape).
    #[error("decode error: {0}")]
    Decode(String),
    /// No record with the requested id.
    #[error("record not found: {0}")]
    NotFound(String),
    /// A record with this id is already stored.
    #[error("record already exists: {0}")]
    AlreadyExists(String),
    /// The record has no id and none could be assigned: no generator for its
    /// id type, a generator that returned an unset id, or an exhausted
    /// integer range.
    #[error("record has no id and none could be assigned")]
    MissingId,
    /// Bad configuration (unsupported delimiter, etc.).
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// `true` for [`Error::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

/// Result alias using our [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
