//! Error types for stegscan operations.

use thiserror::Error;

/// Result type alias for stegscan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scanning or running a codec.
#[derive(Error, Debug)]
pub enum Error {
    /// Neither text nor image content was supplied.
    #[error("no content provided")]
    EmptyInput,

    /// The buffer's media type cannot be interpreted as image samples.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// A codec could not decode its input.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Returns true if the scan was rejected because of the caller's input.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::EmptyInput | Error::UnsupportedMediaType(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Failures while mapping encoded symbols back to bytes.
///
/// Distinct from "no hidden data", which decodes to an empty payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A cluster that is not part of the codec alphabet.
    #[error("unknown symbol {symbol:?} at cluster {position}")]
    UnknownSymbol {
        /// The offending cluster.
        symbol: String,
        /// Cluster index within the input.
        position: usize,
    },

    /// The unmasked bytes are not valid UTF-8 (usually a wrong key).
    #[error("decoded bytes are not valid UTF-8")]
    InvalidUtf8,
}
