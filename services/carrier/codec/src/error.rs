//! Codec error types.

use carrier_wire::WireError;
use thiserror::Error;

/// Payload codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    /// Container framing error
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// No iTXt entry carries the expected keyword prefix
    #[error("no iTXt entries with prefix {0:?}")]
    NoMatchingEntries(String),

    /// Keyword suffix is not a decimal part index
    #[error("malformed part index in keyword {0:?}")]
    MalformedIndex(String),

    /// Neither zlib nor raw deflate could inflate a part
    #[error("decompression failed: {0}")]
    DecompressionFailure(String),

    /// Compressing a part failed
    #[error("compression failed: {0}")]
    Compression(#[from] std::io::Error),

    /// Two entries claim the same part index
    #[error("duplicate part index {0}")]
    DuplicateIndex(u32),

    /// Part indices are not contiguous from 1
    #[error("missing part {0}")]
    MissingPart(u32),

    /// Reassembled text is not valid base64
    #[error("invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// Encoder or decoder settings are unusable
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
