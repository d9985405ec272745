//! Container format error types.

use thiserror::Error;

/// Container format errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Leading bytes are not the PNG signature
    #[error("invalid png signature")]
    InvalidSignature,

    /// Declared chunk length runs past the end of the buffer
    #[error("truncated chunk at offset {offset}")]
    TruncatedChunk {
        /// Offset of the chunk's length field
        offset: usize,
    },

    /// Buffer ended without an IEND chunk
    #[error("missing IEND terminator")]
    MissingTerminator,

    /// Stored CRC does not match the recomputed one
    #[error("crc mismatch in {chunk_type} chunk: stored {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch {
        /// Chunk type as text
        chunk_type: String,
        /// CRC stored in the container
        expected: u32,
        /// CRC computed over type || data
        actual: u32,
    },

    /// Chunk data does not fit the 32-bit length field
    #[error("size limit exceeded: {0}")]
    Size(usize),

    /// Keyword is empty, too long, or contains a zero byte or non-latin1 char
    #[error("invalid keyword: {0:?}")]
    Keyword(String),

    /// iTXt body is missing a terminator or the flag bytes
    #[error("malformed iTXt entry")]
    MalformedText,

    /// Compressed iTXt entry uses an unknown compression method
    #[error("unsupported compression method {0}")]
    CompressionMethod(u8),

    /// IHDR body has the wrong length or an unknown color type
    #[error("malformed IHDR")]
    Header,
}
