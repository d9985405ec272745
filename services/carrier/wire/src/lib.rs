//! PNG chunk framing, CRC, image header and iTXt encoding/decoding for pngcarrier.
//!
//! This crate provides the low-level container format used to carry payloads
//! inside PNG images: building and scanning checksummed chunks, splicing chunks
//! into an existing container, and the `iTXt` textual record layout.
//!
//! Only the minimal PNG subset the carrier needs is understood: the signature,
//! `IHDR`, `IDAT`, `iTXt` and `IEND`. Every other chunk type is passed through
//! untouched by the reader.
//!
//! ## Container Format
//!
//! ```text
//! +----------------------+----------------------------+
//! | signature (8B)       | 89 50 4E 47 0D 0A 1A 0A    |
//! +----------------------+----------------------------+
//! | u32 len (BE)         | length of data             |
//! | type (4B)            | ascii chunk type           |
//! | data                 | len bytes                  |
//! | u32 crc (BE)         | CRC-32 over type || data   |
//! +----------------------+----------------------------+
//! | ... more chunks ...  | IHDR first, IEND last      |
//! +----------------------+----------------------------+
//! ```
//!
//! ## iTXt Layout
//!
//! ```text
//! keyword \0 | flag (1B) | method (1B) | language \0 | translated \0 | text
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod container;
pub mod crc;
pub mod error;
pub mod header;
pub mod text;

// Re-export main types
pub use chunk::{
    build_chunk, find_terminator, parse_chunks, splice_before_terminator, Chunk, ChunkReader,
    ChunkType, RawChunk, CHUNK_OVERHEAD,
};
pub use container::{has_signature, ContainerBuilder, PNG_SIGNATURE};
pub use crc::{chunk_crc, crc32};
pub use error::WireError;
pub use header::{ColorType, ImageHeader, IHDR_SIZE};
pub use text::{
    validate_keyword, TextEntry, COMPRESSION_METHOD_ZLIB, MAX_KEYWORD_LEN,
};
