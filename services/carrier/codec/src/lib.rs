//! Payload embedding and extraction for pngcarrier.
//!
//! An arbitrary payload is base64-encoded, split into parts of at most 32 KiB
//! of text, and each part is stored zlib-compressed in an `iTXt` chunk named
//! `payload-0001`, `payload-0002`, ... inside a small generated PNG. Decoding
//! collects those chunks in index order regardless of where they sit in the
//! file and reverses the process byte for byte.
//!
//! ## Example
//!
//! ```
//! let container = carrier_codec::encode(b"any bytes at all")?;
//! let payload = carrier_codec::decode(&container, "payload-")?;
//! assert_eq!(payload.as_ref(), b"any bytes at all");
//! # Ok::<(), carrier_codec::CodecError>(())
//! ```
//!
//! Every encode draws a fresh cover seed, so identical payloads never produce
//! identical files. Use [`encode_with_seed`] when byte-stable output matters.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compression;
pub mod cover;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod intercept;
pub mod part;

// Re-export main types
pub use compression::Framing;
pub use cover::{blank_container, random_seed, Cover};
pub use decoder::{decode, Decoder, DecoderConfig};
pub use encoder::{encode, encode_with_seed, CoverMode, EncodeReport, Encoder, EncoderConfig};
pub use error::CodecError;
pub use intercept::{reconstruct, reconstruct_with, Outcome, RECONSTRUCTED_CONTENT_TYPE};
pub use part::{DEFAULT_PART_SIZE, DEFAULT_PREFIX};
