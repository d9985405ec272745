//! Payload extraction.
//!
//! The decoder walks every chunk, keeps the iTXt entries whose keyword carries
//! the expected prefix, inflates them, and reassembles the base64 text by part
//! index. Physical chunk order is irrelevant.

use crate::compression::{decompress, DEFAULT_MAX_INFLATED_LEN};
use crate::error::CodecError;
use crate::part::{parse_index, Reassembler};
use bytes::Bytes;
use carrier_wire::{ChunkReader, ChunkType, TextEntry, WireError, COMPRESSION_METHOD_ZLIB};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Decoder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Reject containers whose chunk CRCs do not match
    pub verify_crc: bool,
    /// Largest inflated text accepted for a single part
    pub max_part_len: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            verify_crc: true,
            max_part_len: DEFAULT_MAX_INFLATED_LEN,
        }
    }
}

/// Payload decoder
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Create a decoder
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Active config
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    fn reader<'a>(&self, container: &'a [u8]) -> Result<ChunkReader<'a>, CodecError> {
        Ok(ChunkReader::new(container)?.verify_crc(self.config.verify_crc))
    }

    /// Every iTXt entry in file order
    pub fn entries(&self, container: &[u8]) -> Result<Vec<TextEntry>, CodecError> {
        let mut entries = Vec::new();
        for chunk in self.reader(container)? {
            let chunk = chunk?;
            if chunk.chunk_type == ChunkType::ITXT {
                entries.push(TextEntry::parse(chunk.data)?);
            }
        }
        Ok(entries)
    }

    /// Recover the payload carried under `prefix`
    pub fn decode(&self, container: &[u8], prefix: &str) -> Result<Bytes, CodecError> {
        let mut reassembler = Reassembler::new(prefix);
        let mut skipped = 0usize;

        for chunk in self.reader(container)? {
            let chunk = chunk?;
            if chunk.chunk_type != ChunkType::ITXT {
                continue;
            }

            let entry = TextEntry::parse(chunk.data)?;
            let Some(index) = parse_index(&entry.keyword, prefix)? else {
                skipped += 1;
                continue;
            };

            let text = if entry.compressed {
                if entry.compression_method != COMPRESSION_METHOD_ZLIB {
                    return Err(WireError::CompressionMethod(entry.compression_method).into());
                }
                let (text, _) = decompress(&entry.text, self.config.max_part_len)?;
                Bytes::from(text)
            } else {
                entry.text
            };

            reassembler.insert(index, text)?;
        }

        let parts = reassembler.len();
        let payload = reassembler.finish()?;

        debug!(
            container_len = container.len(),
            parts,
            skipped,
            payload_len = payload.len(),
            "decoded payload"
        );

        Ok(payload)
    }
}

/// Recover the payload under `prefix` with default settings
pub fn decode(container: &[u8], prefix: &str) -> Result<Bytes, CodecError> {
    Decoder::default().decode(container, prefix)
}
