//! Payload embedding.
//!
//! The payload is base64-encoded, cut into parts, each part zlib-compressed
//! into an iTXt entry, and all entries spliced into a freshly generated cover
//! just before its IEND chunk.

use crate::compression::compress;
use crate::cover::{blank_container, random_seed, Cover};
use crate::error::CodecError;
use crate::part::{keyword, Splitter, DEFAULT_PART_SIZE, DEFAULT_PREFIX};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use carrier_wire::{splice_before_terminator, validate_keyword, Chunk, TextEntry};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default zlib level for part text and cover pixels
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Base image the payload is spliced into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverMode {
    /// Seeded 64x64 mirrored pattern
    #[default]
    Pattern,
    /// 1x1 transparent pixel
    Blank,
}

/// Encoder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Keyword prefix for payload entries
    pub prefix: String,
    /// Maximum base64 characters per part
    pub part_size: usize,
    /// zlib level, 0..=9
    pub compression_level: u32,
    /// Base image kind
    pub cover: CoverMode,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            part_size: DEFAULT_PART_SIZE,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            cover: CoverMode::Pattern,
        }
    }
}

/// What an encode produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodeReport {
    /// Number of iTXt parts written
    pub parts: usize,
    /// Cover seed, absent for blank covers
    pub seed: Option<String>,
    /// Size of the finished container
    pub container_len: usize,
}

/// Payload encoder
#[derive(Debug, Clone)]
pub struct Encoder {
    config: EncoderConfig,
    splitter: Splitter,
}

impl Encoder {
    /// Create an encoder, validating the config
    pub fn new(config: EncoderConfig) -> Result<Self, CodecError> {
        if config.compression_level > 9 {
            return Err(CodecError::InvalidConfig(format!(
                "compression level {} is above 9",
                config.compression_level
            )));
        }
        validate_keyword(&keyword(&config.prefix, 1))
            .map_err(|e| CodecError::InvalidConfig(e.to_string()))?;
        let splitter = Splitter::new(config.part_size)?;

        Ok(Self { config, splitter })
    }

    /// Active config
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Embed `payload` into a cover with a fresh random seed
    pub fn encode(&self, payload: &[u8]) -> Result<Bytes, CodecError> {
        self.encode_report(payload, None).map(|(bytes, _)| bytes)
    }

    /// Embed `payload` into the cover generated from `seed`
    pub fn encode_with_seed(&self, payload: &[u8], seed: &str) -> Result<Bytes, CodecError> {
        self.encode_report(payload, Some(seed)).map(|(bytes, _)| bytes)
    }

    /// Embed `payload` and describe the result
    pub fn encode_report(
        &self,
        payload: &[u8],
        seed: Option<&str>,
    ) -> Result<(Bytes, EncodeReport), CodecError> {
        let chunks = self.payload_chunks(payload)?;

        let (base, seed) = match self.config.cover {
            CoverMode::Pattern => {
                let seed = seed.map(str::to_string).unwrap_or_else(random_seed);
                let base = Cover::generate(&seed).to_container(self.config.compression_level)?;
                (base, Some(seed))
            }
            CoverMode::Blank => (blank_container(self.config.compression_level)?, None),
        };

        let container = splice_before_terminator(&base, &chunks)?;
        let report = EncodeReport {
            parts: chunks.len(),
            seed,
            container_len: container.len(),
        };

        debug!(
            payload_len = payload.len(),
            parts = report.parts,
            container_len = report.container_len,
            seed = ?report.seed,
            "encoded payload"
        );

        Ok((container, report))
    }

    /// iTXt chunks carrying `payload`, in part order
    pub fn payload_chunks(&self, payload: &[u8]) -> Result<Vec<Chunk>, CodecError> {
        let text = BASE64.encode(payload);
        let parts = self.splitter.split(&text)?;

        parts
            .iter()
            .map(|part| -> Result<Chunk, CodecError> {
                let packed = compress(part.text.as_bytes(), self.config.compression_level)?;
                let entry = TextEntry::new(keyword(&self.config.prefix, part.index), packed)?
                    .mark_compressed();
                Ok(entry.into_chunk()?)
            })
            .collect()
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self {
            config: EncoderConfig::default(),
            splitter: Splitter::default(),
        }
    }
}

/// Embed `payload` with default settings and a random cover
pub fn encode(payload: &[u8]) -> Result<Bytes, CodecError> {
    Encoder::default().encode(payload)
}

/// Embed `payload` with default settings and a seeded cover
pub fn encode_with_seed(payload: &[u8], seed: &str) -> Result<Bytes, CodecError> {
    Encoder::default().encode_with_seed(payload, seed)
}
