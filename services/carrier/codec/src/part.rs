//! Splitting base64 text into numbered parts and putting it back together.
//!
//! Parts are addressed by a 1-based index written into the iTXt keyword as
//! `<prefix><index>`, zero-padded to at least [`INDEX_WIDTH`] digits. Wider
//! indices are written in full, so the numeric order survives past 9999.

use crate::error::CodecError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use std::collections::BTreeMap;

/// Default keyword prefix
pub const DEFAULT_PREFIX: &str = "payload-";

/// Default maximum base64 characters per part (32 KiB)
pub const DEFAULT_PART_SIZE: usize = 32 * 1024;

/// Minimum digits in a keyword index
pub const INDEX_WIDTH: usize = 4;

/// One slice of the base64 text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part<'a> {
    /// 1-based position
    pub index: u32,
    /// Base64 characters in this part
    pub text: &'a str,
}

/// Keyword for a part index
pub fn keyword(prefix: &str, index: u32) -> String {
    format!("{}{:0width$}", prefix, index, width = INDEX_WIDTH)
}

/// Part index encoded in `keyword`
///
/// Returns `Ok(None)` for keywords outside `prefix`, and `MalformedIndex` when
/// the suffix is not a positive decimal number.
pub fn parse_index(keyword: &str, prefix: &str) -> Result<Option<u32>, CodecError> {
    let Some(suffix) = keyword.strip_prefix(prefix) else {
        return Ok(None);
    };

    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::MalformedIndex(keyword.to_string()));
    }

    match suffix.parse::<u32>() {
        Ok(0) | Err(_) => Err(CodecError::MalformedIndex(keyword.to_string())),
        Ok(index) => Ok(Some(index)),
    }
}

/// Splitter for cutting base64 text into parts
#[derive(Debug, Clone)]
pub struct Splitter {
    part_size: usize,
}

impl Splitter {
    /// Create a splitter; `part_size` must be non-zero
    pub fn new(part_size: usize) -> Result<Self, CodecError> {
        if part_size == 0 {
            return Err(CodecError::InvalidConfig("part size must be non-zero".to_string()));
        }
        Ok(Self { part_size })
    }

    /// Cut `text` into contiguous parts
    ///
    /// Empty text still yields a single empty part so that an empty payload
    /// produces a decodable container.
    pub fn split<'a>(&self, text: &'a str) -> Result<Vec<Part<'a>>, CodecError> {
        if text.is_empty() {
            return Ok(vec![Part { index: 1, text }]);
        }

        // base64 is pure ascii, so byte offsets are char boundaries
        let total_parts = text.len().div_ceil(self.part_size);
        let mut parts = Vec::with_capacity(total_parts);
        let mut offset: usize = 0;

        for part_no in 0..total_parts {
            let end = offset.saturating_add(self.part_size).min(text.len());
            let index = u32::try_from(part_no + 1)
                .map_err(|_| CodecError::InvalidConfig("too many parts".to_string()))?;
            parts.push(Part {
                index,
                text: &text[offset..end],
            });
            offset = end;
        }

        Ok(parts)
    }
}

impl Default for Splitter {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
        }
    }
}

/// Reassembler collecting decoded part text in index order
#[derive(Debug)]
pub struct Reassembler {
    prefix: String,
    parts: BTreeMap<u32, Bytes>,
}

impl Reassembler {
    /// Create a reassembler for entries under `prefix`
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            parts: BTreeMap::new(),
        }
    }

    /// Number of parts collected so far
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether no parts have been collected
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Add a part's text
    pub fn insert(&mut self, index: u32, text: impl Into<Bytes>) -> Result<(), CodecError> {
        if self.parts.insert(index, text.into()).is_some() {
            return Err(CodecError::DuplicateIndex(index));
        }
        Ok(())
    }

    /// Concatenate parts in index order and decode the base64
    pub fn finish(self) -> Result<Bytes, CodecError> {
        if self.parts.is_empty() {
            return Err(CodecError::NoMatchingEntries(self.prefix));
        }

        let mut expected = 1u32;
        for &index in self.parts.keys() {
            if index != expected {
                return Err(CodecError::MissingPart(expected));
            }
            expected = expected.saturating_add(1);
        }

        let total: usize = self.parts.values().map(Bytes::len).sum();
        let mut text = Vec::with_capacity(total);
        for part in self.parts.values() {
            text.extend(part.iter().copied().filter(|b| !b.is_ascii_whitespace()));
        }

        let payload = BASE64.decode(&text)?;
        Ok(Bytes::from(payload))
    }
}
