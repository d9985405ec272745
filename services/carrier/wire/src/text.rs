//! `iTXt` textual metadata entries.
//!
//! The text body is carried as opaque bytes; compressing or inflating it is the
//! caller's business. The entry only records whether it claims to be compressed
//! and with which method.

use crate::chunk::{Chunk, ChunkType};
use crate::error::WireError;
use bytes::{BufMut, Bytes, BytesMut};

/// Longest keyword PNG allows
pub const MAX_KEYWORD_LEN: usize = 79;

/// The only defined compression method (zlib deflate)
pub const COMPRESSION_METHOD_ZLIB: u8 = 0;

/// Parsed or to-be-written iTXt entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
    /// Latin-1 keyword
    pub keyword: String,
    /// Whether `text` is compressed
    pub compressed: bool,
    /// Compression method byte
    pub compression_method: u8,
    /// Language tag, usually empty
    pub language_tag: String,
    /// Translated keyword, usually empty
    pub translated_keyword: String,
    /// Text body, raw or compressed
    pub text: Bytes,
}

impl TextEntry {
    /// Create an uncompressed entry
    pub fn new(keyword: impl Into<String>, text: impl Into<Bytes>) -> Result<Self, WireError> {
        let keyword = keyword.into();
        validate_keyword(&keyword)?;

        Ok(Self {
            keyword,
            compressed: false,
            compression_method: COMPRESSION_METHOD_ZLIB,
            language_tag: String::new(),
            translated_keyword: String::new(),
            text: text.into(),
        })
    }

    /// Flag `text` as zlib-compressed
    pub fn mark_compressed(mut self) -> Self {
        self.compressed = true;
        self.compression_method = COMPRESSION_METHOD_ZLIB;
        self
    }

    /// Serialized body length
    pub fn encoded_len(&self) -> usize {
        self.keyword.chars().count()
            + 1
            + 2
            + self.language_tag.len()
            + 1
            + self.translated_keyword.len()
            + 1
            + self.text.len()
    }

    /// Serialize the chunk body
    pub fn encode(&self) -> Result<Bytes, WireError> {
        let keyword = latin1_bytes(&self.keyword)?;
        if self.language_tag.contains('\0') || self.translated_keyword.contains('\0') {
            return Err(WireError::MalformedText);
        }

        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_slice(&keyword);
        buf.put_u8(0);
        buf.put_u8(u8::from(self.compressed));
        buf.put_u8(self.compression_method);
        buf.put_slice(self.language_tag.as_bytes());
        buf.put_u8(0);
        buf.put_slice(self.translated_keyword.as_bytes());
        buf.put_u8(0);
        buf.put_slice(&self.text);

        Ok(buf.freeze())
    }

    /// Serialize as an iTXt chunk
    pub fn into_chunk(self) -> Result<Chunk, WireError> {
        Ok(Chunk::new(ChunkType::ITXT, self.encode()?))
    }

    /// Parse a chunk body
    pub fn parse(data: &[u8]) -> Result<Self, WireError> {
        let kw_end = find_zero(data, 0)?;
        let keyword: String = data[..kw_end].iter().map(|&b| b as char).collect();

        let mut p = kw_end + 1;
        if data.len() < p + 2 {
            return Err(WireError::MalformedText);
        }
        let compressed = data[p] == 1;
        let compression_method = data[p + 1];
        p += 2;

        let lang_end = find_zero(data, p)?;
        let language_tag = String::from_utf8_lossy(&data[p..lang_end]).into_owned();
        p = lang_end + 1;

        let trans_end = find_zero(data, p)?;
        let translated_keyword = String::from_utf8_lossy(&data[p..trans_end]).into_owned();
        p = trans_end + 1;

        Ok(Self {
            keyword,
            compressed,
            compression_method,
            language_tag,
            translated_keyword,
            text: Bytes::copy_from_slice(&data[p..]),
        })
    }
}

/// Check a keyword is 1-79 latin1 characters with no zero byte
pub fn validate_keyword(keyword: &str) -> Result<(), WireError> {
    let bytes = latin1_bytes(keyword)?;
    if bytes.is_empty() || bytes.len() > MAX_KEYWORD_LEN {
        return Err(WireError::Keyword(keyword.to_string()));
    }
    Ok(())
}

fn latin1_bytes(s: &str) -> Result<Vec<u8>, WireError> {
    s.chars()
        .map(|c| match u32::from(c) {
            0 => Err(WireError::Keyword(s.to_string())),
            v if v <= 0xFF => Ok(v as u8),
            _ => Err(WireError::Keyword(s.to_string())),
        })
        .collect()
}

fn find_zero(data: &[u8], from: usize) -> Result<usize, WireError> {
    data.get(from..)
        .and_then(|rest| rest.iter().position(|&b| b == 0))
        .map(|i| from + i)
        .ok_or(WireError::MalformedText)
}
