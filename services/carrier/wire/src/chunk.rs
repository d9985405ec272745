//! Chunk framing for the container format.
//!
//! Writing goes through [`Chunk`]; reading goes through [`ChunkReader`], a lazy
//! iterator over borrowed [`RawChunk`]s that stops after the `IEND` chunk.

use crate::container::{has_signature, PNG_SIGNATURE};
use crate::crc::chunk_crc;
use crate::error::WireError;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Bytes of framing around chunk data: length, type and CRC
pub const CHUNK_OVERHEAD: usize = 12;

/// Four-byte chunk type identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkType(pub [u8; 4]);

impl ChunkType {
    /// Image header
    pub const IHDR: Self = Self(*b"IHDR");
    /// Image data
    pub const IDAT: Self = Self(*b"IDAT");
    /// International textual data
    pub const ITXT: Self = Self(*b"iTXt");
    /// Image end
    pub const IEND: Self = Self(*b"IEND");

    /// Raw type bytes
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<[u8; 4]> for ChunkType {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkType({})", self)
    }
}

/// Owned chunk ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk type
    pub chunk_type: ChunkType,
    /// Chunk body
    pub data: Bytes,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(chunk_type: ChunkType, data: impl Into<Bytes>) -> Self {
        Self {
            chunk_type,
            data: data.into(),
        }
    }

    /// Empty IEND chunk
    pub fn terminator() -> Self {
        Self::new(ChunkType::IEND, Bytes::new())
    }

    /// CRC over type || data
    pub fn crc(&self) -> u32 {
        chunk_crc(self.chunk_type.as_bytes(), &self.data)
    }

    /// Total size when encoded
    pub fn encoded_size(&self) -> usize {
        CHUNK_OVERHEAD + self.data.len()
    }

    /// Append the framed chunk to a buffer
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), WireError> {
        let len = u32::try_from(self.data.len()).map_err(|_| WireError::Size(self.data.len()))?;

        buf.reserve(self.encoded_size());
        buf.put_u32(len);
        buf.put_slice(self.chunk_type.as_bytes());
        buf.put_slice(&self.data);
        buf.put_u32(self.crc());

        Ok(())
    }

    /// Encode into a standalone buffer
    pub fn to_bytes(&self) -> Result<Bytes, WireError> {
        let mut buf = BytesMut::with_capacity(self.encoded_size());
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }
}

/// Frame `data` as a chunk of the given type
pub fn build_chunk(chunk_type: ChunkType, data: &[u8]) -> Result<Bytes, WireError> {
    Chunk::new(chunk_type, Bytes::copy_from_slice(data)).to_bytes()
}

/// Chunk borrowed from a container buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'a> {
    /// Chunk type
    pub chunk_type: ChunkType,
    /// Chunk body
    pub data: &'a [u8],
    /// CRC as stored in the container
    pub declared_crc: u32,
    /// Offset of the length field within the container
    pub offset: usize,
}

impl<'a> RawChunk<'a> {
    /// CRC recomputed from type and data
    pub fn computed_crc(&self) -> u32 {
        chunk_crc(self.chunk_type.as_bytes(), self.data)
    }

    /// Whether the stored CRC matches
    pub fn crc_ok(&self) -> bool {
        self.declared_crc == self.computed_crc()
    }

    /// Size of the chunk including framing
    pub fn encoded_len(&self) -> usize {
        CHUNK_OVERHEAD + self.data.len()
    }

    /// Copy into an owned chunk
    pub fn to_chunk(&self) -> Chunk {
        Chunk::new(self.chunk_type, Bytes::copy_from_slice(self.data))
    }
}

/// Lazy chunk scanner over a complete container
///
/// Yields each chunk in file order and ends after `IEND`. A scan that runs off
/// the end of the buffer yields one error and then stops.
#[derive(Debug, Clone)]
pub struct ChunkReader<'a> {
    buf: &'a [u8],
    offset: usize,
    verify_crc: bool,
    done: bool,
}

impl<'a> ChunkReader<'a> {
    /// Check the signature and position the reader at the first chunk
    pub fn new(container: &'a [u8]) -> Result<Self, WireError> {
        if !has_signature(container) {
            return Err(WireError::InvalidSignature);
        }

        Ok(Self {
            buf: container,
            offset: PNG_SIGNATURE.len(),
            verify_crc: false,
            done: false,
        })
    }

    /// Recompute and check every chunk's CRC while scanning
    pub fn verify_crc(mut self, verify: bool) -> Self {
        self.verify_crc = verify;
        self
    }

    fn read_chunk(&mut self) -> Result<RawChunk<'a>, WireError> {
        let offset = self.offset;
        let remaining = self.buf.len() - offset;

        if remaining == 0 {
            return Err(WireError::MissingTerminator);
        }
        if remaining < CHUNK_OVERHEAD {
            return Err(WireError::TruncatedChunk { offset });
        }

        let len = u32::from_be_bytes([
            self.buf[offset],
            self.buf[offset + 1],
            self.buf[offset + 2],
            self.buf[offset + 3],
        ]) as usize;
        let chunk_type = ChunkType([
            self.buf[offset + 4],
            self.buf[offset + 5],
            self.buf[offset + 6],
            self.buf[offset + 7],
        ]);

        let data_start = offset + 8;
        let crc_end = data_start
            .checked_add(len)
            .and_then(|end| end.checked_add(4))
            .filter(|&end| end <= self.buf.len())
            .ok_or(WireError::TruncatedChunk { offset })?;
        let data_end = crc_end - 4;

        let declared_crc = u32::from_be_bytes([
            self.buf[data_end],
            self.buf[data_end + 1],
            self.buf[data_end + 2],
            self.buf[data_end + 3],
        ]);

        let raw = RawChunk {
            chunk_type,
            data: &self.buf[data_start..data_end],
            declared_crc,
            offset,
        };

        if self.verify_crc {
            let actual = raw.computed_crc();
            if actual != declared_crc {
                return Err(WireError::ChecksumMismatch {
                    chunk_type: chunk_type.to_string(),
                    expected: declared_crc,
                    actual,
                });
            }
        }

        trace!(chunk = %chunk_type, offset, len, "read chunk");
        self.offset = crc_end;
        Ok(raw)
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Result<RawChunk<'a>, WireError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_chunk() {
            Ok(raw) => {
                if raw.chunk_type == ChunkType::IEND {
                    self.done = true;
                }
                Some(Ok(raw))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Start scanning a container without CRC verification
pub fn parse_chunks(container: &[u8]) -> Result<ChunkReader<'_>, WireError> {
    ChunkReader::new(container)
}

/// Offset of the IEND chunk's length field
pub fn find_terminator(container: &[u8]) -> Result<usize, WireError> {
    for chunk in ChunkReader::new(container)? {
        let chunk = chunk?;
        if chunk.chunk_type == ChunkType::IEND {
            return Ok(chunk.offset);
        }
    }
    Err(WireError::MissingTerminator)
}

/// Copy of `container` with `chunks` inserted immediately before IEND
pub fn splice_before_terminator(container: &[u8], chunks: &[Chunk]) -> Result<Bytes, WireError> {
    let iend = find_terminator(container)?;
    let extra: usize = chunks.iter().map(Chunk::encoded_size).sum();

    let mut buf = BytesMut::with_capacity(container.len() + extra);
    buf.put_slice(&container[..iend]);
    for chunk in chunks {
        chunk.encode(&mut buf)?;
    }
    buf.put_slice(&container[iend..]);

    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(chunks: &[Chunk]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_slice(&PNG_SIGNATURE);
        for chunk in chunks {
            chunk.encode(&mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn test_build_chunk_layout() {
        let bytes = build_chunk(ChunkType::ITXT, b"abc").unwrap();

        assert_eq!(bytes.len(), CHUNK_OVERHEAD + 3);
        assert_eq!(&bytes[0..4], &3u32.to_be_bytes());
        assert_eq!(&bytes[4..8], b"iTXt");
        assert_eq!(&bytes[8..11], b"abc");
        assert_eq!(&bytes[11..15], &chunk_crc(b"iTXt", b"abc").to_be_bytes());
    }

    #[test]
    fn test_terminator_encoding() {
        let bytes = Chunk::terminator().to_bytes().unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82]
        );
    }

    #[test]
    fn test_reader_stops_after_iend() {
        let mut buf = container(&[
            Chunk::new(ChunkType::IDAT, &b"xx"[..]),
            Chunk::terminator(),
        ]);
        buf.extend_from_slice(b"trailing garbage");

        let chunks: Vec<_> = parse_chunks(&buf)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chunk_type, ChunkType::IDAT);
        assert_eq!(chunks[0].offset, 8);
        assert_eq!(chunks[0].data, b"xx");
        assert!(chunks[0].crc_ok());
        assert_eq!(chunks[1].chunk_type, ChunkType::IEND);
    }

    #[test]
    fn test_invalid_signature() {
        let mut buf = container(&[Chunk::terminator()]);
        buf[1] = b'X';
        assert_eq!(parse_chunks(&buf).unwrap_err(), WireError::InvalidSignature);
        assert_eq!(parse_chunks(&buf[..4]).unwrap_err(), WireError::InvalidSignature);
    }

    #[test]
    fn test_truncated_chunk() {
        let buf = container(&[Chunk::new(ChunkType::IDAT, vec![7u8; 32]), Chunk::terminator()]);
        let cut = &buf[..8 + 20];

        let err = parse_chunks(cut).unwrap().next().unwrap().unwrap_err();
        assert_eq!(err, WireError::TruncatedChunk { offset: 8 });
    }

    #[test]
    fn test_partial_header_is_truncation() {
        let mut buf = container(&[Chunk::new(ChunkType::IDAT, &b"x"[..])]);
        buf.extend_from_slice(&[0, 0, 0]);

        let results: Vec<_> = parse_chunks(&buf).unwrap().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(WireError::TruncatedChunk { .. })));
    }

    #[test]
    fn test_missing_terminator() {
        let buf = container(&[Chunk::new(ChunkType::IDAT, &b"x"[..])]);
        assert_eq!(find_terminator(&buf).unwrap_err(), WireError::MissingTerminator);
    }

    #[test]
    fn test_huge_declared_length() {
        let mut buf = PNG_SIGNATURE.to_vec();
        buf.extend_from_slice(&u32::MAX.to_be_bytes());
        buf.extend_from_slice(b"IDAT");
        buf.extend_from_slice(&[0u8; 8]);

        let err = parse_chunks(&buf).unwrap().next().unwrap().unwrap_err();
        assert_eq!(err, WireError::TruncatedChunk { offset: 8 });
    }

    #[test]
    fn test_crc_verification() {
        let mut buf = container(&[Chunk::new(ChunkType::IDAT, &b"data"[..]), Chunk::terminator()]);
        // flip a data byte, leaving the stored crc stale
        buf[8 + 8] ^= 0xFF;

        let lenient: Result<Vec<_>, _> = parse_chunks(&buf).unwrap().collect();
        assert!(lenient.is_ok());

        let strict: Result<Vec<_>, _> = parse_chunks(&buf).unwrap().verify_crc(true).collect();
        match strict {
            Err(WireError::ChecksumMismatch { chunk_type, .. }) => assert_eq!(chunk_type, "IDAT"),
            other => panic!("expected crc mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_splice_before_terminator() {
        let base = container(&[Chunk::new(ChunkType::IHDR, vec![0u8; 13]), Chunk::terminator()]);
        let extra = [
            Chunk::new(ChunkType::ITXT, &b"one"[..]),
            Chunk::new(ChunkType::ITXT, &b"two"[..]),
        ];

        let spliced = splice_before_terminator(&base, &extra).unwrap();
        let types: Vec<ChunkType> = parse_chunks(&spliced)
            .unwrap()
            .map(|c| c.unwrap().chunk_type)
            .collect();

        assert_eq!(
            types,
            vec![ChunkType::IHDR, ChunkType::ITXT, ChunkType::ITXT, ChunkType::IEND]
        );
        assert_eq!(spliced.len(), base.len() + 2 * CHUNK_OVERHEAD + 6);
    }

    #[test]
    fn test_chunk_type_display() {
        assert_eq!(ChunkType::ITXT.to_string(), "iTXt");
        assert_eq!(ChunkType([0, b'A', b'B', b'C']).to_string(), "\\x00ABC");
    }
}
