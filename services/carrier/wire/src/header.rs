//! Image header (IHDR) encoding and decoding.
//!
//! The carrier only ever writes 8-bit RGBA images, but the header is decoded
//! in full so that `inspect` can report what a container claims to be.

use crate::chunk::{Chunk, ChunkType};
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

/// IHDR body size in bytes
pub const IHDR_SIZE: usize = 13;

/// PNG color types
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorType {
    /// Grayscale
    Grayscale = 0,
    /// Truecolor
    Rgb = 2,
    /// Palette indices
    Indexed = 3,
    /// Grayscale with alpha
    GrayscaleAlpha = 4,
    /// Truecolor with alpha
    Rgba = 6,
}

impl TryFrom<u8> for ColorType {
    type Error = crate::WireError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ColorType::Grayscale),
            2 => Ok(ColorType::Rgb),
            3 => Ok(ColorType::Indexed),
            4 => Ok(ColorType::GrayscaleAlpha),
            6 => Ok(ColorType::Rgba),
            _ => Err(crate::WireError::Header),
        }
    }
}

/// IHDR fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHeader {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bits per sample
    pub bit_depth: u8,
    /// Color type
    pub color_type: ColorType,
    /// Compression method (0 = deflate)
    pub compression: u8,
    /// Filter method (0 = adaptive)
    pub filter: u8,
    /// Interlace method (0 = none)
    pub interlace: u8,
}

impl ImageHeader {
    /// 8-bit RGBA, non-interlaced
    pub fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bit_depth: 8,
            color_type: ColorType::Rgba,
            compression: 0,
            filter: 0,
            interlace: 0,
        }
    }

    /// Encode the header body (big-endian)
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.width);
        buf.put_u32(self.height);
        buf.put_u8(self.bit_depth);
        buf.put_u8(self.color_type as u8);
        buf.put_u8(self.compression);
        buf.put_u8(self.filter);
        buf.put_u8(self.interlace);
    }

    /// Decode a header body
    pub fn decode(data: &[u8]) -> Result<Self, crate::WireError> {
        if data.len() != IHDR_SIZE {
            return Err(crate::WireError::Header);
        }

        Ok(Self {
            width: u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
            height: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            bit_depth: data[8],
            color_type: ColorType::try_from(data[9])?,
            compression: data[10],
            filter: data[11],
            interlace: data[12],
        })
    }

    /// Wrap as an IHDR chunk
    pub fn to_chunk(&self) -> Chunk {
        let mut buf = BytesMut::with_capacity(IHDR_SIZE);
        self.encode(&mut buf);
        Chunk::new(ChunkType::IHDR, buf.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba8_layout() {
        let chunk = ImageHeader::rgba8(64, 64).to_chunk();

        assert_eq!(chunk.chunk_type, ChunkType::IHDR);
        assert_eq!(
            chunk.data.as_ref(),
            &[0, 0, 0, 64, 0, 0, 0, 64, 8, 6, 0, 0, 0]
        );
    }

    #[test]
    fn test_decode() {
        let header = ImageHeader::decode(&[0, 0, 1, 0, 0, 0, 0, 2, 16, 2, 0, 0, 1]).unwrap();
        assert_eq!(header.width, 256);
        assert_eq!(header.height, 2);
        assert_eq!(header.bit_depth, 16);
        assert_eq!(header.color_type, ColorType::Rgb);
        assert_eq!(header.interlace, 1);
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(ImageHeader::decode(&[0u8; 12]).is_err());

        let mut data = [0u8; IHDR_SIZE];
        data[9] = 5;
        assert!(ImageHeader::decode(&data).is_err());
    }
}
