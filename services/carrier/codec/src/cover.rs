//! Deterministic cover image generation.
//!
//! A cover is a 64x64 RGBA image made of a 16x16 grid of 4x4 cells, mirrored
//! left to right. The pattern and its single foreground color come from a
//! xorshift32 generator seeded with the FNV-1a hash of a seed string, so the
//! same seed always yields the same bytes. Pixels are never read back; the
//! cover only has to look like an ordinary image.

use crate::compression::compress;
use crate::error::CodecError;
use bytes::Bytes;
use carrier_wire::{Chunk, ChunkType, ContainerBuilder, ImageHeader};
use std::fmt::Write;

/// Cover width and height in pixels
pub const COVER_SIZE: u32 = 64;

/// Side of one pattern cell in pixels
pub const CELL_SIZE: u32 = 4;

/// Cells per row and column
pub const GRID: usize = (COVER_SIZE / CELL_SIZE) as usize;

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

const BACKGROUND: [u8; 4] = [0, 0, 0, 0];

/// 32-bit FNV-1a over the UTF-16 code units of `seed`
pub fn fnv1a(seed: &str) -> u32 {
    seed.encode_utf16().fold(FNV_OFFSET_BASIS, |h, unit| {
        (h ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
    })
}

/// Marsaglia xorshift32 (13/17/5)
#[derive(Debug, Clone)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    /// Create a generator; a zero state stays zero
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Next 32-bit draw
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

/// Fresh 8-byte random seed as 16 lowercase hex chars
pub fn random_seed() -> String {
    let bytes: [u8; 8] = rand::random();
    bytes.iter().fold(String::with_capacity(16), |mut s, b| {
        let _ = write!(s, "{:02x}", b);
        s
    })
}

/// A generated cover pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cover {
    seed: String,
    foreground: [u8; 4],
    pattern: [[bool; GRID]; GRID],
}

impl Cover {
    /// Generate the cover for `seed`
    pub fn generate(seed: &str) -> Self {
        let mut rng = XorShift32::new(fnv1a(seed));

        let mut channel = || 64 + ((rng.next_u32() & 0xff) as u8 & 0x7f);
        let foreground = [channel(), channel(), channel(), 255];

        let mut pattern = [[false; GRID]; GRID];
        let half = (GRID + 1) / 2;
        for row in pattern.iter_mut() {
            for x in 0..half {
                let on = rng.next_u32() & 1 == 1;
                row[x] = on;
                row[GRID - 1 - x] = on;
            }
        }

        Self {
            seed: seed.to_string(),
            foreground,
            pattern,
        }
    }

    /// Seed the cover was generated from
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Foreground RGBA color
    pub fn foreground(&self) -> [u8; 4] {
        self.foreground
    }

    /// Cell grid, `pattern()[row][column]`
    pub fn pattern(&self) -> &[[bool; GRID]; GRID] {
        &self.pattern
    }

    /// Unfiltered RGBA scanlines, each prefixed with filter type 0
    pub fn scanlines(&self) -> Vec<u8> {
        let stride = COVER_SIZE as usize * 4 + 1;
        let mut raw = Vec::with_capacity(stride * COVER_SIZE as usize);

        for y in 0..COVER_SIZE {
            raw.push(0);
            let row = &self.pattern[(y / CELL_SIZE) as usize];
            for x in 0..COVER_SIZE {
                let color = if row[(x / CELL_SIZE) as usize] {
                    self.foreground
                } else {
                    BACKGROUND
                };
                raw.extend_from_slice(&color);
            }
        }

        raw
    }

    /// Complete container with IHDR, IDAT and IEND
    pub fn to_container(&self, level: u32) -> Result<Bytes, CodecError> {
        let idat = compress(&self.scanlines(), level)?;
        let container = ContainerBuilder::new(ImageHeader::rgba8(COVER_SIZE, COVER_SIZE))
            .chunk(Chunk::new(ChunkType::IDAT, idat))
            .build()?;
        Ok(container)
    }
}

/// 1x1 fully transparent RGBA container
pub fn blank_container(level: u32) -> Result<Bytes, CodecError> {
    let idat = compress(&[0, 0, 0, 0, 0], level)?;
    let container = ContainerBuilder::new(ImageHeader::rgba8(1, 1))
        .chunk(Chunk::new(ChunkType::IDAT, idat))
        .build()?;
    Ok(container)
}
