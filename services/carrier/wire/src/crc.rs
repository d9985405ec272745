//! CRC-32 as used by PNG chunks.
//!
//! Reflected polynomial 0xEDB88320, register seeded with all ones and the
//! result complemented. `crc32fast` implements exactly this variant.

use crc32fast::Hasher;

/// CRC-32 over an arbitrary byte slice
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// CRC-32 over a chunk's type followed by its data
pub fn chunk_crc(chunk_type: &[u8; 4], data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    hasher.finalize()
}
