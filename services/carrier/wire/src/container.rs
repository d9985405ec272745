//! Whole-container construction.

use crate::chunk::Chunk;
use crate::header::ImageHeader;
use bytes::{BufMut, Bytes, BytesMut};

/// PNG file signature
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Whether `bytes` starts with the PNG signature
pub fn has_signature(bytes: &[u8]) -> bool {
    bytes.len() >= PNG_SIGNATURE.len() && bytes[..PNG_SIGNATURE.len()] == PNG_SIGNATURE
}

/// Builder for a minimal container
///
/// IHDR is always written first and IEND is appended by [`build`](Self::build),
/// so a built container always satisfies the ordering invariant.
#[derive(Debug, Clone)]
pub struct ContainerBuilder {
    header: ImageHeader,
    chunks: Vec<Chunk>,
}

impl ContainerBuilder {
    /// Start a container with the given header
    pub fn new(header: ImageHeader) -> Self {
        Self {
            header,
            chunks: Vec::new(),
        }
    }

    /// Append a chunk after the header
    pub fn chunk(mut self, chunk: Chunk) -> Self {
        self.chunks.push(chunk);
        self
    }

    /// Build the container
    pub fn build(self) -> Result<Bytes, crate::WireError> {
        let header = self.header.to_chunk();
        let terminator = Chunk::terminator();
        let size = PNG_SIGNATURE.len()
            + header.encoded_size()
            + self.chunks.iter().map(Chunk::encoded_size).sum::<usize>()
            + terminator.encoded_size();

        let mut buf = BytesMut::with_capacity(size);
        buf.put_slice(&PNG_SIGNATURE);
        header.encode(&mut buf)?;
        for chunk in &self.chunks {
            chunk.encode(&mut buf)?;
        }
        terminator.encode(&mut buf)?;

        Ok(buf.freeze())
    }
}
