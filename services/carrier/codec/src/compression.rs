//! zlib compression for part text, with a raw-deflate fallback on inflate.
//!
//! Encoders in different runtimes disagree on whether the iTXt text carries a
//! zlib wrapper. Inflation tries the wrapped form first and falls back to raw
//! deflate; only when both fail is the part rejected.

use crate::error::CodecError;
use crate::part::DEFAULT_PART_SIZE;
use flate2::read::{DeflateEncoder, ZlibEncoder};
use flate2::{Compression, Decompress, FlushDecompress, Status};
use std::io::Read;
use tracing::{debug, warn};

/// Default ceiling on the inflated size of one block
pub const DEFAULT_MAX_INFLATED_LEN: usize = 64 * DEFAULT_PART_SIZE;

/// Which stream framing a compressed block turned out to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// RFC 1950 zlib wrapper around deflate
    Zlib,
    /// Bare RFC 1951 deflate
    Raw,
}

/// Compress with a zlib wrapper
pub fn compress(data: &[u8], level: u32) -> Result<Vec<u8>, CodecError> {
    let mut encoder = ZlibEncoder::new(data, Compression::new(level));
    let mut out = Vec::new();
    encoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Compress as bare deflate
pub fn compress_raw(data: &[u8], level: u32) -> Result<Vec<u8>, CodecError> {
    let mut encoder = DeflateEncoder::new(data, Compression::new(level));
    let mut out = Vec::new();
    encoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Inflate a block, accepting either framing
///
/// Output beyond `limit` bytes is rejected rather than buffered.
pub fn decompress(data: &[u8], limit: usize) -> Result<(Vec<u8>, Framing), CodecError> {
    match inflate(data, Framing::Zlib, limit) {
        Ok(out) => {
            debug!(in_len = data.len(), out_len = out.len(), "inflated zlib stream");
            Ok((out, Framing::Zlib))
        }
        Err(zlib_err) => {
            warn!(error = %zlib_err, "zlib inflate failed, retrying as raw deflate");
            match inflate(data, Framing::Raw, limit) {
                Ok(out) => {
                    debug!(in_len = data.len(), out_len = out.len(), "inflated raw deflate stream");
                    Ok((out, Framing::Raw))
                }
                Err(raw_err) => Err(CodecError::DecompressionFailure(format!(
                    "zlib: {}; raw deflate: {}",
                    zlib_err, raw_err
                ))),
            }
        }
    }
}

/// Inflate one complete stream; a stream that ends early is an error
fn inflate(data: &[u8], framing: Framing, limit: usize) -> Result<Vec<u8>, String> {
    let mut inflater = Decompress::new(framing == Framing::Zlib);
    let ceiling = limit.saturating_add(1);
    let mut out = Vec::with_capacity(data.len().saturating_mul(4).clamp(64, ceiling.max(64)));

    loop {
        if out.len() > limit {
            return Err(format!("inflated size exceeds {} bytes", limit));
        }
        if out.len() == out.capacity() {
            // one byte past the limit is enough to detect an overrun
            out.reserve(out.capacity().min(ceiling - out.len()).max(1));
        }

        let before_in = inflater.total_in();
        let before_out = inflater.total_out();
        let consumed = before_in as usize;

        let status = inflater
            .decompress_vec(&data[consumed..], &mut out, FlushDecompress::Finish)
            .map_err(|e| e.to_string())?;

        match status {
            Status::StreamEnd if out.len() > limit => {
                return Err(format!("inflated size exceeds {} bytes", limit));
            }
            Status::StreamEnd => return Ok(out),
            Status::Ok | Status::BufError => {
                let progressed =
                    inflater.total_in() != before_in || inflater.total_out() != before_out;
                let input_spent = inflater.total_in() as usize == data.len();
                if !progressed && (input_spent || out.len() < out.capacity()) {
                    return Err("truncated deflate stream".to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &[u8] = b"SGVsbG8sIGNhcnJpZXIhIFNHVnNiRzhzSUdOaGNuSnBaWEloIA==SGVsbG8sIGNhcnJpZXIh";
    const LIMIT: usize = DEFAULT_MAX_INFLATED_LEN;

    #[test]
    fn test_zlib_stream() {
        let packed = compress(TEXT, 6).unwrap();
        assert_eq!(packed[0], 0x78);

        let (out, framing) = decompress(&packed, LIMIT).unwrap();
        assert_eq!(out, TEXT);
        assert_eq!(framing, Framing::Zlib);
    }

    #[test]
    fn test_raw_stream_falls_back() {
        let packed = compress_raw(TEXT, 6).unwrap();

        let (out, framing) = decompress(&packed, LIMIT).unwrap();
        assert_eq!(out, TEXT);
        assert_eq!(framing, Framing::Raw);
    }

    #[test]
    fn test_large_output_grows_buffer() {
        let data = vec![b'A'; 1 << 20];
        let packed = compress(&data, 9).unwrap();
        assert!(packed.len() < 4096);

        let (out, _) = decompress(&packed, LIMIT).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_empty_input() {
        let packed = compress(b"", 6).unwrap();
        let (out, _) = decompress(&packed, LIMIT).unwrap();
        assert!(out.is_empty());

        assert!(matches!(
            decompress(&[], LIMIT),
            Err(CodecError::DecompressionFailure(_))
        ));
    }

    #[test]
    fn test_truncated_stream_fails() {
        let data: Vec<u8> = (0..20_000u32).map(|i| (i * 7 % 251) as u8).collect();
        let packed = compress(&data, 6).unwrap();
        let cut = &packed[..packed.len() / 2];

        assert!(matches!(
            decompress(cut, LIMIT),
            Err(CodecError::DecompressionFailure(_))
        ));
    }

    #[test]
    fn test_garbage_fails() {
        assert!(matches!(
            decompress(b"definitely not deflate data \xff\xff\xff", LIMIT),
            Err(CodecError::DecompressionFailure(_))
        ));
    }

    #[test]
    fn test_output_limit() {
        let data = vec![b'A'; 100_000];
        let packed = compress(&data, 9).unwrap();

        let (out, _) = decompress(&packed, data.len()).unwrap();
        assert_eq!(out.len(), data.len());

        assert!(matches!(
            decompress(&packed, data.len() - 1),
            Err(CodecError::DecompressionFailure(ref msg)) if msg.contains("exceeds")
        ));

        let raw = compress_raw(&data, 9).unwrap();
        assert!(matches!(
            decompress(&raw, 4096),
            Err(CodecError::DecompressionFailure(_))
        ));
    }
}
