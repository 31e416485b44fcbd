//! Sector codec dispatch

use super::algorithms::{adpcm, huffman, pkware, zlib};
use super::methods::CompressionMethod;
use crate::{Error, Result};

/// Decompress a tagged sector
///
/// The first byte names the codec chain; the rest is its payload. Tags outside
/// the supported set fail with [`Error::UnsupportedCodec`].
pub fn decompress(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let (&tag, payload) = data
        .split_first()
        .ok_or_else(|| Error::compression("Empty compressed data"))?;

    if payload.is_empty() {
        return Err(Error::compression(format!(
            "Compressed sector with tag 0x{tag:02X} has no payload"
        )));
    }

    let method = CompressionMethod::from_tag(tag).ok_or(Error::UnsupportedCodec { tag })?;

    log::trace!(
        "Decompressing {} bytes to {expected_size} bytes with {method:?}",
        payload.len()
    );

    match method {
        CompressionMethod::Zlib => zlib::decompress(payload, expected_size),
        CompressionMethod::PKWare => pkware::decompress(payload),
        CompressionMethod::HuffmanAdpcmMono => {
            adpcm::decompress_mono(&huffman::decompress(payload)?)
        }
        CompressionMethod::HuffmanAdpcmStereo => {
            adpcm::decompress_stereo(&huffman::decompress(payload)?)
        }
    }
}

/// Explode an untagged sector from a file stored with the implode flag only
pub fn explode(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Err(Error::compression("Empty imploded data"));
    }
    pkware::decompress(data)
}
