//! Sector decompression for MPQ files
//!
//! Compressed sectors start with a codec tag. Diablo II archives use zlib and
//! PKWARE DCL for data files and a Huffman plus ADPCM chain for audio. Files
//! stored with the implode flag alone carry PKWARE data without a tag.

mod algorithms;
mod decompress;
mod methods;

pub use decompress::{decompress, explode};
pub use methods::{CompressionMethod, flags};

/// Compress `data` and prefix the codec tag, producing a sector the reader
/// accepts
#[cfg(any(test, feature = "test-utils"))]
pub fn compress(data: &[u8], method: CompressionMethod) -> crate::Result<Vec<u8>> {
    let payload = match method {
        CompressionMethod::Zlib => algorithms::zlib::compress(data)?,
        CompressionMethod::PKWare => algorithms::pkware::compress(data)?,
        CompressionMethod::HuffmanAdpcmMono => {
            let adpcm = algorithms::adpcm::encode::compress(data, 1, 5)?;
            algorithms::huffman::encode::compress(&adpcm, 1)?
        }
        CompressionMethod::HuffmanAdpcmStereo => {
            let adpcm = algorithms::adpcm::encode::compress(data, 2, 5)?;
            algorithms::huffman::encode::compress(&adpcm, 1)?
        }
    };

    let mut out = Vec::with_capacity(payload.len() + 1);
    out.push(method.tag());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Implode `data` without a tag, as stored in IMPLODE-only files
#[cfg(any(test, feature = "test-utils"))]
pub fn implode(data: &[u8]) -> crate::Result<Vec<u8>> {
    algorithms::pkware::compress(data)
}
