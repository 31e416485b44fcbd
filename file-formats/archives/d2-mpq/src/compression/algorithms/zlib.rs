//! Zlib decompression

use crate::{Error, Result};
use flate2::read::ZlibDecoder;
use std::io::Read;

const MAX_PREALLOCATION: usize = 1 << 20;

/// Inflate a zlib stream holding at most `expected_size` bytes
///
/// Output past `expected_size` is an error; the decoder never produces more
/// than one byte beyond it.
pub(crate) fn decompress(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data).take(expected_size as u64 + 1);
    let mut decompressed = Vec::with_capacity(expected_size.min(MAX_PREALLOCATION));

    decoder.read_to_end(&mut decompressed).map_err(|e| {
        log::debug!("Zlib decompression failed: {e}");
        log::trace!(
            "First 16 bytes of data: {:02X?}",
            &data[..16.min(data.len())]
        );
        Error::compression(format!("Zlib decompression failed: {e}"))
    })?;

    if decompressed.len() > expected_size {
        return Err(Error::compression(format!(
            "Zlib stream inflates past the expected {expected_size} bytes"
        )));
    }
    Ok(decompressed)
}

/// Deflate `data` for fixtures
#[cfg(any(test, feature = "test-utils"))]
pub(crate) fn compress(data: &[u8]) -> Result<Vec<u8>> {
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::compression(format!("Zlib compression failed: {e}")))?;
    encoder
        .finish()
        .map_err(|e| Error::compression(format!("Zlib compression failed: {e}")))
}
