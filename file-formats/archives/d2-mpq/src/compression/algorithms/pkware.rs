//! PKWARE DCL explode using pklib

use crate::{Error, Result};
use pklib::explode_bytes;

/// Explode PKWARE DCL imploded data
pub(crate) fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    log::trace!(
        "PKWare explode input: {} bytes, first 16 bytes: {:02X?}",
        data.len(),
        &data[..data.len().min(16)]
    );

    explode_bytes(data).map_err(|e| {
        log::debug!("PKWare decompression failed with input size {}: {e}", data.len());
        Error::compression(format!("PKWare decompression failed: {e}"))
    })
}

/// Implode `data` for fixtures (binary mode, 4 KiB dictionary)
#[cfg(any(test, feature = "test-utils"))]
pub(crate) fn compress(data: &[u8]) -> Result<Vec<u8>> {
    use pklib::{CompressionMode, DictionarySize, implode_bytes};

    implode_bytes(data, CompressionMode::Binary, DictionarySize::Size4K)
        .map_err(|e| Error::compression(format!("PKWare compression failed: {e}")))
}
