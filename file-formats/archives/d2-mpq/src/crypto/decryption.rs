//! Decryption operations for MPQ files

use super::table::ENCRYPTION_TABLE;
use crate::{Error, Result};

/// Decrypt a block of data
///
/// Applied to whole tables and sector offset arrays. The transform runs for
/// every key, including 0.
pub fn decrypt_block(data: &mut [u32], mut key: u32) {
    let mut seed: u32 = 0xEEEEEEEE;

    for value in data.iter_mut() {
        seed = seed.wrapping_add(ENCRYPTION_TABLE[0x400 + (key & 0xFF) as usize]);

        let ch = *value ^ key.wrapping_add(seed);
        *value = ch;

        key = (!key << 0x15).wrapping_add(0x11111111) | (key >> 0x0B);
        seed = ch
            .wrapping_add(seed)
            .wrapping_add(seed << 5)
            .wrapping_add(3);
    }
}

/// Decrypt a byte buffer in place
///
/// Only whole little-endian words are decrypted; up to three trailing bytes
/// are left as stored. Buffers shorter than one word are rejected.
pub fn decrypt_bytes(data: &mut [u8], key: u32) -> Result<()> {
    if data.len() < 4 {
        return Err(Error::crypto(format!(
            "cannot decrypt {} bytes, at least 4 are required",
            data.len()
        )));
    }

    let words = data.len() / 4;
    let mut buffer: Vec<u32> = data[..words * 4]
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    decrypt_block(&mut buffer, key);

    for (chunk, &value) in data.chunks_exact_mut(4).zip(&buffer) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }

    Ok(())
}
