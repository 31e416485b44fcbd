//! Mirror cipher used to build encrypted fixtures

use super::table::ENCRYPTION_TABLE;

/// Encrypt a block of data
pub fn encrypt_block(data: &mut [u32], mut key: u32) {
    let mut seed: u32 = 0xEEEEEEEE;

    for value in data.iter_mut() {
        seed = seed.wrapping_add(ENCRYPTION_TABLE[0x400 + (key & 0xFF) as usize]);

        let ch = *value;
        *value = ch ^ key.wrapping_add(seed);

        key = (!key << 0x15).wrapping_add(0x11111111) | (key >> 0x0B);
        seed = ch
            .wrapping_add(seed)
            .wrapping_add(seed << 5)
            .wrapping_add(3);
    }
}

/// Encrypt the whole words of a byte buffer, leaving the tail as is
pub fn encrypt_bytes(data: &mut [u8], key: u32) {
    let words = data.len() / 4;
    if words == 0 {
        return;
    }

    let mut buffer: Vec<u32> = data[..words * 4]
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    encrypt_block(&mut buffer, key);

    for (chunk, &value) in data.chunks_exact_mut(4).zip(&buffer) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }
}
