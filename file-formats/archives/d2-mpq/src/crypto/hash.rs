//! Hash algorithm for MPQ file name hashing

use super::table::ENCRYPTION_TABLE;

/// Hash types accepted by [`hash_string`]
pub mod hash_type {
    /// Start index in the hash table
    pub const TABLE_OFFSET: u32 = 0;
    /// First verification word stored in a hash entry
    pub const NAME_A: u32 = 1;
    /// Second verification word stored in a hash entry
    pub const NAME_B: u32 = 2;
    /// Encryption key for tables and files
    pub const FILE_KEY: u32 = 3;
}

/// Hash a string using the MPQ hash algorithm
///
/// Characters are upper-cased and `/` is treated as `\` before mixing, so
/// `"data/global/x.txt"` and `"DATA\\GLOBAL\\X.TXT"` hash identically.
pub fn hash_string(key: &str, hash_type: u32) -> u32 {
    let mut seed1: u32 = 0x7FED7FED;
    let mut seed2: u32 = 0xEEEEEEEE;

    for &byte in key.as_bytes() {
        let ch = if byte == b'/' {
            b'\\'
        } else {
            byte.to_ascii_uppercase()
        };

        let table_idx = (hash_type * 0x100 + ch as u32) as usize;
        seed1 = ENCRYPTION_TABLE[table_idx] ^ seed1.wrapping_add(seed2);
        seed2 = (ch as u32)
            .wrapping_add(seed1)
            .wrapping_add(seed2)
            .wrapping_add(seed2 << 5)
            .wrapping_add(3);
    }

    seed1
}
