//! The MPQ encryption table

/// Number of words in the encryption table
pub(crate) const TABLE_SIZE: usize = 0x500;

/// The 1280-word table shared by hashing and decryption.
///
/// Layout: five 256-word bands. Bands 0..=3 feed [`hash_string`] (one per
/// hash type), band 4 (`0x400..0x500`) feeds the stream cipher.
///
/// [`hash_string`]: super::hash_string
pub static ENCRYPTION_TABLE: [u32; TABLE_SIZE] = build_encryption_table();

const fn build_encryption_table() -> [u32; TABLE_SIZE] {
    let mut table = [0u32; TABLE_SIZE];
    let mut seed: u32 = 0x0010_0001;

    let mut index1 = 0;
    while index1 < 0x100 {
        let mut index2 = index1;
        let mut pass = 0;
        while pass < 5 {
            seed = (seed * 125 + 3) % 0x2A_AAAB;
            let temp1 = (seed & 0xFFFF) << 0x10;

            seed = (seed * 125 + 3) % 0x2A_AAAB;
            let temp2 = seed & 0xFFFF;

            table[index2] = temp1 | temp2;
            index2 += 0x100;
            pass += 1;
        }
        index1 += 1;
    }

    table
}
