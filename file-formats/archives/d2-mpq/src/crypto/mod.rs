//! Cryptographic operations for MPQ files
//!
//! MPQ archives use one custom algorithm family for everything:
//!
//! - **Hashing**: [`hash_string`] derives the hash table index, the two
//!   verification words, and file encryption keys from a path.
//! - **Decryption**: [`decrypt_block`] and [`decrypt_bytes`] undo the stream
//!   cipher applied to the hash table, the block table, sector offset tables,
//!   and file sectors.
//!
//! All of it is driven by [`ENCRYPTION_TABLE`], a 1280-word table computed at
//! compile time.
//!
//! ## Examples
//!
//! ```
//! use d2_mpq::crypto::{hash_string, hash_type};
//!
//! let key = hash_string("(hash table)", hash_type::FILE_KEY);
//! assert_eq!(key, 0xC3AF3770);
//!
//! // Separators and case are normalized before hashing
//! assert_eq!(
//!     hash_string("data/global/excel/armor.txt", hash_type::NAME_A),
//!     hash_string("DATA\\GLOBAL\\EXCEL\\ARMOR.TXT", hash_type::NAME_A),
//! );
//! ```

mod decryption;
#[cfg(any(test, feature = "test-utils"))]
mod encryption;
mod hash;
mod table;

pub use decryption::{decrypt_block, decrypt_bytes};
#[cfg(any(test, feature = "test-utils"))]
pub use encryption::{encrypt_block, encrypt_bytes};
pub use hash::{hash_string, hash_type};
pub use table::ENCRYPTION_TABLE;

/// Compute the encryption seed for a file.
///
/// The seed is the [`hash_type::FILE_KEY`] hash of the file's base name. When
/// `fix_key` is set it is further adjusted by the block's position and
/// uncompressed size, so the same name stored twice gets two different keys.
pub fn file_key(path: &str, file_pos: u32, file_size: u32, fix_key: bool) -> u32 {
    let base_key = hash_string(crate::path::base_name(path), hash_type::FILE_KEY);

    if fix_key {
        base_key.wrapping_add(file_pos) ^ file_size
    } else {
        base_key
    }
}
