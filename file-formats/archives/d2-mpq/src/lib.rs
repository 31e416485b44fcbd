//! # d2_mpq - Diablo II MPQ Archive Reader
//!
//! A read-only Rust implementation of the MPQ (Mo'PaQ) archive format as used
//! by Diablo II. Archives bundle game data files, each optionally compressed
//! and encrypted, behind an encrypted hash table and block table.
//!
//! ## Features
//!
//! - Version 1 archives with 512-byte to 2 GiB sectors
//! - zlib, PKWARE DCL, and the Huffman plus IMA ADPCM audio codecs
//! - Encrypted files, including position-adjusted (`FIX_KEY`) keys
//! - Streaming reads through [`std::io::Read`] and [`std::io::Seek`]
//! - Thread-safe access from one open [`Archive`]
//!
//! ## Examples
//!
//! ```no_run
//! use d2_mpq::Archive;
//!
//! # fn main() -> Result<(), d2_mpq::Error> {
//! let archive = Archive::open("d2data.mpq")?;
//!
//! // List files named in (listfile)
//! for entry in archive.list()? {
//!     println!("{} ({} bytes)", entry.name, entry.size);
//! }
//!
//! // Extract a specific file
//! let palette = archive.read_file("data\\global\\palette\\act1\\pal.dat")?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod archive;
pub mod compression;
pub mod crypto;
pub mod error;
pub mod header;
pub mod io;
pub mod path;
pub mod special_files;
pub mod stream;
pub mod tables;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use archive::{Archive, FileEntry, FileInfo, HandleMode, OpenOptions};
pub use error::{Error, Result};
pub use header::MpqHeader;
pub use stream::SectorStream;
pub use tables::{BlockEntry, BlockTable, HashEntry, HashTable, LookupMode};

pub use crypto::{decrypt_block, hash_string, hash_type};

pub use compression::decompress;

/// Sector size for a header's block size shift
#[inline]
pub fn calculate_sector_size(block_size_shift: u16) -> usize {
    512 << block_size_shift
}

/// Check if a value is a power of two
#[inline]
pub fn is_power_of_two(value: u32) -> bool {
    value != 0 && (value & (value - 1)) == 0
}
