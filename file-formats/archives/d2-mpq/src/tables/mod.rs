//! MPQ table structures (hash, block)

mod block;
mod hash;

pub use block::{BlockEntry, BlockTable};
pub use hash::{HashEntry, HashTable, LookupMode};

use crate::crypto::decrypt_bytes;
use crate::{Error, Result};
use std::io::{self, Read, Seek, SeekFrom};

/// Size in bytes of one hash or block table entry
pub const TABLE_ENTRY_SIZE: usize = 16;

/// Read `count` encrypted entries at `offset` and decrypt them with `key`
pub(crate) fn read_encrypted_table<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    count: u32,
    key: u32,
    name: &str,
) -> Result<Vec<u8>> {
    let byte_size = u64::from(count) * TABLE_ENTRY_SIZE as u64;
    if byte_size == 0 {
        return Ok(Vec::new());
    }

    let file_len = reader.seek(SeekFrom::End(0))?;
    if offset.saturating_add(byte_size) > file_len {
        return Err(Error::invalid_format(format!(
            "{name} at 0x{offset:X} ({count} entries) extends past end of file \
             (0x{file_len:X} bytes)"
        )));
    }

    let mut raw_data = vec![0u8; byte_size as usize];
    reader.seek(SeekFrom::Start(offset))?;
    reader.read_exact(&mut raw_data).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::invalid_format(format!(
            "{name} at 0x{offset:X} ({count} entries) extends past end of file"
        )),
        _ => Error::Io(e),
    })?;

    decrypt_bytes(&mut raw_data, key)?;
    Ok(raw_data)
}
