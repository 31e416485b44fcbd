//! Block table implementation for MPQ archives

use super::{TABLE_ENTRY_SIZE, read_encrypted_table};
use crate::crypto::{hash_string, hash_type};
use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Read, Seek};

/// Block table entry (16 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockEntry {
    /// Offset of the beginning of the file data, relative to the beginning of the archive
    pub file_pos: u32,
    /// Compressed file size
    pub compressed_size: u32,
    /// Size of uncompressed file
    pub file_size: u32,
    /// Flags for the file
    pub flags: u32,
}

impl BlockEntry {
    /// File is compressed using PKWARE Data compression library
    pub const FLAG_IMPLODE: u32 = 0x00000100;
    /// File is compressed using one or more compression methods
    pub const FLAG_COMPRESS: u32 = 0x00000200;
    /// File is encrypted
    pub const FLAG_ENCRYPTED: u32 = 0x00010000;
    /// The decryption key for the file is adjusted by the block position
    pub const FLAG_FIX_KEY: u32 = 0x00020000;
    /// The file is a patch file
    pub const FLAG_PATCH_FILE: u32 = 0x00100000;
    /// File is stored as a single unit, not split into sectors
    pub const FLAG_SINGLE_UNIT: u32 = 0x01000000;
    /// File is a deletion marker
    pub const FLAG_DELETE_MARKER: u32 = 0x02000000;
    /// File has checksums for each sector
    pub const FLAG_SECTOR_CRC: u32 = 0x04000000;
    /// File exists in the archive
    pub const FLAG_EXISTS: u32 = 0x80000000;

    /// Check if the file is compressed
    pub fn is_compressed(&self) -> bool {
        (self.flags & (Self::FLAG_IMPLODE | Self::FLAG_COMPRESS)) != 0
    }

    /// Check if the file uses the tagged multi-codec format
    pub fn is_multi_compressed(&self) -> bool {
        (self.flags & Self::FLAG_COMPRESS) != 0
    }

    /// Check if the file is imploded without a codec tag
    pub fn is_imploded(&self) -> bool {
        (self.flags & Self::FLAG_IMPLODE) != 0 && !self.is_multi_compressed()
    }

    /// Check if the file is encrypted
    pub fn is_encrypted(&self) -> bool {
        (self.flags & Self::FLAG_ENCRYPTED) != 0
    }

    /// Check if the file is stored as a single unit
    pub fn is_single_unit(&self) -> bool {
        (self.flags & Self::FLAG_SINGLE_UNIT) != 0
    }

    /// Check if the file has sector CRCs
    pub fn has_sector_crc(&self) -> bool {
        (self.flags & Self::FLAG_SECTOR_CRC) != 0
    }

    /// Check if the file exists
    pub fn exists(&self) -> bool {
        (self.flags & Self::FLAG_EXISTS) != 0
    }

    /// Check if the file uses fixed key encryption
    pub fn has_fix_key(&self) -> bool {
        (self.flags & Self::FLAG_FIX_KEY) != 0
    }

    /// Check if the file is a patch file
    pub fn is_patch_file(&self) -> bool {
        (self.flags & Self::FLAG_PATCH_FILE) != 0
    }

    /// Check if the file is a deletion marker
    pub fn is_delete_marker(&self) -> bool {
        (self.flags & Self::FLAG_DELETE_MARKER) != 0
    }

    /// Read a block entry from raw (decrypted) bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < TABLE_ENTRY_SIZE {
            return Err(Error::invalid_format("Block entry too small"));
        }

        let mut cursor = data;
        Ok(Self {
            file_pos: cursor.read_u32::<LittleEndian>()?,
            compressed_size: cursor.read_u32::<LittleEndian>()?,
            file_size: cursor.read_u32::<LittleEndian>()?,
            flags: cursor.read_u32::<LittleEndian>()?,
        })
    }

    /// Serialize the entry to its on-disk (unencrypted) form
    #[cfg(any(test, feature = "test-utils"))]
    pub fn to_bytes(&self) -> [u8; TABLE_ENTRY_SIZE] {
        let mut out = [0u8; TABLE_ENTRY_SIZE];
        out[0..4].copy_from_slice(&self.file_pos.to_le_bytes());
        out[4..8].copy_from_slice(&self.compressed_size.to_le_bytes());
        out[8..12].copy_from_slice(&self.file_size.to_le_bytes());
        out[12..16].copy_from_slice(&self.flags.to_le_bytes());
        out
    }
}

/// Block table
#[derive(Debug, Clone, Default)]
pub struct BlockTable {
    entries: Vec<BlockEntry>,
}

impl BlockTable {
    /// Read and decrypt a block table from the archive
    pub fn read<R: Read + Seek>(reader: &mut R, offset: u64, size: u32) -> Result<Self> {
        let key = hash_string("(block table)", hash_type::FILE_KEY);
        let raw_data = read_encrypted_table(reader, offset, size, key, "Block table")?;

        let entries = raw_data
            .chunks_exact(TABLE_ENTRY_SIZE)
            .map(BlockEntry::from_bytes)
            .collect::<Result<Vec<_>>>()?;

        log::debug!("Loaded block table: {} entries at 0x{offset:X}", entries.len());

        Ok(Self { entries })
    }

    /// Build a table from already decrypted entries
    pub fn from_entries(entries: Vec<BlockEntry>) -> Self {
        Self { entries }
    }

    /// Get all entries
    pub fn entries(&self) -> &[BlockEntry] {
        &self.entries
    }

    /// Get a specific entry
    pub fn get(&self, index: usize) -> Option<&BlockEntry> {
        self.entries.get(index)
    }

    /// Get the size of the block table
    pub fn size(&self) -> usize {
        self.entries.len()
    }
}
