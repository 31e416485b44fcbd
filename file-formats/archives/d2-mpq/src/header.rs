//! MPQ header structures and parsing

use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Read, Seek, SeekFrom};

/// MPQ archive header signature ('MPQ\x1A')
pub const MPQ_HEADER_SIGNATURE: u32 = 0x1A51504D;

/// Size of the version 1 header
pub const HEADER_SIZE: usize = 0x20;

/// Main MPQ header structure
///
/// Diablo II archives only carry the original 32-byte layout. Any extra bytes a
/// newer header declares are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpqHeader {
    /// Size of the archive header
    pub header_size: u32,
    /// Size of MPQ archive
    pub archive_size: u32,
    /// Raw format version number
    pub format_version: u16,
    /// Sector size shift (sector size is `512 << block_size`)
    pub block_size: u16,
    /// Offset to the hash table
    pub hash_table_pos: u32,
    /// Offset to the block table
    pub block_table_pos: u32,
    /// Number of entries in the hash table
    pub hash_table_size: u32,
    /// Number of entries in the block table
    pub block_table_size: u32,
}

impl MpqHeader {
    /// Read an MPQ header from the start of the given reader
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;

        let mut raw = [0u8; HEADER_SIZE];
        reader.read_exact(&mut raw).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::invalid_format("File too small for MPQ header"),
            _ => Error::Io(e),
        })?;

        Self::parse(&raw)
    }

    /// Parse a header from its 32 raw bytes
    pub fn parse(raw: &[u8; HEADER_SIZE]) -> Result<Self> {
        let mut cursor = &raw[..];

        let signature = cursor.read_u32::<LittleEndian>()?;
        if signature != MPQ_HEADER_SIGNATURE {
            return Err(Error::invalid_format(format!(
                "Invalid MPQ header signature 0x{signature:08X}"
            )));
        }

        let header = MpqHeader {
            header_size: cursor.read_u32::<LittleEndian>()?,
            archive_size: cursor.read_u32::<LittleEndian>()?,
            format_version: cursor.read_u16::<LittleEndian>()?,
            block_size: cursor.read_u16::<LittleEndian>()?,
            hash_table_pos: cursor.read_u32::<LittleEndian>()?,
            block_table_pos: cursor.read_u32::<LittleEndian>()?,
            hash_table_size: cursor.read_u32::<LittleEndian>()?,
            block_table_size: cursor.read_u32::<LittleEndian>()?,
        };

        if !crate::is_power_of_two(header.hash_table_size) {
            return Err(Error::invalid_format(format!(
                "Hash table size {} is not a power of two",
                header.hash_table_size
            )));
        }

        // 512 << 23 already overflows a u32 sector offset
        if header.block_size > 22 {
            return Err(Error::invalid_format(format!(
                "Block size shift {} is out of range",
                header.block_size
            )));
        }

        log::debug!(
            "MPQ header: version {}, sector size {}, {} hash entries, {} block entries",
            header.format_version,
            header.sector_size(),
            header.hash_table_size,
            header.block_table_size
        );

        Ok(header)
    }

    /// Calculate the sector size from block size
    pub fn sector_size(&self) -> usize {
        crate::calculate_sector_size(self.block_size)
    }
}
