//! Hash table implementation for MPQ archives

use super::{TABLE_ENTRY_SIZE, read_encrypted_table};
use crate::crypto::{hash_string, hash_type};
use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Read, Seek};

/// Hash table entry (16 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEntry {
    /// The hash of the full file name (part A)
    pub name_1: u32,
    /// The hash of the full file name (part B)
    pub name_2: u32,
    /// The language of the file (Windows LANGID)
    pub locale: u16,
    /// The platform the file is used for (always 0 in practice)
    pub platform: u16,
    /// Block table index or special value
    pub block_index: u32,
}

impl HashEntry {
    /// Value indicating the hash entry has never been used
    pub const EMPTY_NEVER_USED: u32 = 0xFFFFFFFF;
    /// Value indicating the hash entry was deleted
    pub const EMPTY_DELETED: u32 = 0xFFFFFFFE;

    /// Create an empty hash entry
    pub fn empty() -> Self {
        Self {
            name_1: Self::EMPTY_NEVER_USED,
            name_2: Self::EMPTY_NEVER_USED,
            locale: 0xFFFF,
            platform: 0xFFFF,
            block_index: Self::EMPTY_NEVER_USED,
        }
    }

    /// Check if this entry has never been used
    pub fn is_empty(&self) -> bool {
        self.block_index == Self::EMPTY_NEVER_USED
    }

    /// Check if this entry was deleted
    pub fn is_deleted(&self) -> bool {
        self.block_index == Self::EMPTY_DELETED
    }

    /// Check if this entry contains valid file information
    pub fn is_valid(&self) -> bool {
        self.block_index < Self::EMPTY_DELETED
    }

    fn matches(&self, name_a: u32, name_b: u32) -> bool {
        self.is_valid() && self.name_1 == name_a && self.name_2 == name_b
    }

    /// Read a hash entry from raw (decrypted) bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < TABLE_ENTRY_SIZE {
            return Err(Error::invalid_format("Hash entry too small"));
        }

        let mut cursor = data;
        Ok(Self {
            name_1: cursor.read_u32::<LittleEndian>()?,
            name_2: cursor.read_u32::<LittleEndian>()?,
            locale: cursor.read_u16::<LittleEndian>()?,
            platform: cursor.read_u16::<LittleEndian>()?,
            block_index: cursor.read_u32::<LittleEndian>()?,
        })
    }

    /// Serialize the entry to its on-disk (unencrypted) form
    #[cfg(any(test, feature = "test-utils"))]
    pub fn to_bytes(&self) -> [u8; TABLE_ENTRY_SIZE] {
        let mut out = [0u8; TABLE_ENTRY_SIZE];
        out[0..4].copy_from_slice(&self.name_1.to_le_bytes());
        out[4..8].copy_from_slice(&self.name_2.to_le_bytes());
        out[8..10].copy_from_slice(&self.locale.to_le_bytes());
        out[10..12].copy_from_slice(&self.platform.to_le_bytes());
        out[12..16].copy_from_slice(&self.block_index.to_le_bytes());
        out
    }
}

/// How a name is located in the hash table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupMode {
    /// Scan every slot; the first live entry whose two name hashes match wins
    ///
    /// This finds entries even when a never-used slot sits between the home
    /// slot and the entry, which some Diablo II tools produce.
    #[default]
    LinearScan,
    /// Start at the name's home slot and probe forward with wraparound,
    /// stopping at the first never-used slot
    Probe,
}

/// Hash table
#[derive(Debug, Clone)]
pub struct HashTable {
    entries: Vec<HashEntry>,
    mask: usize,
}

impl HashTable {
    /// Read and decrypt a hash table from the archive
    pub fn read<R: Read + Seek>(reader: &mut R, offset: u64, size: u32) -> Result<Self> {
        if !crate::is_power_of_two(size) {
            return Err(Error::invalid_format(
                "Hash table size must be a power of two",
            ));
        }

        let key = hash_string("(hash table)", hash_type::FILE_KEY);
        let raw_data = read_encrypted_table(reader, offset, size, key, "Hash table")?;

        let entries = raw_data
            .chunks_exact(TABLE_ENTRY_SIZE)
            .map(HashEntry::from_bytes)
            .collect::<Result<Vec<_>>>()?;

        log::debug!("Loaded hash table: {} entries at 0x{offset:X}", entries.len());

        Ok(Self {
            entries,
            mask: size as usize - 1,
        })
    }

    /// Build a table from already decrypted entries
    pub fn from_entries(entries: Vec<HashEntry>) -> Result<Self> {
        if !crate::is_power_of_two(entries.len() as u32) {
            return Err(Error::invalid_format(
                "Hash table size must be a power of two",
            ));
        }

        let mask = entries.len() - 1;
        Ok(Self { entries, mask })
    }

    /// Get all entries
    pub fn entries(&self) -> &[HashEntry] {
        &self.entries
    }

    /// Get a specific entry
    pub fn get(&self, index: usize) -> Option<&HashEntry> {
        self.entries.get(index)
    }

    /// Get the size of the hash table
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Find a file in the hash table
    ///
    /// `filename` may use either separator and any case. With a preferred
    /// `locale`, an entry in that locale is chosen over a neutral (locale 0)
    /// entry for the same name. Without one, the first match wins.
    pub fn find_file(
        &self,
        filename: &str,
        mode: LookupMode,
        locale: Option<u16>,
    ) -> Option<(usize, &HashEntry)> {
        let name_a = hash_string(filename, hash_type::NAME_A);
        let name_b = hash_string(filename, hash_type::NAME_B);

        match mode {
            LookupMode::LinearScan => {
                let candidates = self
                    .entries
                    .iter()
                    .enumerate()
                    .filter(|(_, entry)| entry.matches(name_a, name_b));
                pick_locale(candidates, locale)
            }
            LookupMode::Probe => {
                let start = hash_string(filename, hash_type::TABLE_OFFSET) as usize & self.mask;
                let candidates = self
                    .probe_sequence(start)
                    .filter(|(_, entry)| entry.matches(name_a, name_b));
                pick_locale(candidates, locale)
            }
        }
    }

    /// Slots visited by a probe from `start`, ending before the first
    /// never-used slot or after one full wrap
    fn probe_sequence(&self, start: usize) -> impl Iterator<Item = (usize, &HashEntry)> {
        (0..self.entries.len())
            .map(move |step| (start + step) & self.mask)
            .map(move |index| (index, &self.entries[index]))
            .take_while(|(_, entry)| !entry.is_empty())
    }
}

fn pick_locale<'a>(
    mut candidates: impl Iterator<Item = (usize, &'a HashEntry)>,
    locale: Option<u16>,
) -> Option<(usize, &'a HashEntry)> {
    let Some(wanted) = locale else {
        return candidates.next();
    };

    let mut neutral = None;
    let mut first = None;
    for (index, entry) in candidates {
        if entry.locale == wanted {
            return Some((index, entry));
        }
        if entry.locale == 0 && neutral.is_none() {
            neutral = Some((index, entry));
        }
        if first.is_none() {
            first = Some((index, entry));
        }
    }

    neutral.or(first)
}
