//! Synthetic MPQ archive writer
//!
//! Produces version 1 archives in the layout Diablo II uses: header at offset
//! zero, file data, then the encrypted hash and block tables. Every storage
//! variant the reader supports can be produced, along with a few deliberate
//! defects for negative tests.

use crate::compression::{self, CompressionMethod};
use crate::crypto::{self, encrypt_bytes, hash_string, hash_type};
use crate::header::{HEADER_SIZE, MPQ_HEADER_SIGNATURE};
use crate::special_files::LISTFILE;
use crate::tables::{BlockEntry, HashEntry};
use crate::{Error, Result};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::fs;
use std::path::Path;

/// How a fixture file's bytes are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Stored as is
    Raw,
    /// Tagged sectors produced by one codec chain
    Compressed(CompressionMethod),
    /// Untagged PKWARE data with only the implode flag set
    Imploded,
    /// Sectors carrying `tag` followed by the raw bytes
    Tagged(u8),
}

/// Where a file's hash entry is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// First free slot probing from the name's home slot
    Home,
    /// A fixed slot index
    Slot(usize),
}

/// A file to include in a fixture archive
#[derive(Debug, Clone)]
pub struct FixtureFile {
    name: String,
    data: Vec<u8>,
    storage: Storage,
    single_unit: bool,
    encrypted: bool,
    fix_key: bool,
    sector_crc: bool,
    corrupt_offsets: bool,
    extra_flags: u32,
    clear_exists: bool,
    locale: u16,
    placement: Placement,
}

impl FixtureFile {
    /// Create an uncompressed, unencrypted file
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
            storage: Storage::Raw,
            single_unit: false,
            encrypted: false,
            fix_key: false,
            sector_crc: false,
            corrupt_offsets: false,
            extra_flags: 0,
            clear_exists: false,
            locale: 0,
            placement: Placement::Home,
        }
    }

    /// Set the storage variant
    pub fn storage(mut self, storage: Storage) -> Self {
        self.storage = storage;
        self
    }

    /// Store the file as one unit instead of sectors
    pub fn single_unit(mut self) -> Self {
        self.single_unit = true;
        self
    }

    /// Encrypt with the key derived from the base name
    pub fn encrypted(mut self) -> Self {
        self.encrypted = true;
        self
    }

    /// Encrypt with the key adjusted by position and size
    pub fn fix_key(mut self) -> Self {
        self.encrypted = true;
        self.fix_key = true;
        self
    }

    /// Add a checksum block after the sectors of a compressed file
    pub fn sector_crc(mut self) -> Self {
        self.sector_crc = true;
        self
    }

    /// Write an offset table whose first entry points past the data
    pub fn corrupt_offsets(mut self) -> Self {
        self.corrupt_offsets = true;
        self
    }

    /// Clear the exists flag on the block
    pub fn without_exists(mut self) -> Self {
        self.clear_exists = true;
        self
    }

    /// Flag the block as a deletion marker
    pub fn delete_marker(mut self) -> Self {
        self.extra_flags |= BlockEntry::FLAG_DELETE_MARKER;
        self
    }

    /// Flag the block as a patch
    pub fn patch_file(mut self) -> Self {
        self.extra_flags |= BlockEntry::FLAG_PATCH_FILE;
        self
    }

    /// Set the hash entry's locale
    pub fn locale(mut self, locale: u16) -> Self {
        self.locale = locale;
        self
    }

    /// Put the hash entry in a fixed slot
    pub fn slot(mut self, index: usize) -> Self {
        self.placement = Placement::Slot(index);
        self
    }

    fn flags(&self) -> u32 {
        let mut flags = self.extra_flags;
        if !self.clear_exists {
            flags |= BlockEntry::FLAG_EXISTS;
        }
        flags |= match self.storage {
            Storage::Raw => 0,
            Storage::Compressed(_) | Storage::Tagged(_) => BlockEntry::FLAG_COMPRESS,
            Storage::Imploded => BlockEntry::FLAG_IMPLODE,
        };
        if self.encrypted {
            flags |= BlockEntry::FLAG_ENCRYPTED;
        }
        if self.fix_key {
            flags |= BlockEntry::FLAG_FIX_KEY;
        }
        if self.single_unit {
            flags |= BlockEntry::FLAG_SINGLE_UNIT;
        }
        if self.sector_crc && self.is_compressed() && !self.single_unit {
            flags |= BlockEntry::FLAG_SECTOR_CRC;
        }
        flags
    }

    fn is_compressed(&self) -> bool {
        self.storage != Storage::Raw
    }

    /// Encode one unit of data, falling back to the raw bytes when packing
    /// does not shrink it
    fn pack(&self, chunk: &[u8]) -> Result<Vec<u8>> {
        let packed = match self.storage {
            Storage::Raw => return Ok(chunk.to_vec()),
            Storage::Compressed(method) => compression::compress(chunk, method)?,
            Storage::Imploded => compression::implode(chunk)?,
            Storage::Tagged(tag) => {
                let mut out = Vec::with_capacity(chunk.len() + 1);
                out.push(tag);
                out.extend_from_slice(chunk);
                return Ok(out);
            }
        };

        Ok(if packed.len() < chunk.len() {
            packed
        } else {
            chunk.to_vec()
        })
    }

    fn encode(&self, file_pos: u32, sector_size: usize) -> Result<Vec<u8>> {
        if self.data.is_empty() {
            return Ok(Vec::new());
        }

        let seed = crypto::file_key(&self.name, file_pos, self.data.len() as u32, self.fix_key);

        if self.single_unit {
            let mut unit = self.pack(&self.data)?;
            if self.encrypted {
                encrypt_bytes(&mut unit, seed);
            }
            return Ok(unit);
        }

        let mut sectors = Vec::new();
        for (index, chunk) in self.data.chunks(sector_size).enumerate() {
            let mut sector = self.pack(chunk)?;
            if self.encrypted {
                encrypt_bytes(&mut sector, seed.wrapping_add(index as u32));
            }
            sectors.push(sector);
        }

        if !self.is_compressed() {
            return Ok(sectors.concat());
        }

        let with_crc = self.flags() & BlockEntry::FLAG_SECTOR_CRC != 0;
        let entry_count = sectors.len() + if with_crc { 2 } else { 1 };

        let mut offsets = Vec::with_capacity(entry_count);
        let mut position = (entry_count * 4) as u32;
        offsets.push(position);
        for sector in &sectors {
            position += sector.len() as u32;
            offsets.push(position);
        }
        let crc_block = vec![0u8; if with_crc { sectors.len() * 4 } else { 0 }];
        if with_crc {
            offsets.push(position + crc_block.len() as u32);
        }
        if self.corrupt_offsets {
            offsets[0] = u32::MAX;
        }

        let mut table: Vec<u8> = offsets.iter().flat_map(|o| o.to_le_bytes()).collect();
        if self.encrypted {
            encrypt_bytes(&mut table, seed.wrapping_sub(1));
        }

        let mut out = table;
        for sector in sectors {
            out.extend(sector);
        }
        out.extend(crc_block);
        Ok(out)
    }
}

/// Builder for synthetic version 1 archives
#[derive(Debug, Clone)]
pub struct MpqBuilder {
    block_size: u16,
    hash_table_size: u32,
    files: Vec<FixtureFile>,
    aliases: Vec<(String, String)>,
    dangling: Vec<(String, u32)>,
    deleted_slots: Vec<usize>,
    listfile: bool,
}

impl Default for MpqBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MpqBuilder {
    /// Create a builder with 512-byte sectors and a 16-slot hash table
    pub fn new() -> Self {
        Self {
            block_size: 0,
            hash_table_size: 16,
            files: Vec::new(),
            aliases: Vec::new(),
            dangling: Vec::new(),
            deleted_slots: Vec::new(),
            listfile: false,
        }
    }

    /// Set the sector size shift
    pub fn block_size(mut self, shift: u16) -> Self {
        self.block_size = shift;
        self
    }

    /// Set the number of hash table slots (a power of two)
    pub fn hash_table_size(mut self, size: u32) -> Self {
        self.hash_table_size = size;
        self
    }

    /// Add a file
    pub fn file(mut self, file: FixtureFile) -> Self {
        self.files.push(file);
        self
    }

    /// Add a second name pointing at the block of an earlier file
    pub fn alias(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.push((name.into(), target.into()));
        self
    }

    /// Add a name whose hash entry points at an arbitrary block index
    pub fn dangling(mut self, name: impl Into<String>, block_index: u32) -> Self {
        self.dangling.push((name.into(), block_index));
        self
    }

    /// Mark a hash slot as deleted
    pub fn deleted_slot(mut self, index: usize) -> Self {
        self.deleted_slots.push(index);
        self
    }

    /// Append a zlib-compressed `(listfile)` naming every added file
    pub fn with_listfile(mut self) -> Self {
        self.listfile = true;
        self
    }

    /// Produce the archive bytes
    pub fn build(&self) -> Result<Vec<u8>> {
        let sector_size = crate::calculate_sector_size(self.block_size);
        let slot_count = self.hash_table_size as usize;
        if !crate::is_power_of_two(self.hash_table_size) {
            return Err(Error::invalid_format("fixture hash table size must be a power of two"));
        }

        let mut files = self.files.clone();
        if self.listfile {
            let names: Vec<&str> = self.files.iter().map(|f| f.name.as_str()).collect();
            let text = format!("{}\r\n", names.join("\r\n"));
            files.push(
                FixtureFile::new(LISTFILE, text.into_bytes())
                    .storage(Storage::Compressed(CompressionMethod::Zlib)),
            );
        }

        let mut out = vec![0u8; HEADER_SIZE];
        let mut blocks = Vec::with_capacity(files.len());
        for file in &files {
            let file_pos = out.len() as u32;
            let stored = file.encode(file_pos, sector_size)?;
            blocks.push(BlockEntry {
                file_pos,
                compressed_size: stored.len() as u32,
                file_size: file.data.len() as u32,
                flags: file.flags(),
            });
            out.extend(stored);
        }

        let mut slots: Vec<Option<HashEntry>> = vec![None; slot_count];
        for &index in &self.deleted_slots {
            let mut entry = HashEntry::empty();
            entry.block_index = HashEntry::EMPTY_DELETED;
            place(&mut slots, Placement::Slot(index), "(deleted)", entry)?;
        }
        for (block_index, file) in files.iter().enumerate() {
            let entry = hash_entry(&file.name, file.locale, block_index as u32);
            place(&mut slots, file.placement, &file.name, entry)?;
        }
        for (name, target) in &self.aliases {
            let block_index = files
                .iter()
                .position(|f| &f.name == target)
                .ok_or_else(|| Error::invalid_format(format!("alias target {target} missing")))?;
            let entry = hash_entry(name, 0, block_index as u32);
            place(&mut slots, Placement::Home, name, entry)?;
        }

        for (name, block_index) in &self.dangling {
            place(&mut slots, Placement::Home, name, hash_entry(name, 0, *block_index))?;
        }

        let hash_table_pos = out.len() as u32;
        let mut hash_bytes: Vec<u8> = slots
            .into_iter()
            .flat_map(|slot| slot.unwrap_or_else(HashEntry::empty).to_bytes())
            .collect();
        encrypt_bytes(&mut hash_bytes, hash_string("(hash table)", hash_type::FILE_KEY));
        out.extend(hash_bytes);

        let block_table_pos = out.len() as u32;
        let mut block_bytes: Vec<u8> = blocks.iter().flat_map(|b| b.to_bytes()).collect();
        encrypt_bytes(&mut block_bytes, hash_string("(block table)", hash_type::FILE_KEY));
        out.extend(block_bytes);

        let archive_size = out.len() as u32;
        let mut header = Vec::with_capacity(HEADER_SIZE);
        header.extend(MPQ_HEADER_SIGNATURE.to_le_bytes());
        header.extend((HEADER_SIZE as u32).to_le_bytes());
        header.extend(archive_size.to_le_bytes());
        header.extend(0u16.to_le_bytes());
        header.extend(self.block_size.to_le_bytes());
        header.extend(hash_table_pos.to_le_bytes());
        header.extend(block_table_pos.to_le_bytes());
        header.extend(self.hash_table_size.to_le_bytes());
        header.extend((blocks.len() as u32).to_le_bytes());
        out[..HEADER_SIZE].copy_from_slice(&header);

        Ok(out)
    }

    /// Build the archive and write it to `path`
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.build()?)?;
        Ok(())
    }
}

fn hash_entry(name: &str, locale: u16, block_index: u32) -> HashEntry {
    HashEntry {
        name_1: hash_string(name, hash_type::NAME_A),
        name_2: hash_string(name, hash_type::NAME_B),
        locale,
        platform: 0,
        block_index,
    }
}

fn place(
    slots: &mut [Option<HashEntry>],
    placement: Placement,
    name: &str,
    entry: HashEntry,
) -> Result<()> {
    let mask = slots.len() - 1;
    let index = match placement {
        Placement::Slot(index) => index & mask,
        Placement::Home => {
            let home = hash_string(name, hash_type::TABLE_OFFSET) as usize & mask;
            (0..slots.len())
                .map(|step| (home + step) & mask)
                .find(|&i| slots[i].is_none())
                .ok_or_else(|| Error::invalid_format("fixture hash table is full"))?
        }
    };

    if slots[index].is_some() {
        return Err(Error::invalid_format(format!(
            "fixture hash slot {index} is already taken"
        )));
    }
    slots[index] = Some(entry);
    Ok(())
}

/// Slot a name hashes to in a table of `size` slots
pub fn home_slot(name: &str, size: u32) -> usize {
    hash_string(name, hash_type::TABLE_OFFSET) as usize & (size as usize - 1)
}

/// Repetitive text that compresses well
pub fn compressible_data(size: usize) -> Vec<u8> {
    b"Stay awhile and listen. "
        .iter()
        .copied()
        .cycle()
        .take(size)
        .collect()
}

/// Seeded random bytes that do not compress
pub fn random_data(size: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; size];
    rng.fill(&mut data[..]);
    data
}

/// A 16-bit PCM sine tone with the given channel count
pub fn pcm_tone(samples_per_channel: usize, channels: usize) -> Vec<u8> {
    (0..samples_per_channel)
        .flat_map(|i| {
            let phase = i as f64 * std::f64::consts::TAU / 64.0;
            let sample = (phase.sin() * 8000.0) as i16;
            (0..channels).flat_map(move |c| {
                let value = if c == 0 { sample } else { sample / 2 };
                value.to_le_bytes()
            })
        })
        .collect()
}
