//! MPQ archive handling
//!
//! [`Archive`] loads the header and both index tables once, then resolves
//! names and hands out [`SectorStream`]s. Every read operation takes `&self`,
//! so one archive can serve many threads.

use crate::header::MpqHeader;
use crate::io::{BufferedMpqReader, SharedFile, StreamSource};
use crate::special_files::{self, LISTFILE};
use crate::stream::SectorStream;
use crate::tables::{BlockEntry, BlockTable, HashTable, LookupMode};
use crate::{Error, Result, crypto, path};
use std::fs;
use std::path::{Path, PathBuf};

/// Largest buffer [`Archive::read_file`] hands to a stream at once
const READ_CHUNK_SIZE: usize = 0x10000;

/// How streams obtain their bytes from the archive file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleMode {
    /// All streams share the archive's handle; each seek and read pair runs
    /// under one lock
    #[default]
    Shared,
    /// Every stream opens its own handle on the archive path
    PerStream,
}

/// Options for opening MPQ archives
///
/// # Examples
///
/// ```no_run
/// use d2_mpq::{HandleMode, LookupMode, OpenOptions};
///
/// let archive = OpenOptions::new()
///     .lookup_mode(LookupMode::Probe)
///     .handle_mode(HandleMode::PerStream)
///     .locale(0x0409)
///     .ignore_case(true)
///     .open("D2Data.MPQ")?;
/// # Ok::<(), d2_mpq::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    lookup_mode: LookupMode,
    handle_mode: HandleMode,
    locale: Option<u16>,
    ignore_case: bool,
}

impl OpenOptions {
    /// Create new default options
    ///
    /// Defaults are a linear hash table scan, a shared file handle, no locale
    /// preference, and exact-case path matching.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how names are located in the hash table
    pub fn lookup_mode(mut self, mode: LookupMode) -> Self {
        self.lookup_mode = mode;
        self
    }

    /// Set how streams read from the archive file
    pub fn handle_mode(mut self, mode: HandleMode) -> Self {
        self.handle_mode = mode;
        self
    }

    /// Prefer entries in this locale over neutral ones when a name has both
    pub fn locale(mut self, locale: u16) -> Self {
        self.locale = Some(locale);
        self
    }

    /// Retry a missing path with a case-insensitive match of its file name
    /// inside the parent directory
    pub fn ignore_case(mut self, ignore: bool) -> Self {
        self.ignore_case = ignore;
        self
    }

    /// Open an existing MPQ archive with these options
    ///
    /// # Errors
    /// - `Error::Io` if the file cannot be opened
    /// - `Error::InvalidFormat` if the header or tables are malformed
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<Archive> {
        Archive::open_with_options(path, self)
    }
}

/// An MPQ archive opened for reading
#[derive(Debug)]
pub struct Archive {
    path: PathBuf,
    file: SharedFile,
    header: MpqHeader,
    hash_table: HashTable,
    block_table: BlockTable,
    options: OpenOptions,
}

impl Archive {
    /// Open an existing MPQ archive
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, OpenOptions::default())
    }

    /// Open an archive with specific options
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: OpenOptions) -> Result<Self> {
        let path = if options.ignore_case {
            resolve_ignoring_case(path.as_ref())?
        } else {
            path.as_ref().to_path_buf()
        };

        let file = SharedFile::open(&path)?;

        let (header, hash_table, block_table) = file.with_reader(|reader| {
            let header = MpqHeader::read(reader)?;
            let hash_table = HashTable::read(
                reader,
                u64::from(header.hash_table_pos),
                header.hash_table_size,
            )?;
            let block_table = BlockTable::read(
                reader,
                u64::from(header.block_table_pos),
                header.block_table_size,
            )?;
            Ok((header, hash_table, block_table))
        })?;

        log::debug!(
            "Opened archive {}: {} hash entries, {} blocks",
            path.display(),
            hash_table.size(),
            block_table.size()
        );

        Ok(Self {
            path,
            file,
            header,
            hash_table,
            block_table,
            options,
        })
    }

    /// Get the archive header
    pub fn header(&self) -> &MpqHeader {
        &self.header
    }

    /// Get the path the archive was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Archive size recorded in the header
    pub fn size(&self) -> u32 {
        self.header.archive_size
    }

    /// Sector size used by multi-sector files
    pub fn sector_size(&self) -> usize {
        self.header.sector_size()
    }

    /// Get the hash table
    pub fn hash_table(&self) -> &HashTable {
        &self.hash_table
    }

    /// Get the block table
    pub fn block_table(&self) -> &BlockTable {
        &self.block_table
    }

    /// Resolve a name to its table entries and encryption seed
    ///
    /// Both separators are accepted and case is ignored.
    ///
    /// # Errors
    /// `Error::FileNotFound` when no live entry matches, or the entry is a
    /// deletion marker or a patch.
    pub fn find_file(&self, name: &str) -> Result<FileInfo> {
        let normalized = path::normalize_mpq_path(name);

        let (hash_index, hash_entry) = self
            .hash_table
            .find_file(&normalized, self.options.lookup_mode, self.options.locale)
            .ok_or_else(|| Error::FileNotFound(name.to_string()))?;

        let block_index = hash_entry.block_index as usize;
        let block = *self.block_table.get(block_index).ok_or_else(|| {
            log::warn!("'{name}' points at block {block_index} outside the block table");
            Error::FileNotFound(name.to_string())
        })?;

        if !block.exists() || block.is_delete_marker() {
            return Err(Error::FileNotFound(name.to_string()));
        }
        if block.is_patch_file() {
            return Err(Error::FileNotFound(format!(
                "{name} (patching is not supported)"
            )));
        }

        let seed = crypto::file_key(
            &normalized,
            block.file_pos,
            block.file_size,
            block.has_fix_key(),
        );

        Ok(FileInfo {
            filename: name.to_string(),
            hash_index,
            block_index,
            block,
            locale: hash_entry.locale,
            platform: hash_entry.platform,
            seed,
        })
    }

    /// Check if a file exists
    pub fn file_exists(&self, name: &str) -> bool {
        self.find_file(name).is_ok()
    }

    /// Alias for [`Archive::file_exists`]
    pub fn contains(&self, name: &str) -> bool {
        self.file_exists(name)
    }

    /// Open a stream over a file's decoded bytes
    ///
    /// # Errors
    /// `Error::Corrupt` when the file's stored bytes run past the end of the
    /// archive.
    pub fn open_stream(&self, name: &str) -> Result<SectorStream<'_>> {
        let info = self.find_file(name)?;

        let stored_end = u64::from(info.file_pos()) + u64::from(info.compressed_size());
        if stored_end > self.file.len() {
            return Err(Error::corrupt(format!(
                "'{name}' ends at 0x{stored_end:X}, past the archive's 0x{:X} bytes",
                self.file.len()
            )));
        }

        let source = match self.options.handle_mode {
            HandleMode::Shared => StreamSource::Shared(&self.file),
            HandleMode::PerStream => StreamSource::Owned(BufferedMpqReader::open(&self.path)?),
        };

        SectorStream::new(info, self.sector_size(), source)
    }

    /// Read a file from the archive
    ///
    /// The output grows as sectors decode; a block claiming more bytes than
    /// its stored data holds fails before that size is allocated.
    pub fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let mut stream = self.open_stream(name)?;

        let chunk_len = (stream.len() as usize).min(READ_CHUNK_SIZE);
        let mut chunk = vec![0u8; chunk_len];
        let mut data = Vec::with_capacity(chunk_len);

        loop {
            let read = stream.read_at(data.len() as u64, &mut chunk)?;
            if read == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..read]);
        }

        Ok(data)
    }

    /// Read a file as text, replacing invalid UTF-8
    pub fn read_text_file(&self, name: &str) -> Result<String> {
        let data = self.read_file(name)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Names listed in the archive's `(listfile)`
    pub fn file_list(&self) -> Result<Vec<String>> {
        let data = self.read_file(LISTFILE)?;
        Ok(special_files::parse_listfile(&data))
    }

    /// List the files named in `(listfile)` that resolve in this archive
    pub fn list(&self) -> Result<Vec<FileEntry>> {
        let mut entries = Vec::new();

        for name in self.file_list()? {
            match self.find_file(&name) {
                Ok(info) => entries.push(FileEntry {
                    size: info.file_size(),
                    compressed_size: info.compressed_size(),
                    flags: info.flags(),
                    locale: info.locale,
                    table_indices: (info.hash_index, info.block_index),
                    name,
                }),
                Err(e) => {
                    log::warn!("'{name}' is listed in (listfile) but does not resolve: {e}");
                }
            }
        }

        Ok(entries)
    }

    /// Close the archive, releasing its file handle
    pub fn close(self) -> Result<()> {
        log::debug!("Closing archive {}", self.path.display());
        Ok(())
    }
}

fn resolve_ignoring_case(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }

    let Some(wanted) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(path.to_path_buf());
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str()
            && name.to_lowercase() == wanted.to_lowercase()
        {
            log::debug!("Resolved '{wanted}' to '{name}' ignoring case");
            return Ok(dir.join(name));
        }
    }

    Ok(path.to_path_buf())
}

/// Information about a resolved file
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// File name as requested
    pub filename: String,
    /// Index in hash table
    pub hash_index: usize,
    /// Index in block table
    pub block_index: usize,
    /// Copy of the block table entry
    pub block: BlockEntry,
    /// Locale of the matching hash entry
    pub locale: u16,
    /// Platform of the matching hash entry
    pub platform: u16,
    /// Encryption seed derived from the requested name
    pub seed: u32,
}

impl FileInfo {
    /// Offset of the file data from the start of the archive
    pub fn file_pos(&self) -> u32 {
        self.block.file_pos
    }

    /// Stored size
    pub fn compressed_size(&self) -> u32 {
        self.block.compressed_size
    }

    /// Uncompressed size
    pub fn file_size(&self) -> u32 {
        self.block.file_size
    }

    /// Block flags
    pub fn flags(&self) -> u32 {
        self.block.flags
    }

    /// Check if the file is compressed
    pub fn is_compressed(&self) -> bool {
        self.block.is_compressed()
    }

    /// Check if sectors carry a codec tag
    pub fn is_multi_compressed(&self) -> bool {
        self.block.is_multi_compressed()
    }

    /// Check if the file is imploded without a codec tag
    pub fn is_imploded(&self) -> bool {
        self.block.is_imploded()
    }

    /// Check if the file is encrypted
    pub fn is_encrypted(&self) -> bool {
        self.block.is_encrypted()
    }

    /// Check if the file has fixed key encryption
    pub fn has_fix_key(&self) -> bool {
        self.block.has_fix_key()
    }

    /// Check if the file is stored as a single unit
    pub fn is_single_unit(&self) -> bool {
        self.block.is_single_unit()
    }

    /// Check if the file has sector CRCs
    pub fn has_sector_crc(&self) -> bool {
        self.block.has_sector_crc()
    }
}

/// Information about a file in the archive (for listing)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File name
    pub name: String,
    /// Uncompressed size
    pub size: u32,
    /// Compressed size
    pub compressed_size: u32,
    /// File flags
    pub flags: u32,
    /// Locale of the hash entry
    pub locale: u16,
    /// (hash_index, block_index)
    pub table_indices: (usize, usize),
}

impl FileEntry {
    /// Check if the file is compressed
    pub fn is_compressed(&self) -> bool {
        (self.flags & (BlockEntry::FLAG_IMPLODE | BlockEntry::FLAG_COMPRESS)) != 0
    }

    /// Check if the file is encrypted
    pub fn is_encrypted(&self) -> bool {
        (self.flags & BlockEntry::FLAG_ENCRYPTED) != 0
    }

    /// Check if the file is stored as a single unit
    pub fn is_single_unit(&self) -> bool {
        (self.flags & BlockEntry::FLAG_SINGLE_UNIT) != 0
    }
}
