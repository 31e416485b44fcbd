//! Sector-by-sector reading of a single archived file
//!
//! A [`SectorStream`] decodes one sector at a time and keeps only the most
//! recent one buffered. Files stored as a single unit are decoded in full on
//! first access and cached for the life of the stream.

use crate::archive::FileInfo;
use crate::compression;
use crate::crypto::decrypt_bytes;
use crate::io::{MpqRead, StreamSource};
use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Read, Seek, SeekFrom};

/// Reader over one file inside an archive
///
/// The stream borrows the [`Archive`](crate::Archive) it was opened from and
/// implements [`std::io::Read`] and [`std::io::Seek`] over the decoded bytes.
///
/// ```no_run
/// use std::io::Read;
///
/// # fn main() -> Result<(), d2_mpq::Error> {
/// let archive = d2_mpq::Archive::open("d2data.mpq")?;
/// let mut stream = archive.open_stream("data\\global\\excel\\armor.txt")?;
///
/// let mut text = String::new();
/// stream.read_to_string(&mut text)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SectorStream<'a> {
    info: FileInfo,
    sector_size: usize,
    source: StreamSource<'a>,
    sector_offsets: Option<Vec<u32>>,
    buffer: Vec<u8>,
    buffered_sector: Option<usize>,
    position: u64,
}

impl<'a> SectorStream<'a> {
    pub(crate) fn new(
        info: FileInfo,
        sector_size: usize,
        mut source: StreamSource<'a>,
    ) -> Result<Self> {
        let sectored = info.is_compressed() && !info.is_single_unit();
        let sector_offsets = if info.file_size() > 0 && sectored {
            Some(load_sector_offsets(&info, sector_size, &mut source)?)
        } else {
            None
        };

        log::debug!(
            "Opened stream for '{}': {} bytes ({} stored), flags 0x{:08X}",
            info.filename,
            info.file_size(),
            info.compressed_size(),
            info.flags()
        );

        Ok(Self {
            info,
            sector_size,
            source,
            sector_offsets,
            buffer: Vec::new(),
            buffered_sector: None,
            position: 0,
        })
    }

    /// Information about the file behind this stream
    pub fn info(&self) -> &FileInfo {
        &self.info
    }

    /// Decoded size of the file
    pub fn len(&self) -> u64 {
        u64::from(self.info.file_size())
    }

    /// Check if the file is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current cursor position used by [`Read`]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read decoded bytes starting at `offset` into `dst`
    ///
    /// Returns the number of bytes copied, which is less than `dst.len()` only
    /// when the request runs past the end of the file. The cursor used by
    /// [`Read`] is not moved.
    pub fn read_at(&mut self, offset: u64, dst: &mut [u8]) -> Result<usize> {
        let len = self.len();
        if offset >= len || dst.is_empty() {
            return Ok(0);
        }
        let count = (len - offset).min(dst.len() as u64) as usize;

        if self.info.is_single_unit() {
            self.load_single_unit()?;
            let start = offset as usize;
            dst[..count].copy_from_slice(&self.buffer[start..start + count]);
            return Ok(count);
        }

        let sector_size = self.sector_size as u64;
        let mut copied = 0;
        while copied < count {
            let pos = offset + copied as u64;
            let sector = (pos / sector_size) as usize;
            let within = (pos % sector_size) as usize;

            self.buffer_sector(sector)?;

            let n = (self.buffer.len() - within).min(count - copied);
            dst[copied..copied + n].copy_from_slice(&self.buffer[within..within + n]);
            copied += n;
        }

        Ok(count)
    }

    fn encryption_key(&self) -> Result<u32> {
        if self.info.seed == 0 {
            return Err(Error::crypto("unable to determine encryption key"));
        }
        Ok(self.info.seed)
    }

    fn load_single_unit(&mut self) -> Result<()> {
        if self.buffered_sector.is_some() {
            return Ok(());
        }

        let stored = self.info.compressed_size() as usize;
        let expected = self.info.file_size() as usize;

        let mut data = vec![0u8; stored];
        self.source
            .read_at(u64::from(self.info.file_pos()), &mut data)?;

        if self.info.is_encrypted() && data.len() > 3 {
            decrypt_bytes(&mut data, self.encryption_key()?)?;
        }

        self.buffer = self.decode(data, expected)?;
        self.buffered_sector = Some(0);

        log::trace!(
            "Cached single-unit file '{}' ({expected} bytes)",
            self.info.filename
        );
        Ok(())
    }

    fn buffer_sector(&mut self, index: usize) -> Result<()> {
        if self.buffered_sector == Some(index) {
            return Ok(());
        }

        let file_size = self.info.file_size() as usize;
        let sector_start = index * self.sector_size;
        let expected = self.sector_size.min(file_size - sector_start);

        let (start, end) = match &self.sector_offsets {
            Some(offsets) => {
                let (start, end) = (offsets[index], offsets[index + 1]);
                if end < start || end > self.info.compressed_size() {
                    return Err(Error::corrupt(format!(
                        "sector {index} of '{}' spans 0x{start:X}..0x{end:X} \
                         outside {} stored bytes",
                        self.info.filename,
                        self.info.compressed_size()
                    )));
                }
                (start as usize, end as usize)
            }
            None => {
                let end = sector_start + expected;
                if end > self.info.compressed_size() as usize {
                    return Err(Error::corrupt(format!(
                        "sector {index} of '{}' ends past {} stored bytes",
                        self.info.filename,
                        self.info.compressed_size()
                    )));
                }
                (sector_start, end)
            }
        };

        let mut data = vec![0u8; end - start];
        self.source
            .read_at(u64::from(self.info.file_pos()) + start as u64, &mut data)?;

        if self.info.is_encrypted() && data.len() > 3 {
            let key = self.encryption_key()?.wrapping_add(index as u32);
            decrypt_bytes(&mut data, key)?;
        }

        log::trace!(
            "Sector {index} of '{}': {} stored bytes, {expected} expected",
            self.info.filename,
            data.len()
        );

        self.buffered_sector = None;
        self.buffer = self.decode(data, expected)?;
        self.buffered_sector = Some(index);
        Ok(())
    }

    fn decode(&self, data: Vec<u8>, expected: usize) -> Result<Vec<u8>> {
        if data.len() == expected {
            return Ok(data);
        }

        let decoded = if self.info.is_multi_compressed() {
            compression::decompress(&data, expected)?
        } else if self.info.is_imploded() {
            compression::explode(&data)?
        } else {
            return Err(Error::corrupt(format!(
                "'{}' is stored uncompressed but holds {} bytes where {expected} were expected",
                self.info.filename,
                data.len()
            )));
        };

        if decoded.len() != expected {
            return Err(Error::corrupt(format!(
                "'{}' decoded to {} bytes, expected {expected}",
                self.info.filename,
                decoded.len()
            )));
        }

        Ok(decoded)
    }
}

fn load_sector_offsets(
    info: &FileInfo,
    sector_size: usize,
    source: &mut StreamSource<'_>,
) -> Result<Vec<u32>> {
    let sector_count = (info.file_size() as usize).div_ceil(sector_size);
    let entry_count = sector_count + 1;

    if (entry_count as u64) * 4 > u64::from(info.compressed_size()) {
        return Err(Error::corrupt(format!(
            "'{}' needs {entry_count} sector offsets but stores only {} bytes",
            info.filename,
            info.compressed_size()
        )));
    }

    let mut raw = vec![0u8; entry_count * 4];
    source.read_at(u64::from(info.file_pos()), &mut raw)?;

    if info.is_encrypted() {
        if info.seed == 0 {
            return Err(Error::crypto("unable to determine encryption key"));
        }
        decrypt_bytes(&mut raw, info.seed.wrapping_sub(1))?;
    }

    let mut cursor = &raw[..];
    let offsets = (0..entry_count)
        .map(|_| cursor.read_u32::<LittleEndian>())
        .collect::<io::Result<Vec<_>>>()?;

    if info.is_encrypted() {
        let table_size = (entry_count * 4) as u32;
        let first_ok = offsets[0] == table_size
            || (info.has_sector_crc() && offsets[0] == table_size + 4);
        if !first_ok || u64::from(offsets[1]) > sector_size as u64 + u64::from(offsets[0]) {
            return Err(Error::corrupt(format!(
                "sector offset table of '{}' failed to decrypt (first entries 0x{:X}, 0x{:X})",
                info.filename, offsets[0], offsets[1]
            )));
        }
    }

    log::debug!(
        "Loaded {} sector offsets for '{}'",
        offsets.len(),
        info.filename
    );

    Ok(offsets)
}

fn into_io_error(error: Error) -> io::Error {
    match error {
        Error::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}

impl Read for SectorStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.read_at(self.position, buf).map_err(into_io_error)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl Seek for SectorStream<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.len().checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        };

        match target {
            Some(position) => {
                self.position = position;
                Ok(position)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}
