//! I/O abstractions for MPQ archives
//!
//! An archive owns one [`SharedFile`]: a buffered handle behind a mutex whose
//! lock spans each seek plus read. Streams either borrow that handle or, in
//! [`HandleMode::PerStream`](crate::HandleMode::PerStream), open a private
//! [`BufferedMpqReader`] on the same path.

use crate::{Error, Result};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Positioned reads from an archive's bytes
pub trait MpqRead {
    /// Read exactly `buf.len()` bytes starting at `offset`
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()>;
}

fn read_exact_at<R: Read + Seek>(reader: &mut R, offset: u64, buf: &mut [u8]) -> Result<()> {
    reader.seek(SeekFrom::Start(offset))?;
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::corrupt(format!(
            "{} bytes at 0x{offset:X} extend past end of archive",
            buf.len()
        )),
        _ => Error::Io(e),
    })
}

/// Buffered reader owned by a single stream
#[derive(Debug)]
pub struct BufferedMpqReader<R> {
    inner: R,
}

impl<R: Read + Seek> BufferedMpqReader<R> {
    /// Create a new buffered reader
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl BufferedMpqReader<BufReader<File>> {
    /// Open a private handle on the archive at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: Read + Seek> MpqRead for BufferedMpqReader<R> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        read_exact_at(&mut self.inner, offset, buf)
    }
}

/// Archive file handle shared by every borrower of an archive
#[derive(Debug)]
pub struct SharedFile {
    reader: Mutex<BufReader<File>>,
    len: u64,
}

impl SharedFile {
    /// Open the file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            reader: Mutex::new(BufReader::new(file)),
            len,
        })
    }

    /// Size of the underlying file in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Check if the underlying file is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read exactly `buf.len()` bytes at `offset` under one lock
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut reader = self.reader.lock();
        read_exact_at(&mut *reader, offset, buf)
    }

    /// Run `f` with exclusive access to the reader
    pub fn with_reader<T>(&self, f: impl FnOnce(&mut BufReader<File>) -> Result<T>) -> Result<T> {
        let mut reader = self.reader.lock();
        f(&mut reader)
    }
}

/// Where a stream's bytes come from
#[derive(Debug)]
pub(crate) enum StreamSource<'a> {
    /// The archive's locked handle
    Shared(&'a SharedFile),
    /// A handle private to the stream
    Owned(BufferedMpqReader<BufReader<File>>),
}

impl MpqRead for StreamSource<'_> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        match self {
            StreamSource::Shared(shared) => shared.read_at(offset, buf),
            StreamSource::Owned(reader) => reader.read_at(offset, buf),
        }
    }
}
