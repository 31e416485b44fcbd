//! Error types for the MPQ library

use std::io;
use thiserror::Error;

/// Result type alias for MPQ operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for MPQ operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Not an MPQ archive, or the header and tables are malformed
    #[error("Invalid MPQ format: {0}")]
    InvalidFormat(String),

    /// File not found in archive
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Archive data failed a structural check while reading a file
    #[error("Corrupt archive: {0}")]
    Corrupt(String),

    /// Sector uses a codec this library does not decode
    #[error("unsupported codec 0x{tag:02X}")]
    UnsupportedCodec {
        /// Compression type byte found at the start of the sector
        tag: u8,
    },

    /// Compression/decompression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// Encryption/decryption error
    #[error("Cryptography error: {0}")]
    Crypto(String),
}

impl Error {
    /// Create a new InvalidFormat error
    pub fn invalid_format<S: Into<String>>(msg: S) -> Self {
        Error::InvalidFormat(msg.into())
    }

    /// Create a new Corrupt error
    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        Error::Corrupt(msg.into())
    }

    /// Create a new Crypto error
    pub fn crypto<S: Into<String>>(msg: S) -> Self {
        Error::Crypto(msg.into())
    }

    /// Create a new Compression error
    pub fn compression<S: Into<String>>(msg: S) -> Self {
        Error::Compression(msg.into())
    }

    /// Check if this error indicates the archive is corrupted
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::InvalidFormat(_) | Error::Corrupt(_) | Error::Compression(_)
        )
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors concern one file only; other files in the same
    /// archive can still be read.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::FileNotFound(_) | Error::UnsupportedCodec { .. }
        )
    }
}
