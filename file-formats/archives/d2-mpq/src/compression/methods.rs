//! Codec tag definitions

/// Bits of the codec tag stored in the first byte of a compressed sector
pub mod flags {
    /// Huffman encoding (WAVE files only)
    pub const HUFFMAN: u8 = 0x01;
    /// Deflate/zlib compression
    pub const ZLIB: u8 = 0x02;
    /// PKWare DCL compression
    pub const PKWARE: u8 = 0x08;
    /// BZip2 compression
    pub const BZIP2: u8 = 0x10;
    /// IMA ADPCM mono
    pub const ADPCM_MONO: u8 = 0x40;
    /// IMA ADPCM stereo
    pub const ADPCM_STEREO: u8 = 0x80;
}

/// Codec chains this library decodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Deflate/zlib compression
    Zlib,
    /// PKWare DCL compression
    PKWare,
    /// Huffman, then IMA ADPCM mono
    HuffmanAdpcmMono,
    /// Huffman, then IMA ADPCM stereo
    HuffmanAdpcmStereo,
}

impl CompressionMethod {
    /// Map a sector's tag byte to a supported chain
    ///
    /// Returns `None` for every other combination, including the single
    /// Huffman and ADPCM bits on their own.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            flags::ZLIB => Some(CompressionMethod::Zlib),
            flags::PKWARE => Some(CompressionMethod::PKWare),
            t if t == flags::ADPCM_MONO | flags::HUFFMAN => {
                Some(CompressionMethod::HuffmanAdpcmMono)
            }
            t if t == flags::ADPCM_STEREO | flags::HUFFMAN => {
                Some(CompressionMethod::HuffmanAdpcmStereo)
            }
            _ => None,
        }
    }

    /// Tag byte written in front of data compressed with this chain
    pub fn tag(&self) -> u8 {
        match self {
            CompressionMethod::Zlib => flags::ZLIB,
            CompressionMethod::PKWare => flags::PKWARE,
            CompressionMethod::HuffmanAdpcmMono => flags::ADPCM_MONO | flags::HUFFMAN,
            CompressionMethod::HuffmanAdpcmStereo => flags::ADPCM_STEREO | flags::HUFFMAN,
        }
    }
}
