//! Codec implementations behind the sector dispatcher

pub(super) mod adpcm;
pub(super) mod huffman;
pub(super) mod pkware;
pub(super) mod zlib;
