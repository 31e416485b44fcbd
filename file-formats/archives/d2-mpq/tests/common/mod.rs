//! Common test utilities and fixtures

#![allow(dead_code)]

use d2_mpq::compression::{self, CompressionMethod};
use d2_mpq::test_utils::MpqBuilder;
use std::path::PathBuf;
use tempfile::TempDir;

/// A fixture archive written to a temporary directory
pub struct Fixture {
    pub dir: TempDir,
    pub path: PathBuf,
}

/// Route `log` output through the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Write the builder's archive into a fresh temporary directory
pub fn write_fixture(builder: &MpqBuilder) -> Fixture {
    init_logging();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("fixture.mpq");
    builder.write_to(&path).expect("Failed to write fixture archive");
    Fixture { dir, path }
}

/// Generate test data of a specific size
pub fn generate_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

/// What the reader yields for audio written sector by sector
///
/// The audio codecs are lossy, so the expected bytes are the decode of each
/// encoded sector, or the raw sector when encoding did not shrink it.
pub fn expected_audio(pcm: &[u8], sector_size: usize, method: CompressionMethod) -> Vec<u8> {
    pcm.chunks(sector_size)
        .flat_map(|chunk| {
            let packed = compression::compress(chunk, method).expect("encode audio");
            if packed.len() < chunk.len() {
                compression::decompress(&packed, chunk.len()).expect("decode audio")
            } else {
                chunk.to_vec()
            }
        })
        .collect()
}

/// Largest absolute sample difference between two 16-bit PCM buffers
pub fn max_sample_error(a: &[u8], b: &[u8]) -> i32 {
    a.chunks_exact(2)
        .zip(b.chunks_exact(2))
        .map(|(x, y)| {
            let x = i16::from_le_bytes([x[0], x[1]]) as i32;
            let y = i16::from_le_bytes([y[0], y[1]]) as i32;
            (x - y).abs()
        })
        .max()
        .unwrap_or(0)
}
