//! Many threads reading one archive

use crate::common::{Fixture, write_fixture};
use d2_mpq::compression::CompressionMethod;
use d2_mpq::test_utils::{FixtureFile, MpqBuilder, Storage, compressible_data, random_data};
use d2_mpq::{Archive, HandleMode, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;
use std::thread;

fn fixture_files() -> Vec<(String, Vec<u8>)> {
    (0..8)
        .map(|i| {
            let data = if i % 2 == 0 {
                compressible_data(4000 + i * 37)
            } else {
                random_data(3000 + i * 41, i as u64)
            };
            (format!("data\\global\\file{i}.bin"), data)
        })
        .collect()
}

fn build() -> Fixture {
    let mut builder = MpqBuilder::new().hash_table_size(32);
    for (i, (name, data)) in fixture_files().into_iter().enumerate() {
        let file = match i % 4 {
            0 => FixtureFile::new(name, data),
            1 => FixtureFile::new(name, data).encrypted(),
            2 => FixtureFile::new(name, data)
                .storage(Storage::Compressed(CompressionMethod::Zlib))
                .fix_key(),
            _ => FixtureFile::new(name, data)
                .storage(Storage::Compressed(CompressionMethod::PKWare))
                .single_unit(),
        };
        builder = builder.file(file);
    }
    write_fixture(&builder)
}

fn hammer(archive: &Archive) {
    let files = fixture_files();
    thread::scope(|scope| {
        for t in 0..8 {
            let files = &files;
            scope.spawn(move || {
                for round in 0..5 {
                    let (name, expected) = &files[(t + round) % files.len()];
                    assert_eq!(&archive.read_file(name).unwrap(), expected, "{name}");

                    // Random-access stream reads interleaved with other threads
                    let mut stream = archive.open_stream(name).unwrap();
                    let offset = (t * 131 + round * 517) % expected.len();
                    stream.seek(SeekFrom::Start(offset as u64)).unwrap();
                    let mut tail = Vec::new();
                    stream.read_to_end(&mut tail).unwrap();
                    assert_eq!(&tail[..], &expected[offset..], "{name} @ {offset}");
                }
            });
        }
    });
}

#[test]
fn test_parallel_reads_shared_handle() {
    let fixture = build();
    let archive = OpenOptions::new()
        .handle_mode(HandleMode::Shared)
        .open(&fixture.path)
        .unwrap();
    hammer(&archive);
}

#[test]
fn test_parallel_reads_per_stream_handles() {
    let fixture = build();
    let archive = OpenOptions::new()
        .handle_mode(HandleMode::PerStream)
        .open(&fixture.path)
        .unwrap();
    hammer(&archive);
}

#[test]
fn test_archive_behind_arc() {
    let fixture = build();
    let archive = Arc::new(Archive::open(&fixture.path).unwrap());
    let files = Arc::new(fixture_files());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let archive = Arc::clone(&archive);
            let files = Arc::clone(&files);
            thread::spawn(move || {
                for (name, expected) in files.iter().skip(t) {
                    assert_eq!(&archive.read_file(name).unwrap(), expected);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
