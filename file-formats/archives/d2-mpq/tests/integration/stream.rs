//! Streaming reads, seeking, and per-sector failures

use crate::common::write_fixture;
use d2_mpq::compression::CompressionMethod;
use d2_mpq::test_utils::{FixtureFile, MpqBuilder, Storage, compressible_data, random_data};
use d2_mpq::{Archive, Error, HandleMode, OpenOptions};
use pretty_assertions::assert_eq;
use std::io::{Read, Seek, SeekFrom};

fn fixture_with(data: &[u8], storage: Storage) -> crate::common::Fixture {
    write_fixture(
        &MpqBuilder::new()
            .file(FixtureFile::new("data\\stream.bin", data.to_vec()).storage(storage)),
    )
}

#[test]
fn test_read_at_boundaries() {
    let data = random_data(512 * 4 + 77, 11);
    for storage in [Storage::Raw, Storage::Compressed(CompressionMethod::Zlib)] {
        let fixture = fixture_with(&data, storage);
        let archive = Archive::open(&fixture.path).unwrap();
        let mut stream = archive.open_stream("data\\stream.bin").unwrap();
        assert_eq!(stream.len(), data.len() as u64);

        let cases = [
            (0, 512),
            (0, 513),
            (511, 1),
            (511, 2),
            (512, 512),
            (1000, 1500),
            (512 * 4, 77),
            (512 * 4 + 70, 100),
        ];
        for (offset, len) in cases {
            let mut buf = vec![0u8; len];
            let n = stream.read_at(offset as u64, &mut buf).unwrap();
            let end = (offset + len).min(data.len());
            assert_eq!(n, end - offset, "{storage:?} {offset}+{len}");
            assert_eq!(&buf[..n], &data[offset..end], "{storage:?} {offset}+{len}");
        }

        let mut buf = [0u8; 4];
        assert_eq!(stream.read_at(data.len() as u64, &mut buf).unwrap(), 0);
        assert_eq!(stream.read_at(u64::MAX, &mut buf).unwrap(), 0);
    }
}

#[test]
fn test_read_and_seek() {
    let data = compressible_data(3000);
    let fixture = fixture_with(&data, Storage::Compressed(CompressionMethod::PKWare));
    let archive = Archive::open(&fixture.path).unwrap();
    let mut stream = archive.open_stream("data/stream.bin").unwrap();

    let mut head = [0u8; 100];
    stream.read_exact(&mut head).unwrap();
    assert_eq!(&head[..], &data[..100]);
    assert_eq!(stream.position(), 100);

    stream.seek(SeekFrom::Current(900)).unwrap();
    let mut mid = [0u8; 50];
    stream.read_exact(&mut mid).unwrap();
    assert_eq!(&mid[..], &data[1000..1050]);

    stream.seek(SeekFrom::End(-10)).unwrap();
    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, &data[data.len() - 10..]);

    stream.rewind().unwrap();
    let mut all = Vec::new();
    stream.read_to_end(&mut all).unwrap();
    assert_eq!(all, data);

    assert!(stream.seek(SeekFrom::Start(10_000)).is_ok());
    assert_eq!(stream.read(&mut head).unwrap(), 0);
}

#[test]
fn test_stream_info() {
    let data = compressible_data(2000);
    let fixture = fixture_with(&data, Storage::Compressed(CompressionMethod::Zlib));
    let archive = Archive::open(&fixture.path).unwrap();
    let stream = archive.open_stream("data\\stream.bin").unwrap();

    let info = stream.info();
    assert_eq!(info.file_size(), 2000);
    assert!(info.is_multi_compressed());
    assert!(!info.is_encrypted());
    assert!(!stream.is_empty());
}

#[test]
fn test_empty_file() {
    let fixture = write_fixture(
        &MpqBuilder::new()
            .file(FixtureFile::new("empty.bin", Vec::new()))
            .file(
                FixtureFile::new("empty_zlib.bin", Vec::new())
                    .storage(Storage::Compressed(CompressionMethod::Zlib))
                    .encrypted(),
            ),
    );
    let archive = Archive::open(&fixture.path).unwrap();

    for name in ["empty.bin", "empty_zlib.bin"] {
        let mut stream = archive.open_stream(name).unwrap();
        assert!(stream.is_empty());
        let mut out = Vec::new();
        assert_eq!(stream.read_to_end(&mut out).unwrap(), 0);
        assert_eq!(archive.read_file(name).unwrap(), Vec::<u8>::new());
    }
}

#[test]
fn test_corrupt_offsets_fail_on_read() {
    let fixture = write_fixture(
        &MpqBuilder::new()
            .file(
                FixtureFile::new("broken.bin", compressible_data(2000))
                    .storage(Storage::Compressed(CompressionMethod::Zlib))
                    .corrupt_offsets(),
            )
            .file(FixtureFile::new("fine.bin", vec![9; 10])),
    );
    let archive = Archive::open(&fixture.path).unwrap();

    let mut stream = archive.open_stream("broken.bin").unwrap();
    let mut buf = [0u8; 16];
    let err = stream.read_at(0, &mut buf).unwrap_err();
    assert!(matches!(err, Error::Corrupt(_)), "{err}");

    let io_err = stream.read(&mut buf).unwrap_err();
    assert_eq!(io_err.kind(), std::io::ErrorKind::InvalidData);

    assert_eq!(archive.read_file("fine.bin").unwrap(), vec![9; 10]);
}

#[test]
fn test_unsupported_codec_in_one_sector() {
    let fixture = write_fixture(
        &MpqBuilder::new().file(
            FixtureFile::new("lzma.bin", compressible_data(1024)).storage(Storage::Tagged(0x12)),
        ),
    );
    let archive = Archive::open(&fixture.path).unwrap();
    let mut stream = archive.open_stream("lzma.bin").unwrap();

    let mut buf = [0u8; 8];
    let err = stream.read_at(600, &mut buf).unwrap_err();
    assert!(matches!(err, Error::UnsupportedCodec { tag: 0x12 }));
    assert_eq!(err.to_string(), "unsupported codec 0x12");
}

#[test]
fn test_per_stream_handles() {
    let data = random_data(5000, 5);
    let fixture = write_fixture(
        &MpqBuilder::new()
            .file(FixtureFile::new("a.bin", data.clone()).encrypted())
            .file(
                FixtureFile::new("b.bin", compressible_data(5000))
                    .storage(Storage::Compressed(CompressionMethod::Zlib)),
            ),
    );
    let archive = OpenOptions::new()
        .handle_mode(HandleMode::PerStream)
        .open(&fixture.path)
        .unwrap();

    let mut a = archive.open_stream("a.bin").unwrap();
    let mut b = archive.open_stream("b.bin").unwrap();

    // Interleave reads so both streams keep their own position
    let mut out_a = Vec::new();
    let mut out_b = Vec::new();
    let mut chunk = [0u8; 333];
    loop {
        let na = a.read(&mut chunk).unwrap();
        out_a.extend_from_slice(&chunk[..na]);
        let nb = b.read(&mut chunk).unwrap();
        out_b.extend_from_slice(&chunk[..nb]);
        if na == 0 && nb == 0 {
            break;
        }
    }
    assert_eq!(out_a, data);
    assert_eq!(out_b, compressible_data(5000));
}
