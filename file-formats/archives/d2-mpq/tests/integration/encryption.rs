//! Encrypted files and per-name key derivation

use crate::common::write_fixture;
use d2_mpq::compression::CompressionMethod;
use d2_mpq::crypto::{hash_string, hash_type};
use d2_mpq::test_utils::{FixtureFile, MpqBuilder, Storage, compressible_data, random_data};
use d2_mpq::{Archive, Error};
use pretty_assertions::assert_eq;

#[test]
fn test_encrypted_variants() {
    let data = compressible_data(2500);
    let noise = random_data(1500, 3);
    let zlib = Storage::Compressed(CompressionMethod::Zlib);

    let fixture = write_fixture(
        &MpqBuilder::new()
            .file(FixtureFile::new("enc\\raw.bin", noise.clone()).encrypted())
            .file(FixtureFile::new("enc\\zlib.bin", data.clone()).storage(zlib).encrypted())
            .file(FixtureFile::new("enc\\fixed.bin", data.clone()).storage(zlib).fix_key())
            .file(FixtureFile::new("enc\\fixed_raw.bin", noise.clone()).fix_key())
            .file(
                FixtureFile::new("enc\\unit.bin", data.clone())
                    .storage(zlib)
                    .single_unit()
                    .fix_key(),
            )
            .file(
                FixtureFile::new("enc\\imploded.bin", data.clone())
                    .storage(Storage::Imploded)
                    .encrypted(),
            ),
    );
    let archive = Archive::open(&fixture.path).unwrap();

    assert_eq!(archive.read_file("enc\\raw.bin").unwrap(), noise);
    assert_eq!(archive.read_file("enc\\zlib.bin").unwrap(), data);
    assert_eq!(archive.read_file("enc\\fixed.bin").unwrap(), data);
    assert_eq!(archive.read_file("enc\\fixed_raw.bin").unwrap(), noise);
    assert_eq!(archive.read_file("enc\\unit.bin").unwrap(), data);
    assert_eq!(archive.read_file("enc\\imploded.bin").unwrap(), data);
}

#[test]
fn test_tiny_encrypted_files() {
    let mut builder = MpqBuilder::new();
    for len in 1..=5 {
        builder =
            builder.file(FixtureFile::new(format!("tiny{len}.bin"), vec![0x5A; len]).encrypted());
    }
    let fixture = write_fixture(&builder);
    let archive = Archive::open(&fixture.path).unwrap();

    for len in 1..=5 {
        assert_eq!(archive.read_file(&format!("tiny{len}.bin")).unwrap(), vec![0x5A; len]);
    }
}

#[test]
fn test_shared_block_gets_seed_per_name() {
    let data = compressible_data(1200);
    let fixture = write_fixture(
        &MpqBuilder::new()
            .file(
                FixtureFile::new("data\\local\\orig.bin", data.clone())
                    .storage(Storage::Compressed(CompressionMethod::Zlib))
                    .encrypted(),
            )
            .alias("data\\other\\copy.bin", "data\\local\\orig.bin")
            .alias("data\\other\\orig.bin", "data\\local\\orig.bin"),
    );
    let archive = Archive::open(&fixture.path).unwrap();

    let original = archive.find_file("data\\local\\orig.bin").unwrap();
    let renamed = archive.find_file("data\\other\\copy.bin").unwrap();
    let moved = archive.find_file("data\\other\\orig.bin").unwrap();

    assert_eq!(original.block_index, renamed.block_index);
    assert_eq!(original.block_index, moved.block_index);
    assert_eq!(original.seed, hash_string("orig.bin", hash_type::FILE_KEY));
    assert_eq!(renamed.seed, hash_string("copy.bin", hash_type::FILE_KEY));
    assert_ne!(original.seed, renamed.seed);
    assert_eq!(original.seed, moved.seed);

    // Only the base name feeds the key
    assert_eq!(archive.read_file("data\\other\\orig.bin").unwrap(), data);
    assert!(matches!(
        archive.read_file("data\\other\\copy.bin"),
        Err(Error::Corrupt(_))
    ));
    assert_eq!(archive.read_file("data\\local\\orig.bin").unwrap(), data);
}

#[test]
fn test_corrupt_encrypted_offsets_fail_on_open() {
    let fixture = write_fixture(
        &MpqBuilder::new().file(
            FixtureFile::new("broken.bin", compressible_data(2000))
                .storage(Storage::Compressed(CompressionMethod::Zlib))
                .encrypted()
                .corrupt_offsets(),
        ),
    );
    let archive = Archive::open(&fixture.path).unwrap();

    let err = archive.open_stream("broken.bin").unwrap_err();
    assert!(matches!(err, Error::Corrupt(_)), "{err}");
    assert!(err.is_corruption());
}

#[test]
fn test_sector_crc_table_accepted() {
    let data = compressible_data(3000);
    let fixture = write_fixture(
        &MpqBuilder::new()
            .file(
                FixtureFile::new("crc.bin", data.clone())
                    .storage(Storage::Compressed(CompressionMethod::Zlib))
                    .sector_crc(),
            )
            .file(
                FixtureFile::new("crc_enc.bin", data.clone())
                    .storage(Storage::Compressed(CompressionMethod::PKWare))
                    .sector_crc()
                    .encrypted(),
            ),
    );
    let archive = Archive::open(&fixture.path).unwrap();

    assert!(archive.find_file("crc_enc.bin").unwrap().has_sector_crc());
    assert_eq!(archive.read_file("crc.bin").unwrap(), data);
    assert_eq!(archive.read_file("crc_enc.bin").unwrap(), data);
}
