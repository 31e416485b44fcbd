//! Property tests over generated archives

use crate::common::write_fixture;
use d2_mpq::compression::CompressionMethod;
use d2_mpq::test_utils::{FixtureFile, MpqBuilder, Storage};
use d2_mpq::{Archive, LookupMode, OpenOptions};
use proptest::prelude::*;

fn storage_strategy() -> impl Strategy<Value = Storage> {
    prop_oneof![
        Just(Storage::Raw),
        Just(Storage::Compressed(CompressionMethod::Zlib)),
        Just(Storage::Compressed(CompressionMethod::PKWare)),
        Just(Storage::Imploded),
    ]
}

fn data_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..3000),
        // Low-entropy data so the codecs actually shrink sectors
        prop::collection::vec(0u8..4, 0..3000),
    ]
}

/// Backslash-separated lowercase paths with a three-letter extension
const ARCHIVE_PATH: &str = "[a-z]{1,8}(\\\\[a-z]{1,8}){0,2}\\.[a-z]{3}";

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn stored_bytes_read_back(
        data in data_strategy(),
        storage in storage_strategy(),
        encrypted in any::<bool>(),
        fix_key in any::<bool>(),
        single_unit in any::<bool>(),
        block_size in 0u16..3,
    ) {
        let mut file = FixtureFile::new("data\\prop\\file.bin", data.clone()).storage(storage);
        if encrypted {
            file = file.encrypted();
        }
        if fix_key {
            file = file.fix_key();
        }
        if single_unit {
            file = file.single_unit();
        }
        let fixture = write_fixture(&MpqBuilder::new().block_size(block_size).file(file));
        let archive = Archive::open(&fixture.path).unwrap();

        prop_assert_eq!(archive.read_file("data/prop/file.bin").unwrap(), data);
    }

    #[test]
    fn read_at_matches_slice(
        data in prop::collection::vec(0u8..8, 1..4000),
        offset in 0usize..4500,
        len in 0usize..1500,
    ) {
        let fixture = write_fixture(
            &MpqBuilder::new().file(
                FixtureFile::new("slice.bin", data.clone())
                    .storage(Storage::Compressed(CompressionMethod::Zlib))
                    .encrypted(),
            ),
        );
        let archive = Archive::open(&fixture.path).unwrap();
        let mut stream = archive.open_stream("slice.bin").unwrap();

        let mut buf = vec![0u8; len];
        let n = stream.read_at(offset as u64, &mut buf).unwrap();
        let start = offset.min(data.len());
        let end = (offset + len).min(data.len());
        prop_assert_eq!(n, end - start);
        prop_assert_eq!(&buf[..n], &data[start..end]);
    }

    #[test]
    fn lookup_modes_agree(names in prop::collection::hash_set(ARCHIVE_PATH, 1..20)) {
        let mut builder = MpqBuilder::new().hash_table_size(32);
        for (i, name) in names.iter().enumerate() {
            builder = builder.file(FixtureFile::new(name.clone(), vec![i as u8; 3]));
        }
        let fixture = write_fixture(&builder);

        let scan = OpenOptions::new()
            .lookup_mode(LookupMode::LinearScan)
            .open(&fixture.path)
            .unwrap();
        let probe = OpenOptions::new()
            .lookup_mode(LookupMode::Probe)
            .open(&fixture.path)
            .unwrap();

        for name in &names {
            let a = scan.find_file(name).unwrap();
            let b = probe.find_file(name).unwrap();
            prop_assert_eq!(a.block_index, b.block_index);
            prop_assert_eq!(scan.read_file(name).unwrap(), probe.read_file(name).unwrap());
        }
    }
}
