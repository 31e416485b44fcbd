//! Names resolve regardless of separator and case

use crate::common::write_fixture;
use d2_mpq::compression::CompressionMethod;
use d2_mpq::path::{base_name, mpq_path_to_system, normalize_mpq_path};
use d2_mpq::test_utils::{FixtureFile, MpqBuilder, Storage, compressible_data};
use d2_mpq::{Archive, LookupMode, OpenOptions};
use pretty_assertions::assert_eq;

const STORED: &str = "data\\global\\ui\\panel\\invchar6.dc6";

#[test]
fn test_name_variants_read_identically() {
    let data = compressible_data(1500);
    let fixture = write_fixture(
        &MpqBuilder::new().file(
            FixtureFile::new(STORED, data.clone())
                .storage(Storage::Compressed(CompressionMethod::Zlib))
                .fix_key(),
        ),
    );

    for mode in [LookupMode::LinearScan, LookupMode::Probe] {
        let archive = OpenOptions::new().lookup_mode(mode).open(&fixture.path).unwrap();
        for name in [
            STORED,
            "data/global/ui/panel/invchar6.dc6",
            "DATA\\GLOBAL\\UI\\PANEL\\INVCHAR6.DC6",
            "Data/Global\\UI/Panel\\InvChar6.dc6",
        ] {
            assert_eq!(archive.read_file(name).unwrap(), data, "{mode:?} {name}");
        }
    }
}

#[test]
fn test_requested_name_is_kept() {
    let fixture = write_fixture(&MpqBuilder::new().file(FixtureFile::new(STORED, vec![1])));
    let archive = Archive::open(&fixture.path).unwrap();

    let info = archive.find_file("data/global/ui/panel/invchar6.dc6").unwrap();
    assert_eq!(info.filename, "data/global/ui/panel/invchar6.dc6");
}

#[test]
fn test_path_helpers() {
    assert_eq!(normalize_mpq_path("a/b/c.txt"), "a\\b\\c.txt");
    assert_eq!(base_name("a\\b/c.txt"), "c.txt");
    assert_eq!(base_name("plain.txt"), "plain.txt");

    let system = mpq_path_to_system("a\\b\\c.txt");
    assert!(system.ends_with("c.txt"));
    assert!(!system.contains(if cfg!(windows) { '/' } else { '\\' }));
}
