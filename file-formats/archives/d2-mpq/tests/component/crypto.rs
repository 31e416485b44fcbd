//! Hashing and cipher behavior through the public API

use d2_mpq::crypto::{
    ENCRYPTION_TABLE, decrypt_block, decrypt_bytes, encrypt_block, encrypt_bytes, file_key,
    hash_string, hash_type,
};
use d2_mpq::Error;

#[test]
fn test_known_table_words() {
    assert_eq!(ENCRYPTION_TABLE[0], 0x55C6_36E2);
    assert_eq!(ENCRYPTION_TABLE[0x400], 0x193A_A698);
}

#[test]
fn test_golden_hashes() {
    let vectors = [
        ("(hash table)", hash_type::FILE_KEY, 0xC3AF_3770),
        ("(block table)", hash_type::FILE_KEY, 0xEC83_B3A3),
        ("(listfile)", hash_type::TABLE_OFFSET, 0x5F3D_E859),
        ("path\\to\\file", hash_type::TABLE_OFFSET, 0x534C_C8EE),
        ("file.txt", hash_type::TABLE_OFFSET, 0x3EA9_8D7A),
        ("interface\\glue\\mainmenu.blp", hash_type::TABLE_OFFSET, 0x2BBE_7C09),
    ];

    for (key, kind, expected) in vectors {
        assert_eq!(hash_string(key, kind), expected, "{key} / {kind}");
    }
}

#[test]
fn test_hash_ignores_case_and_separator() {
    for kind in [
        hash_type::TABLE_OFFSET,
        hash_type::NAME_A,
        hash_type::NAME_B,
        hash_type::FILE_KEY,
    ] {
        assert_eq!(
            hash_string("Data/Global/Excel/Armor.txt", kind),
            hash_string("DATA\\GLOBAL\\EXCEL\\ARMOR.TXT", kind)
        );
    }
}

#[test]
fn test_block_cipher_inverts() {
    let original: Vec<u32> = (0..64).map(|i| i * 0x0101_0101).collect();
    for key in [0, 1, 0xC3AF_3770, u32::MAX] {
        let mut data = original.clone();
        encrypt_block(&mut data, key);
        assert_ne!(data, original, "key {key:#X}");
        decrypt_block(&mut data, key);
        assert_eq!(data, original, "key {key:#X}");
    }
}

#[test]
fn test_decrypt_bytes_short_input() {
    for len in 0..4 {
        let mut data = vec![0xAB; len];
        let err = decrypt_bytes(&mut data, 0x1234).unwrap_err();
        assert!(matches!(err, Error::Crypto(_)), "len {len}");
    }
}

#[test]
fn test_decrypt_bytes_keeps_tail() {
    let original: Vec<u8> = (0..11).collect();
    let mut data = original.clone();
    encrypt_bytes(&mut data, 0xDEAD_BEEF);
    assert_eq!(&data[8..], &original[8..]);

    decrypt_bytes(&mut data, 0xDEAD_BEEF).unwrap();
    assert_eq!(data, original);
}

#[test]
fn test_file_key_uses_base_name() {
    let base = hash_string("armor.txt", hash_type::FILE_KEY);
    assert_eq!(file_key("data\\global\\excel\\armor.txt", 0x400, 100, false), base);
    assert_eq!(file_key("data/global/excel/armor.txt", 0x400, 100, false), base);
    assert_eq!(
        file_key("data\\global\\excel\\armor.txt", 0x400, 100, true),
        base.wrapping_add(0x400) ^ 100
    );
}
