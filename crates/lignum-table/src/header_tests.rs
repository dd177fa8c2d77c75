use super::*;

#[test]
fn header_size() {
    assert_eq!(std::mem::size_of::<Header>(), 64);
}

#[test]
fn header_default() {
    let h = Header::default();
    assert!(h.validate_magic());
    assert!(h.validate_version());
    assert_eq!(h.total_size, 0);
}

#[test]
fn header_roundtrip() {
    let h = Header {
        magic: MAGIC,
        version: VERSION,
        checksum: 0x12345678,
        total_size: 1024,
        tables_size: 300,
        dfa_blob_size: 256,
        state_count: 40,
        production_count: 12,
        lex_mode_count: 6,
        symbol_count: 20,
        field_count: 3,
        lexeme_count: 9,
        dfa_count: 2,
        external_count: 1,
        _reserved: [0; 18],
    };

    let bytes = h.to_bytes();
    assert_eq!(bytes.len(), 64);

    let decoded = Header::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, h);
}

#[test]
fn header_too_short() {
    assert!(Header::from_bytes(&[0u8; 63]).is_none());
}

#[test]
fn wrong_version_is_detected() {
    let h = Header {
        version: VERSION + 1,
        ..Default::default()
    };
    assert!(h.validate_magic());
    assert!(!h.validate_version());
}

#[test]
fn offsets_are_section_aligned() {
    let h = Header {
        tables_size: 100,
        dfa_count: 3,
        dfa_blob_size: 10,
        ..Default::default()
    };

    let offsets = h.compute_offsets();
    assert_eq!(offsets.tables, 64);
    // 64 + 100 = 164 -> 192
    assert_eq!(offsets.dfa_table, 192);
    // 192 + 16 = 208 -> 256
    assert_eq!(offsets.dfa_blob, 256);
    assert_eq!(offsets.end, 266);
}

#[test]
fn offsets_of_huge_sizes_saturate() {
    let h = Header {
        tables_size: u32::MAX,
        dfa_blob_size: u32::MAX,
        ..Default::default()
    };
    assert_eq!(h.compute_offsets().end, u32::MAX);
}
