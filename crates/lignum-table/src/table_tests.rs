use std::io::Write as _;

use crate::test_utils::{build_dfa, parens_table};
use crate::{Action, END, GrammarLoadError, GrammarTable, VERSION, emit};

fn parens_bytes() -> Vec<u8> {
    let (data, dfas) = parens_table();
    emit(&data, &dfas).unwrap()
}

#[test]
fn load_valid_table() {
    let table = GrammarTable::from_bytes(parens_bytes()).unwrap();

    assert_eq!(table.name(), "parens");
    assert_eq!(table.header().version, VERSION);
    assert_eq!(table.symbol_count(), 7);
    assert_eq!(table.state_count(), 5);
    assert_eq!(table.dfa_count(), 2);
    assert_eq!(table.start_state(), 0);

    assert_eq!(table.symbol_for_name("number", true), Some(4));
    assert_eq!(table.symbol_for_name("(", false), Some(2));
    assert_eq!(table.symbol_for_name("(", true), None);
    // Hidden symbols are not looked up by name.
    assert_eq!(table.symbol_for_name("_start", true), None);
    assert_eq!(table.symbol_name(5), Some("expr"));
    assert_eq!(table.symbol_name(99), None);

    assert_eq!(table.actions(0, 2), &[Action::Shift(2)]);
    assert_eq!(table.actions(0, 3), &[]);
    assert_eq!(table.actions(4, END), &[Action::Reduce(1)]);
    assert_eq!(table.goto(0, 5), Some(1));
    assert_eq!(table.goto(2, 5), None);
    assert!(table.lexeme(4).is_some_and(|l| !l.matcher.is_literal()));
}

#[test]
fn total_size_is_section_aligned() {
    let bytes = parens_bytes();
    assert_eq!(bytes.len() % 64, 0);
    assert_eq!(&bytes[0..4], b"LGNM");
}

#[test]
fn dfa_bytes_roundtrip() {
    let table = GrammarTable::from_bytes(parens_bytes()).unwrap();
    assert_eq!(table.dfa_bytes(0), build_dfa(r"\d+").as_slice());
    assert_eq!(table.dfa_bytes(1), build_dfa(r"\s").as_slice());
}

#[test]
fn version_mismatch() {
    let mut bytes = parens_bytes();
    bytes[4..8].copy_from_slice(&(VERSION + 1).to_le_bytes());

    let err = GrammarTable::from_bytes(bytes).unwrap_err();
    assert!(matches!(err, GrammarLoadError::VersionMismatch { found } if found == VERSION + 1));
    insta::assert_snapshot!(err, @"grammar table version mismatch: found 2, engine expects 1");
}

#[test]
fn truncated_table() {
    let mut bytes = parens_bytes();
    bytes.truncate(bytes.len() - 1);

    let err = GrammarTable::from_bytes(bytes).unwrap_err();
    assert!(matches!(err, GrammarLoadError::SizeMismatch { .. }));
}

#[test]
fn truncated_below_header() {
    let bytes = parens_bytes()[..10].to_vec();

    let err = GrammarTable::from_bytes(bytes).unwrap_err();
    assert!(matches!(err, GrammarLoadError::FileTooSmall(10)));
}

#[test]
fn invalid_magic() {
    let mut bytes = parens_bytes();
    bytes[0] = b'X';

    let err = GrammarTable::from_bytes(bytes).unwrap_err();
    assert!(matches!(err, GrammarLoadError::InvalidMagic));
}

#[test]
fn corrupted_body_fails_checksum() {
    let mut bytes = parens_bytes();
    bytes[70] ^= 0xFF;

    let err = GrammarTable::from_bytes(bytes).unwrap_err();
    assert!(matches!(err, GrammarLoadError::ChecksumMismatch { .. }));
}

#[test]
fn dangling_start_state_is_inconsistent() {
    let (mut data, dfas) = parens_table();
    data.start_state = 99;
    let bytes = emit(&data, &dfas).unwrap();

    let err = GrammarTable::from_bytes(bytes).unwrap_err();
    assert!(matches!(err, GrammarLoadError::Inconsistent(_)));
}

#[test]
fn dangling_shift_is_inconsistent() {
    let (mut data, dfas) = parens_table();
    data.states[0].actions[0].actions = vec![Action::Shift(42)];
    let bytes = emit(&data, &dfas).unwrap();

    let err = GrammarTable::from_bytes(bytes).unwrap_err();
    assert!(matches!(err, GrammarLoadError::Inconsistent(_)));
}

#[test]
fn missing_dfa_is_inconsistent() {
    let (data, mut dfas) = parens_table();
    dfas.truncate(1);
    let bytes = emit(&data, &dfas).unwrap();

    let err = GrammarTable::from_bytes(bytes).unwrap_err();
    assert!(matches!(err, GrammarLoadError::Inconsistent(_)));
}

#[test]
fn garbage_dfa_is_rejected() {
    let (data, mut dfas) = parens_table();
    dfas[0] = vec![0u8; 16];
    let bytes = emit(&data, &dfas).unwrap();

    let err = GrammarTable::from_bytes(bytes).unwrap_err();
    assert!(matches!(err, GrammarLoadError::InvalidDfa { index: 0, .. }));
}

#[test]
fn load_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&parens_bytes()).unwrap();

    let table = GrammarTable::from_path(file.path()).unwrap();
    assert_eq!(table.name(), "parens");
}

#[test]
fn load_from_missing_path() {
    let err = GrammarTable::from_path("/nonexistent/grammar.lgnm").unwrap_err();
    assert!(matches!(err, GrammarLoadError::Io(_)));
}
