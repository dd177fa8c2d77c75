use std::io::Write as _;

use lignum_core::{Grammar, Rule};
use lignum_table::GrammarLoadError;

use crate::Language;
use crate::test_utils::{arithmetic, parens, parse};

fn parens_bytes() -> Vec<u8> {
    let grammar = Grammar::new("parens")
        .rule(
            "expr",
            Rule::seq([Rule::string("("), Rule::sym("number"), Rule::string(")")]),
        )
        .rule("number", Rule::pattern(r"\d+"));
    lignum_generate::generate(&grammar).unwrap()
}

#[test]
fn loads_from_a_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&parens_bytes()).unwrap();

    let language = Language::from_path(file.path()).unwrap();

    assert_eq!(language.name(), "parens");
    assert_eq!(language.abi_version(), 1);
    assert_eq!(parse(&language, "(1)").to_sexp(), "(expr (number))");
}

#[test]
fn rejects_corrupted_tables() {
    let mut bytes = parens_bytes();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;

    let err = Language::load(&bytes).unwrap_err();
    assert!(matches!(err, GrammarLoadError::ChecksumMismatch { .. }), "{err}");

    let err = Language::load(b"LGNM").unwrap_err();
    assert!(matches!(err, GrammarLoadError::FileTooSmall(4)), "{err}");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = Language::from_path(dir.path().join("absent.lgnm")).unwrap_err();

    assert!(matches!(err, GrammarLoadError::Io(_)), "{err}");
}

#[test]
fn symbol_and_field_lookups() {
    let language = arithmetic(true);
    let expr = language.symbol_for_name("expr", true).unwrap();

    assert_eq!(language.symbol_name(expr), Some("expr"));
    assert!(language.symbol_for_name("+", false).is_some());
    assert_eq!(language.symbol_for_name("+", true), None);
    let left = language.field_id_for_name("left").unwrap();
    assert_eq!(language.field_name(left), Some("left"));
    assert!(language.symbol_count() > expr as usize);
    assert!(language.state_count() > 0);
    assert!(language.external_token_names().is_empty());
}

#[test]
fn clones_share_tables() {
    let language = parens();
    let clone = language.clone();

    assert!(language.same_tables(&clone));
    assert!(!language.same_tables(&parens()));
    assert!(!clone.has_external_scanner());
    insta::assert_snapshot!(
        format!("{language:?}"),
        @r#"Language { name: "parens", symbols: 7, states: 5, external_scanner: false }"#
    );
}
