use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use indoc::indoc;
use lignum_core::{Grammar, Rule};

use crate::test_utils::{arithmetic, language, parens, parse, statements};
use crate::{
    CancelReason, ExternalScanner, ExternalToken, ParseError, ParseOptions, Parser, PrintTracer,
    ScanContext, ScannerState, ValidExternals, Verbosity,
};

#[test]
fn parses_balanced_parens() {
    let tree = parse(&parens(), "(42)");

    insta::assert_snapshot!(tree.dump(), @r#"
    expr [0..4)
      "(" [0..1)
      number [1..3)
      ")" [3..4)
    "#);
    assert_eq!(tree.to_sexp(), "(expr (number))");
    assert_eq!(tree.error_cost(), 0);
}

#[test]
fn leading_and_trailing_separators_belong_to_the_root() {
    let tree = parse(&parens(), "  (1)  ");

    insta::assert_snapshot!(tree.dump(), @r#"
    expr [0..7)
      "(" [2..3)
      number [3..4)
      ")" [4..5)
    "#);
}

#[test]
fn unexpected_character_is_skipped() {
    let tree = parse(&parens(), "(4x)");

    insta::assert_snapshot!(tree.dump(), @r#"
    expr [0..4)
      "(" [0..1)
      number [1..2)
      ERROR [2..3)
      ")" [3..4)
    "#);
    assert_eq!(tree.to_sexp(), "(expr (number) (ERROR))");
    assert_eq!(tree.error_cost(), 101);
    assert!(tree.root_node().has_error());
}

#[test]
fn missing_token_is_inserted_at_end_of_input() {
    let tree = parse(&parens(), "(42");

    insta::assert_snapshot!(tree.dump(), @r#"
    expr [0..3)
      "(" [0..1)
      number [1..3)
      MISSING ")" [3..3)
    "#);
    assert_eq!(tree.to_sexp(), r#"(expr (number) (MISSING ")"))"#);
    assert_eq!(tree.error_cost(), 110);

    let missing = tree.root_node().child(2).unwrap();
    assert!(missing.is_missing());
    assert!(!missing.is_named());
}

#[test]
fn empty_input_becomes_error_root() {
    let tree = parse(&parens(), "");

    insta::assert_snapshot!(tree.dump(), @"ERROR [0..0)");
    assert!(tree.root_node().is_error());
    assert!(tree.error_cost() > 0);
}

#[test]
fn precedence_shapes_binary_expressions() {
    let tree = parse(&arithmetic(true), "1+2*3");

    insta::assert_snapshot!(tree.dump(), @r#"
    expr [0..5)
      left: expr [0..1)
        number [0..1)
      "+" [1..2)
      right: expr [2..5)
        left: expr [2..3)
          number [2..3)
        "*" [3..4)
        right: expr [4..5)
          number [4..5)
    "#);
    assert_eq!(
        tree.to_sexp(),
        "(expr left: (expr (number)) right: (expr left: (expr (number)) right: (expr (number))))"
    );
}

#[test]
fn left_associativity_nests_to_the_left() {
    let tree = parse(&arithmetic(true), "1+2+3");
    let root = tree.root_node();

    let left = root.child_by_field_name("left").unwrap();
    assert_eq!(left.byte_range(), 0..3);
    assert_eq!(root.child_by_field_name("right").unwrap().byte_range(), 4..5);
}

#[test]
fn ambiguous_grammar_forks_and_still_parses() {
    let language = arithmetic(false);
    let parser = Parser::new(&language);
    let mut tracer = PrintTracer::new("1+2*3+4", &language, Verbosity::Default);

    let tree = parser.parse_with_tracer("1+2*3+4", &mut tracer).unwrap();

    assert!(!tree.root_node().has_error());
    assert_eq!(tree.root_node().byte_range(), 0..7);
    assert!(tracer.lines().iter().any(|line| line.contains("fork")));
    assert_eq!(tracer.lines().last().map(String::as_str), Some("accept cost 0"));
}

#[test]
fn single_version_still_parses_ambiguous_input() {
    let language = arithmetic(false);
    let mut parser = Parser::new(&language);
    parser.set_options(ParseOptions::new().max_versions(1));

    let tree = parser.parse("1+2*3+4").unwrap();

    assert!(!tree.root_node().has_error());
}

#[test]
fn dynamic_precedence_picks_among_accepted_versions() {
    let language = language(
        &Grammar::new("dynamic")
            .rule(
                "item",
                Rule::choice([Rule::sym("type_name"), Rule::sym("variable")]),
            )
            .rule("type_name", Rule::prec_dynamic(1, Rule::sym("identifier")))
            .rule("variable", Rule::sym("identifier"))
            .rule("identifier", Rule::pattern("[a-z]+"))
            .conflict(["type_name", "variable"]),
    );

    let tree = parse(&language, "abc");

    insta::assert_snapshot!(tree.dump(), @r"
    item [0..3)
      type_name [0..3)
        identifier [0..3)
    ");
}

#[test]
fn extras_stay_where_they_appear() {
    let tree = parse(&statements(), "x; # note\ny;");

    insta::assert_snapshot!(tree.dump(), @r#"
    program [0..12)
      expression_statement [0..2)
        identifier [0..1)
        ";" [1..2)
      comment [3..9) extra
      expression_statement [10..12)
        identifier [10..11)
        ";" [11..12)
    "#);
}

#[test]
fn hidden_rules_are_spliced_and_fields_inherited() {
    let tree = parse(&statements(), "let a = (b + 1);");
    let statement = tree.root_node().child(0).unwrap();

    assert_eq!(statement.kind(), "let_statement");
    assert_eq!(statement.child_by_field_name("name").unwrap().utf8_text().unwrap(), "a");
    let value = statement.child_by_field_name("value").unwrap();
    assert_eq!(value.kind(), "parenthesized");
    assert_eq!(value.named_child(0).unwrap().kind(), "sum");
    assert_eq!(
        tree.to_sexp(),
        "(program (let_statement name: (identifier) value: (parenthesized (sum left: (identifier) right: (number)))))"
    );
}

#[test]
fn keywords_need_a_word_boundary() {
    let tree = parse(&statements(), "letter;");

    assert_eq!(tree.to_sexp(), "(program (expression_statement (identifier)))");
}

#[test]
fn unexpected_tokens_join_one_error_node() {
    let tree = parse(&statements(), "x = 1;");

    insta::assert_snapshot!(tree.dump(), @r#"
    program [0..6)
      expression_statement [0..6)
        identifier [0..1)
        ERROR [2..5)
          "=" [2..3)
          number [4..5)
        ";" [5..6)
    "#);
    assert_eq!(tree.error_cost(), 202);
}

#[test]
fn garbage_alone_sits_directly_under_an_empty_start_rule() {
    let tree = parse(&statements(), "@");

    insta::assert_snapshot!(tree.dump(), @r"
    program [0..1)
      ERROR [0..1)
    ");
    assert_eq!(tree.root_node().child_count(), 1);
    assert_eq!(tree.error_cost(), 101);
}

#[test]
fn every_input_produces_a_tree_covering_it() {
    let language = statements();
    let inputs = [
        "",
        ";;;",
        "let",
        "let = ;",
        "((((",
        "))) x;",
        "x + + y;",
        "let a = 1 let b = 2;",
        "@@@ # unterminated",
    ];
    for text in inputs {
        let tree = parse(&language, text);
        assert_eq!(tree.root_node().byte_range(), 0..text.len(), "{text:?}");
        assert_eq!(tree.source(), text.as_bytes());
    }
}

#[test]
fn deep_nesting_does_not_overflow() {
    let depth = 20_000;
    let text = format!("{}x{};", "(".repeat(depth), ")".repeat(depth));

    let tree = parse(&statements(), &text);

    assert!(!tree.root_node().has_error());
    let long = format!("{};", "x + ".repeat(depth) + "y");
    let tree = parse(&statements(), &long);
    assert!(!tree.root_node().has_error());
}

#[test]
fn chunked_input_matches_whole_input() {
    let text = indoc! {"
        let total = a + 1;
        # done
        total;
    "};
    let language = statements();
    let parser = Parser::new(&language);

    let bytes = text.as_bytes();
    let tree = parser
        .parse_with(|offset| &bytes[offset.min(bytes.len())..(offset + 5).min(bytes.len())])
        .unwrap();

    assert_eq!(tree.dump(), parse(&language, text).dump());
}

#[test]
fn budget_cancels_the_parse() {
    let language = parens();
    let mut parser = Parser::new(&language);
    parser.set_options(ParseOptions::new().budget(1));

    let err = parser.parse("(1)").unwrap_err();

    assert_eq!(err, ParseError::Cancelled(CancelReason::Budget(1)));
    assert_eq!(err.to_string(), "parse cancelled: operation budget of 1 exhausted");
}

#[test]
fn flag_cancels_the_parse() {
    let language = parens();
    let flag = Arc::new(AtomicBool::new(true));
    let mut parser = Parser::new(&language);
    parser.set_options(ParseOptions::new().cancellation_flag(flag).check_interval(1));

    let err = parser.parse("(1)").unwrap_err();

    assert_eq!(err, ParseError::Cancelled(CancelReason::Flag));
}

#[test]
fn elapsed_deadline_cancels_the_parse() {
    let language = parens();
    let mut parser = Parser::new(&language);
    parser.set_options(ParseOptions::new().timeout(Duration::ZERO).check_interval(1));

    let err = parser.parse("(1)").unwrap_err();

    assert_eq!(err, ParseError::Cancelled(CancelReason::Deadline));
}

#[test]
fn generous_budget_does_not_cancel() {
    let language = parens();
    let mut parser = Parser::new(&language);
    parser.set_options(ParseOptions::new().budget(1_000));

    assert!(parser.parse("(1)").is_ok());
}

/// Recognizes `<<...>>` blocks and counts them in its state.
struct RawScanner;

impl ExternalScanner for RawScanner {
    fn scan(
        &self,
        ctx: &mut ScanContext<'_>,
        valid: &ValidExternals,
        state: &mut ScannerState,
    ) -> Option<ExternalToken> {
        if !valid.contains(0) {
            return None;
        }
        while ctx.lookahead().is_some_and(char::is_whitespace) {
            ctx.skip();
        }
        for _ in 0..2 {
            if ctx.lookahead() != Some('<') {
                return None;
            }
            ctx.advance();
        }
        loop {
            match ctx.lookahead() {
                None => return None,
                Some('>') => {
                    ctx.advance();
                    if ctx.lookahead() == Some('>') {
                        ctx.advance();
                        break;
                    }
                }
                Some(_) => ctx.advance(),
            }
        }
        let count = state.bytes().first().copied().unwrap_or(0);
        state.set(vec![count + 1]);
        Some(ExternalToken::new(0))
    }
}

fn raw_language() -> crate::Language {
    language(
        &Grammar::new("raw")
            .rule(
                "document",
                Rule::repeat(Rule::choice([Rule::sym("word"), Rule::sym("raw")])),
            )
            .rule("word", Rule::pattern("[a-z]+"))
            .external(Rule::sym("raw")),
    )
    .with_external_scanner(RawScanner)
}

#[test]
fn external_scanner_produces_tokens() {
    let language = raw_language();
    assert_eq!(language.external_token_names(), vec!["raw"]);

    let tree = parse(&language, "ab <<x y>> cd");

    insta::assert_snapshot!(tree.dump(), @r"
    document [0..13)
      word [0..2)
      raw [3..10)
      word [11..13)
    ");
}

#[test]
fn unterminated_external_token_falls_back_to_the_lexer() {
    let tree = parse(&raw_language(), "ab <<x");

    assert!(tree.root_node().has_error());
    assert_eq!(tree.root_node().byte_range(), 0..6);
}

#[test]
fn external_tokens_without_scanner_are_never_lexed() {
    let language = language(
        &Grammar::new("raw")
            .rule(
                "document",
                Rule::repeat(Rule::choice([Rule::sym("word"), Rule::sym("raw")])),
            )
            .rule("word", Rule::pattern("[a-z]+"))
            .external(Rule::sym("raw")),
    );

    let tree = parse(&language, "ab <<x>>");

    assert!(tree.root_node().has_error());
    assert_eq!(tree.root_node().named_child(0).unwrap().kind(), "word");
}
