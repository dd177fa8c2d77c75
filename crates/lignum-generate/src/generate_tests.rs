use indoc::indoc;
use lignum_core::{Grammar, PrecedenceEntry, Rule};
use lignum_table::{Action, GrammarTable, Matcher, SymbolKind};

use crate::{GenerateError, GenerateOptions, generate, generate_with};

fn parens() -> Grammar {
    Grammar::new("parens")
        .rule(
            "expr",
            Rule::seq([Rule::string("("), Rule::sym("number"), Rule::string(")")]),
        )
        .rule("number", Rule::pattern(r"\d+"))
}

fn arithmetic(with_precedence: bool) -> Grammar {
    let binary = |op: &str, prec: i32| {
        let body = Rule::seq([
            Rule::field("left", Rule::sym("expr")),
            Rule::string(op),
            Rule::field("right", Rule::sym("expr")),
        ]);
        if with_precedence {
            Rule::prec_left(prec, body)
        } else {
            body
        }
    };
    Grammar::new("arith")
        .rule(
            "expr",
            Rule::choice([binary("+", 1), binary("*", 2), Rule::sym("number")]),
        )
        .rule("number", Rule::pattern(r"\d+"))
}

fn load(grammar: &Grammar) -> GrammarTable {
    GrammarTable::from_bytes(generate(grammar).unwrap()).unwrap()
}

#[test]
fn parens_table_layout() {
    let table = load(&parens());

    insta::assert_snapshot!(table.dump(), @r#"
    grammar parens (abi 1)

    [symbols]
      0 end end hidden
      1 ERROR error
      2 number terminal
      3 "(" terminal
      4 ")" terminal
      5 expr nonterminal
      6 _start auxiliary hidden

    [lexemes]
    number = /(?:\d+)/
    "(" = "("
    ")" = ")"

    [extras]
    skip /(?:\s)/

    [productions]
      0 _start -> expr
      1 expr -> "(" number ")"

    [lex modes]
      0 "("
      1 number
      2 -
      3 ")"

    [states]
      0 mode=0 start
          "(" shift 1
          expr goto 2
      1 mode=1
          number shift 3
      2 mode=2
          end accept
      3 mode=3
          ")" shift 4
      4 mode=2
          end reduce 1
    "#);
}

#[test]
fn generation_is_deterministic() {
    assert_eq!(generate(&parens()).unwrap(), generate(&parens()).unwrap());
}

#[test]
fn precedence_resolves_binary_operators() {
    let generated = generate_with(&arithmetic(true), &GenerateOptions::new()).unwrap();
    assert!(generated.conflicts.is_empty(), "{:?}", generated.conflicts);

    let table = GrammarTable::from_bytes(generated.bytes).unwrap();
    assert_eq!(table.field_id_for_name("left"), Some(0));
    assert_eq!(table.field_id_for_name("right"), Some(1));
    assert!(
        table
            .data()
            .states
            .iter()
            .flat_map(|s| &s.actions)
            .all(|entry| entry.actions.len() == 1)
    );
}

#[test]
fn unresolved_conflicts_become_forks() {
    let generated = generate_with(&arithmetic(false), &GenerateOptions::new()).unwrap();
    assert!(!generated.conflicts.is_empty());

    for conflict in &generated.conflicts {
        assert_eq!(conflict.rules, vec!["expr".to_string()]);
        assert!(!conflict.expected);
        assert!(conflict.actions.len() > 1);
        assert!(matches!(conflict.actions[0], Action::Shift(_)));
    }
}

#[test]
fn declared_conflicts_are_expected() {
    let grammar = arithmetic(false).conflict(["expr"]);
    let generated = generate_with(&grammar, &GenerateOptions::new()).unwrap();
    assert!(!generated.conflicts.is_empty());
    assert!(generated.conflicts.iter().all(|c| c.expected));
}

#[test]
fn named_precedences_resolve_through_levels() {
    let grammar = Grammar::new("named")
        .rule(
            "expr",
            Rule::choice([
                Rule::prec_left("sum", Rule::seq([Rule::sym("expr"), Rule::string("+"), Rule::sym("expr")])),
                Rule::prec_left(
                    "product",
                    Rule::seq([Rule::sym("expr"), Rule::string("*"), Rule::sym("expr")]),
                ),
                Rule::sym("number"),
            ]),
        )
        .rule("number", Rule::pattern(r"\d+"))
        .precedence_levels([
            PrecedenceEntry::Name("product".into()),
            PrecedenceEntry::Name("sum".into()),
        ]);
    let generated = generate_with(&grammar, &GenerateOptions::new()).unwrap();
    assert!(generated.conflicts.is_empty(), "{:?}", generated.conflicts);
}

#[test]
fn keywords_are_marked_against_word_token() {
    let grammar = Grammar::new("kw")
        .rule(
            "stmt",
            Rule::choice([
                Rule::seq([Rule::string("if"), Rule::sym("identifier")]),
                Rule::seq([Rule::string("+"), Rule::sym("identifier")]),
            ]),
        )
        .rule("identifier", Rule::pattern("[a-z]+"))
        .word("identifier");
    let table = load(&grammar);
    let lexeme = |text: &str| {
        table
            .data()
            .lexemes
            .iter()
            .find(|l| l.matcher == Matcher::Literal(text.into()))
            .unwrap()
            .clone()
    };

    assert!(lexeme("if").keyword);
    assert!(!lexeme("+").keyword);
    assert_eq!(table.data().word, table.symbol_for_name("identifier", true));
}

#[test]
fn repetitions_use_hidden_auxiliary_rules() {
    let grammar = Grammar::new("list")
        .rule("list", Rule::repeat1(Rule::sym("item")))
        .rule("item", Rule::pattern("[a-z]"));
    let table = load(&grammar);

    let aux = table
        .data()
        .symbols
        .iter()
        .find(|s| s.name == "list_repeat1")
        .unwrap();
    assert_eq!(aux.kind, SymbolKind::Auxiliary);
    assert!(!aux.visible);
    assert_eq!(table.symbol_for_name("list_repeat1", true), None);
}

#[test]
fn kept_extras_shift_in_every_state() {
    let grammar = Grammar::new("doc")
        .rule("doc", Rule::repeat(Rule::sym("word")))
        .rule("word", Rule::pattern("[a-z]+"))
        .rule("comment", Rule::pattern("#[^\n]*"))
        .extras([Rule::pattern(r"\s"), Rule::sym("comment")]);
    let table = load(&grammar);
    let comment = table.symbol_for_name("comment", true).unwrap();

    assert_eq!(table.data().extras, vec![comment]);
    assert!(table.is_extra(comment));
    for state in &table.data().states {
        assert_eq!(state.actions(comment), &[Action::ShiftExtra]);
    }
}

#[test]
fn aliases_create_or_reuse_symbols() {
    let grammar = Grammar::new("alias")
        .rule(
            "pair",
            Rule::seq([
                Rule::alias(Rule::sym("word"), "key", true),
                Rule::string(":"),
                Rule::alias(Rule::sym("_value"), "word", true),
            ]),
        )
        .rule("word", Rule::pattern("[a-z]+"))
        .rule("_value", Rule::pattern("[0-9]+"));
    let table = load(&grammar);

    let key = table.symbol_for_name("key", true).unwrap();
    assert_eq!(table.symbol(key).kind, SymbolKind::Alias);

    let word = table.symbol_for_name("word", true).unwrap();
    let production = &table.data().productions[1];
    assert_eq!(production.steps[0].alias, Some(key));
    assert_eq!(production.steps[2].alias, Some(word));
}

#[test]
fn externals_precede_nonterminals() {
    let grammar = Grammar::new("ext")
        .rule("block", Rule::seq([Rule::sym("indent"), Rule::sym("word")]))
        .rule("word", Rule::pattern("[a-z]+"))
        .external(Rule::sym("indent"));
    let table = load(&grammar);
    let indent = table.symbol_for_name("indent", true).unwrap();

    assert_eq!(table.symbol(indent).kind, SymbolKind::External);
    assert_eq!(table.external_index(indent), Some(0));
    assert!(table.lexeme(indent).is_none());
}

#[test]
fn from_json_grammar() {
    let grammar = Grammar::from_json(indoc! {r#"
        {
          "name": "pairs",
          "rules": {
            "pairs": { "type": "REPEAT", "content": { "type": "SYMBOL", "name": "pair" } },
            "pair": {
              "type": "SEQ",
              "members": [
                { "type": "FIELD", "name": "key", "content": { "type": "SYMBOL", "name": "ident" } },
                { "type": "STRING", "value": "=" },
                { "type": "FIELD", "name": "value", "content": { "type": "SYMBOL", "name": "ident" } }
              ]
            },
            "ident": { "type": "PATTERN", "value": "[a-z]+" }
          }
        }
    "#})
    .unwrap();

    let table = load(&grammar);
    assert_eq!(table.name(), "pairs");
    assert!(table.symbol_for_name("pair", true).is_some());
    assert!(table.symbol_for_name("=", false).is_some());
    assert_eq!(table.data().fields, vec!["key".to_string(), "value".to_string()]);
}

#[test]
fn error_undefined_symbol() {
    let grammar = Grammar::new("bad").rule("s", Rule::seq([Rule::string("a"), Rule::sym("missing")]));
    let err = generate(&grammar).unwrap_err();
    insta::assert_snapshot!(err, @"undefined symbol `missing` referenced from `s`");
}

#[test]
fn error_empty_grammar() {
    let err = generate(&Grammar::new("empty")).unwrap_err();
    assert!(matches!(err, GenerateError::EmptyGrammar));
}

#[test]
fn error_empty_token() {
    let grammar = Grammar::new("bad")
        .rule("s", Rule::seq([Rule::string("a"), Rule::sym("x")]))
        .rule("x", Rule::pattern("a*"));
    let err = generate(&grammar).unwrap_err();
    insta::assert_snapshot!(err, @"token `x` matches the empty string");
}

#[test]
fn error_invalid_pattern() {
    let grammar = Grammar::new("bad").rule("s", Rule::pattern("(unclosed"));
    let err = generate(&grammar).unwrap_err();
    assert!(matches!(err, GenerateError::InvalidPattern { .. }));
}

#[test]
fn error_unknown_precedence() {
    let grammar = Grammar::new("bad").rule("s", Rule::seq([Rule::prec("high", Rule::string("a"))]));
    let err = generate(&grammar).unwrap_err();
    insta::assert_snapshot!(err, @"unknown precedence `high`");
}

#[test]
fn error_multi_symbol_alias() {
    let grammar = Grammar::new("bad").rule(
        "s",
        Rule::alias(Rule::seq([Rule::string("a"), Rule::string("b")]), "pair", true),
    );
    let err = generate(&grammar).unwrap_err();
    insta::assert_snapshot!(err, @"alias `pair` must wrap a single symbol");
}

#[test]
fn error_nonterminal_extra() {
    let grammar = Grammar::new("bad")
        .rule("s", Rule::seq([Rule::string("a"), Rule::sym("t")]))
        .rule("t", Rule::seq([Rule::string("b"), Rule::string("c")]))
        .extras([Rule::sym("t")]);
    let err = generate(&grammar).unwrap_err();
    assert!(matches!(err, GenerateError::UnsupportedExtra(name) if name == "t"));
}

#[test]
fn error_too_many_alternatives() {
    let grammar = Grammar::new("wide").rule(
        "s",
        Rule::seq([
            Rule::string("x"),
            Rule::optional(Rule::string("a")),
            Rule::optional(Rule::string("b")),
        ]),
    );
    let err = generate_with(&grammar, &GenerateOptions::new().max_alternatives(3)).unwrap_err();
    insta::assert_snapshot!(err, @"rule `s` expands to more than 3 alternatives");
    assert!(generate(&grammar).is_ok());
}
