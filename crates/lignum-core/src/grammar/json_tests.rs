use indoc::indoc;

use super::*;

#[test]
fn parse_minimal_grammar() {
    let json = indoc! {r#"
        {
          "name": "parens",
          "rules": {
            "expr": { "type": "SYMBOL", "name": "number" },
            "number": { "type": "PATTERN", "value": "\\d+" }
          }
        }
    "#};

    let grammar = Grammar::from_json(json).unwrap();
    assert_eq!(grammar.name, "parens");
    assert_eq!(grammar.rules.len(), 2);
    assert_eq!(grammar.start_rule(), Some("expr"));
}

#[test]
fn parse_seq_and_choice() {
    let json = indoc! {r#"
        {
          "name": "test",
          "rules": {
            "root": {
              "type": "SEQ",
              "members": [
                { "type": "STRING", "value": "a" },
                { "type": "CHOICE", "members": [
                  { "type": "STRING", "value": "b" },
                  { "type": "BLANK" }
                ]}
              ]
            }
          }
        }
    "#};

    let grammar = Grammar::from_json(json).unwrap();
    assert_eq!(
        grammar.rules[0].1,
        Rule::seq([Rule::string("a"), Rule::optional(Rule::string("b"))])
    );
}

#[test]
fn parse_field_alias_and_precedence() {
    let json = indoc! {r#"
        {
          "name": "test",
          "rules": {
            "call": {
              "type": "PREC_LEFT",
              "value": "call",
              "content": {
                "type": "SEQ",
                "members": [
                  { "type": "FIELD", "name": "function", "content": { "type": "SYMBOL", "name": "id" } },
                  { "type": "ALIAS", "value": "args", "named": true, "content": { "type": "SYMBOL", "name": "list" } }
                ]
              }
            }
          }
        }
    "#};

    let grammar = Grammar::from_json(json).unwrap();
    let expected = Rule::prec_left(
        "call",
        Rule::seq([
            Rule::field("function", Rule::sym("id")),
            Rule::alias(Rule::sym("list"), "args", true),
        ]),
    );
    assert_eq!(grammar.rules[0].1, expected);
}

#[test]
fn preserves_rule_order() {
    let json = indoc! {r#"
        {
          "name": "test",
          "rules": {
            "program": { "type": "SYMBOL", "name": "statement" },
            "statement": { "type": "SYMBOL", "name": "expression" },
            "expression": { "type": "STRING", "value": "x" }
          }
        }
    "#};

    let grammar = Grammar::from_json(json).unwrap();

    // Start rule stays first, not alphabetically sorted.
    assert_eq!(grammar.rules[0].0, "program");
    assert_eq!(grammar.rules[1].0, "statement");
    assert_eq!(grammar.rules[2].0, "expression");
}

#[test]
fn missing_extras_defaults_to_whitespace() {
    let json = r#"{ "name": "t", "rules": { "a": { "type": "STRING", "value": "a" } } }"#;

    let grammar = Grammar::from_json(json).unwrap();
    assert_eq!(grammar.extras, vec![Rule::pattern(r"\s")]);
}

#[test]
fn explicit_empty_extras_are_kept_empty() {
    let json = r#"{ "name": "t", "extras": [], "rules": { "a": { "type": "STRING", "value": "a" } } }"#;

    let grammar = Grammar::from_json(json).unwrap();
    assert!(grammar.extras.is_empty());
}

#[test]
fn parse_top_level_lists() {
    let json = indoc! {r#"
        {
          "name": "baml",
          "word": "identifier",
          "rules": {
            "source_file": { "type": "REPEAT", "content": { "type": "SYMBOL", "name": "identifier" } },
            "identifier": { "type": "PATTERN", "value": "[a-z]+" }
          },
          "extras": [
            { "type": "PATTERN", "value": "\\s" },
            { "type": "SYMBOL", "name": "comment" }
          ],
          "conflicts": [["type_expr", "union_type"]],
          "externals": [{ "type": "SYMBOL", "name": "raw_string" }],
          "precedences": [[{ "type": "STRING", "value": "call" }, { "type": "SYMBOL", "name": "binary" }]],
          "inline": ["_value"],
          "supertypes": ["_expression"]
        }
    "#};

    let grammar = Grammar::from_json(json).unwrap();
    assert_eq!(grammar.word.as_deref(), Some("identifier"));
    assert_eq!(grammar.extras.len(), 2);
    assert_eq!(grammar.conflicts, vec![vec!["type_expr", "union_type"]]);
    assert_eq!(grammar.externals, vec![Rule::sym("raw_string")]);
    assert_eq!(
        grammar.precedences,
        vec![vec![
            PrecedenceEntry::Name("call".into()),
            PrecedenceEntry::Symbol("binary".into())
        ]]
    );
    assert_eq!(grammar.inline, vec!["_value"]);
    assert_eq!(grammar.supertypes, vec!["_expression"]);
}

#[test]
fn invalid_json_is_an_error() {
    let err = Grammar::from_json("{ not json").unwrap_err();
    assert!(matches!(err, GrammarError::Json(_)));
    assert!(err.to_string().starts_with("JSON parse error"));
}

#[test]
fn unknown_rule_type_is_an_error() {
    let json = r#"{ "name": "t", "rules": { "a": { "type": "LOOKAHEAD" } } }"#;
    assert!(Grammar::from_json(json).is_err());
}
