//! Grammar fixtures shared by the runtime tests.

use lignum_core::{Grammar, Rule};

use crate::{Language, Parser, Tree};

pub fn language(grammar: &Grammar) -> Language {
    let bytes = lignum_generate::generate(grammar).expect("fixture grammar generates");
    Language::load(&bytes).expect("fixture table loads")
}

pub fn parse(language: &Language, text: &str) -> Tree {
    Parser::new(language).parse(text).expect("parse is not cancelled")
}

/// `expr: "(" number ")"`.
pub fn parens() -> Language {
    language(
        &Grammar::new("parens")
            .rule(
                "expr",
                Rule::seq([Rule::string("("), Rule::sym("number"), Rule::string(")")]),
            )
            .rule("number", Rule::pattern(r"\d+")),
    )
}

/// Binary operators with fields; `precedence` resolves the conflicts
/// statically, otherwise they stay GLR forks.
pub fn arithmetic(precedence: bool) -> Language {
    let binary = |op: &str, prec: i32| {
        let body = Rule::seq([
            Rule::field("left", Rule::sym("expr")),
            Rule::string(op),
            Rule::field("right", Rule::sym("expr")),
        ]);
        if precedence {
            Rule::prec_left(prec, body)
        } else {
            body
        }
    };
    language(
        &Grammar::new("arith")
            .rule(
                "expr",
                Rule::choice([binary("+", 1), binary("*", 2), Rule::sym("number")]),
            )
            .rule("number", Rule::pattern(r"\d+"))
            .conflict(["expr"]),
    )
}

/// Small statement language with keywords, comments and nesting.
pub fn statements() -> Language {
    language(
        &Grammar::new("statements")
            .rule("program", Rule::repeat(Rule::sym("_statement")))
            .rule(
                "_statement",
                Rule::choice([Rule::sym("let_statement"), Rule::sym("expression_statement")]),
            )
            .rule(
                "let_statement",
                Rule::seq([
                    Rule::string("let"),
                    Rule::field("name", Rule::sym("identifier")),
                    Rule::string("="),
                    Rule::field("value", Rule::sym("_expression")),
                    Rule::string(";"),
                ]),
            )
            .rule(
                "expression_statement",
                Rule::seq([Rule::sym("_expression"), Rule::string(";")]),
            )
            .rule(
                "_expression",
                Rule::choice([
                    Rule::sym("identifier"),
                    Rule::sym("number"),
                    Rule::sym("parenthesized"),
                    Rule::sym("sum"),
                ]),
            )
            .rule(
                "parenthesized",
                Rule::seq([Rule::string("("), Rule::sym("_expression"), Rule::string(")")]),
            )
            .rule(
                "sum",
                Rule::prec_left(
                    1,
                    Rule::seq([
                        Rule::field("left", Rule::sym("_expression")),
                        Rule::string("+"),
                        Rule::field("right", Rule::sym("_expression")),
                    ]),
                ),
            )
            .rule("identifier", Rule::pattern("[a-z_]+"))
            .rule("number", Rule::pattern(r"\d+"))
            .rule("comment", Rule::pattern("#[^\n]*"))
            .extras([Rule::pattern(r"\s"), Rule::sym("comment")])
            .word("identifier"),
    )
}
