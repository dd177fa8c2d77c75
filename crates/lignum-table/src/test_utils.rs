//! Hand-built tables for tests.

use regex_automata::MatchKind;
use regex_automata::dfa::{StartKind, dense};

use crate::data::*;

/// Compile a pattern the same way the generator does.
pub fn build_dfa(pattern: &str) -> Vec<u8> {
    let dense = dense::Builder::new()
        .configure(
            dense::DFA::config()
                .start_kind(StartKind::Anchored)
                .match_kind(MatchKind::All),
        )
        .build(pattern)
        .unwrap();
    dense.to_sparse().unwrap().to_bytes_little_endian()
}

fn symbol(name: &str, kind: SymbolKind, named: bool, visible: bool) -> SymbolInfo {
    SymbolInfo {
        name: name.to_owned(),
        kind,
        named,
        visible,
    }
}

fn step(symbol: SymbolId) -> Step {
    Step {
        symbol,
        field: None,
        alias: None,
    }
}

fn entry(symbol: SymbolId, action: Action) -> ActionEntry {
    ActionEntry {
        symbol,
        actions: vec![action],
    }
}

/// `expr: "(" number ")"`, `number: /\d+/`, whitespace separators.
pub fn parens_table() -> (TableData, Vec<Vec<u8>>) {
    let data = TableData {
        name: "parens".into(),
        symbols: vec![
            symbol("end", SymbolKind::End, true, false),
            symbol("ERROR", SymbolKind::Error, true, true),
            symbol("(", SymbolKind::Terminal, false, true),
            symbol(")", SymbolKind::Terminal, false, true),
            symbol("number", SymbolKind::Terminal, true, true),
            symbol("expr", SymbolKind::NonTerminal, true, true),
            symbol("_start", SymbolKind::Auxiliary, true, false),
        ],
        fields: vec![],
        lexemes: vec![
            Lexeme {
                symbol: 2,
                matcher: Matcher::Literal("(".into()),
                precedence: 0,
                immediate: false,
                keyword: false,
            },
            Lexeme {
                symbol: 3,
                matcher: Matcher::Literal(")".into()),
                precedence: 0,
                immediate: false,
                keyword: false,
            },
            Lexeme {
                symbol: 4,
                matcher: Matcher::Pattern {
                    dfa: 0,
                    source: r"\d+".into(),
                },
                precedence: 0,
                immediate: false,
                keyword: false,
            },
        ],
        separators: vec![Matcher::Pattern {
            dfa: 1,
            source: r"\s".into(),
        }],
        extras: vec![],
        word: None,
        externals: vec![],
        productions: vec![
            Production {
                lhs: 6,
                dynamic_precedence: 0,
                steps: vec![step(5)],
            },
            Production {
                lhs: 5,
                dynamic_precedence: 0,
                steps: vec![step(2), step(4), step(3)],
            },
        ],
        lex_modes: vec![
            LexMode { terminals: vec![2] },
            LexMode { terminals: vec![] },
            LexMode { terminals: vec![4] },
            LexMode { terminals: vec![3] },
        ],
        states: vec![
            ParseState {
                lex_mode: 0,
                actions: vec![entry(2, Action::Shift(2))],
                gotos: vec![(5, 1)],
            },
            ParseState {
                lex_mode: 1,
                actions: vec![entry(END, Action::Accept)],
                gotos: vec![],
            },
            ParseState {
                lex_mode: 2,
                actions: vec![entry(4, Action::Shift(3))],
                gotos: vec![],
            },
            ParseState {
                lex_mode: 3,
                actions: vec![entry(3, Action::Shift(4))],
                gotos: vec![],
            },
            ParseState {
                lex_mode: 1,
                actions: vec![entry(END, Action::Reduce(1))],
                gotos: vec![],
            },
        ],
        start_state: 0,
    };

    let dfas = vec![build_dfa(r"\d+"), build_dfa(r"\s")];
    (data, dfas)
}
