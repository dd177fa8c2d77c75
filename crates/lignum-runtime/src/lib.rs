#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Parsing runtime for lignum.
//!
//! Executes grammar tables produced by `lignum-generate`:
//! - [`Language`]: a loaded table with its lexer automata and external scanner
//! - [`Parser`]: GLR parsing with error recovery and incremental reparse
//! - [`Tree`], [`Node`], [`TreeCursor`]: immutable trees sharing subtrees
//!   across versions

#![allow(clippy::comparison_chain)]

mod language;
mod lex;
mod parse;
mod scanner;
mod tree;

#[cfg(test)]
mod language_tests;
#[cfg(test)]
mod test_utils;

pub use language::Language;
pub use lignum_table::{GrammarLoadError, SymbolId};
pub use parse::{
    CancelReason, EditError, NoopTracer, ParseError, ParseOptions, Parser, PrintTracer, Recovery,
    Tracer, Verbosity,
};
pub use scanner::{ExternalScanner, ExternalToken, ScanContext, ScannerState, ValidExternals};
pub use tree::{InputEdit, Node, Point, Tree, TreeCursor, TreeEdit};
