//! Grammar table format for lignum.
//!
//! A grammar table is the immutable, precomputed artifact the runtime parses
//! with. This crate contains:
//! - The binary file layout (64-byte header, aligned sections, checksum)
//! - The decoded table model (symbols, lexemes, productions, parse states)
//! - Loading with full validation, and emission for the generator
//! - A human-readable dump for debugging

#![allow(clippy::comparison_chain)]

mod constants;
mod data;
mod dfa;
mod dump;
mod error;
mod header;
mod table;
mod writer;

#[cfg(test)]
mod header_tests;
#[cfg(test)]
mod table_tests;
#[cfg(test)]
mod test_utils;

pub use constants::{MAGIC, SECTION_ALIGN, VERSION};
pub use data::{
    Action, ActionEntry, END, ERROR, FieldId, LexMode, LexModeId, Lexeme, Matcher, ParseState,
    Production, ProductionId, StateId, Step, SymbolId, SymbolInfo, SymbolKind, TableData,
};
pub use dfa::deserialize_dfa;
pub use error::{EmitError, GrammarLoadError};
pub use header::{Header, SectionOffsets};
pub use table::GrammarTable;
pub use writer::emit;
