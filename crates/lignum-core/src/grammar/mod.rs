//! Grammar description types.
//!
//! Represents tree-sitter style `grammar.json` files, with JSON
//! deserialization, compact binary serialization, and a builder DSL.

mod binary;
mod builder;
mod json;
mod types;

#[cfg(test)]
mod json_tests;

pub use json::GrammarError;
pub use types::{Grammar, Precedence, PrecedenceEntry, Rule};
