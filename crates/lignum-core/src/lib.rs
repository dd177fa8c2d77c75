#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Grammar description model for lignum.
//!
//! A [`Grammar`] is the offline input of the table generator. It mirrors
//! tree-sitter's `grammar.json` and can also be assembled in Rust through
//! the builder helpers on [`Rule`] and [`Grammar`].

pub mod grammar;
mod interner;


pub use grammar::{Grammar, GrammarError, Precedence, PrecedenceEntry, Rule};
pub use interner::{Interner, Name};
