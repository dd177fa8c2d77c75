#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Parse table generator for lignum.
//!
//! Turns a [`Grammar`] into the binary grammar table the runtime loads:
//! - Lowering: rules become terminals or flat productions
//! - LALR(1) automaton with precedence and associativity resolution
//! - Unresolved conflicts stay in the table as GLR forks
//! - Token patterns compile to anchored sparse DFAs

mod assemble;
mod dfa;
mod error;
mod lalr;
mod lower;
mod resolve;
mod token_set;

#[cfg(test)]
mod generate_tests;

use lignum_core::Grammar;

pub use error::GenerateError;
pub use resolve::Conflict;

/// Generator configuration.
#[derive(Clone, Debug)]
pub struct GenerateOptions {
    /// Maximum number of flat alternatives one rule may expand to (default: 4,096).
    pub(crate) max_alternatives: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_alternatives: 4096,
        }
    }
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_alternatives(mut self, limit: usize) -> Self {
        self.max_alternatives = limit;
        self
    }

    pub fn get_max_alternatives(&self) -> usize {
        self.max_alternatives
    }
}

/// Output of a generator run.
#[derive(Debug)]
pub struct Generated {
    /// Serialized grammar table.
    pub bytes: Vec<u8>,
    /// Conflicts kept as GLR forks.
    pub conflicts: Vec<Conflict>,
    pub state_count: usize,
}

/// Generate a grammar table with default options.
pub fn generate(grammar: &Grammar) -> Result<Vec<u8>, GenerateError> {
    generate_with(grammar, &GenerateOptions::default()).map(|generated| generated.bytes)
}

pub fn generate_with(grammar: &Grammar, options: &GenerateOptions) -> Result<Generated, GenerateError> {
    let _span = tracing::debug_span!("generate", grammar = %grammar.name).entered();
    let lowered = lower::lower(grammar, options)?;
    assemble::assemble(lowered)
}
