//! DFA table builder.
//!
//! Compiles token patterns to anchored sparse DFAs and keeps them deduplicated
//! by pattern text. Index order is the order patterns were first interned.

use std::collections::HashMap;

use regex_automata::dfa::{Automaton, StartKind, dense};
use regex_automata::util::primitives::StateID;
use regex_automata::{Anchored, Input, MatchKind};

use crate::GenerateError;

type DenseDfa = dense::DFA<Vec<u32>>;

#[derive(Debug, Default)]
pub(crate) struct DfaTableBuilder {
    lookup: HashMap<String, u16>,
    entries: Vec<Vec<u8>>,
}

impl DfaTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a pattern, compiling it to a DFA on first sight.
    pub fn intern(&mut self, pattern: &str) -> Result<u16, GenerateError> {
        if let Some(&id) = self.lookup.get(pattern) {
            return Ok(id);
        }

        let dense = compile(pattern)?;
        let sparse = dense.to_sparse().map_err(|e| GenerateError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let id = u16::try_from(self.entries.len())
            .map_err(|_| GenerateError::TooManySymbols(self.entries.len()))?;
        self.entries.push(sparse.to_bytes_little_endian());
        self.lookup.insert(pattern.to_string(), id);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn into_blobs(self) -> Vec<Vec<u8>> {
        self.entries
    }
}

/// Compile a pattern the way the lexer runs it: anchored, reporting every match.
pub(crate) fn compile(pattern: &str) -> Result<DenseDfa, GenerateError> {
    dense::DFA::builder()
        .configure(
            dense::DFA::config()
                .start_kind(StartKind::Anchored)
                .match_kind(MatchKind::All)
                .minimize(true),
        )
        .build(pattern)
        .map_err(|e| GenerateError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

fn start(dfa: &DenseDfa) -> Option<StateID> {
    dfa.start_state_forward(&Input::new("").anchored(Anchored::Yes))
        .ok()
}

/// Whether the pattern accepts the empty string.
pub(crate) fn matches_empty(dfa: &DenseDfa) -> bool {
    let Some(state) = start(dfa) else {
        return false;
    };
    dfa.is_match_state(dfa.next_eoi_state(state))
}

/// Whether the pattern accepts exactly `text`.
pub(crate) fn matches_fully(dfa: &DenseDfa, text: &[u8]) -> bool {
    let Some(mut state) = start(dfa) else {
        return false;
    };
    for &byte in text {
        state = dfa.next_state(state, byte);
        if dfa.is_dead_state(state) {
            return false;
        }
    }
    dfa.is_match_state(dfa.next_eoi_state(state))
}
