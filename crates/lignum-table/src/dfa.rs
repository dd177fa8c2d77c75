//! DFA deserialization for pattern lexemes.

use regex_automata::dfa::sparse::DFA;

/// Deserialize a sparse DFA from a grammar table.
///
/// The bytes must have been produced by `DFA::to_bytes_little_endian()`.
/// Deserialization validates the DFA, so corrupt bytes yield an error
/// rather than undefined behavior.
pub fn deserialize_dfa(bytes: &[u8]) -> Result<DFA<&[u8]>, String> {
    DFA::from_bytes(bytes)
        .map(|(dfa, _)| dfa)
        .map_err(|e| e.to_string())
}
