//! Loaded grammar table.
//!
//! [`GrammarTable`] owns the raw bytes, the validated header, and the decoded
//! [`TableData`]. Loading validates everything up front so the runtime can
//! index into the table without further checks.

use std::ops::{Deref, Range};
use std::path::Path;

use super::data::{
    Action, END, ERROR, FieldId, Lexeme, Matcher, ParseState, StateId, SymbolId, SymbolInfo,
    SymbolKind, TableData,
};
use super::dfa::deserialize_dfa;
use super::error::GrammarLoadError;
use super::header::Header;

/// Storage for grammar table bytes.
#[derive(Debug, Clone)]
struct ByteStorage(Vec<u8>);

impl Deref for ByteStorage {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A validated, immutable grammar table.
#[derive(Debug, Clone)]
pub struct GrammarTable {
    storage: ByteStorage,
    header: Header,
    data: TableData,
    /// Absolute byte range of each DFA inside `storage`.
    dfa_ranges: Vec<Range<usize>>,
}

impl GrammarTable {
    /// Load and validate a table from owned bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, GrammarLoadError> {
        let header = Header::from_bytes(&bytes).ok_or(GrammarLoadError::FileTooSmall(bytes.len()))?;

        if !header.validate_magic() {
            return Err(GrammarLoadError::InvalidMagic);
        }
        if !header.validate_version() {
            return Err(GrammarLoadError::VersionMismatch {
                found: header.version,
            });
        }
        if header.total_size as usize != bytes.len() {
            return Err(GrammarLoadError::SizeMismatch {
                header: header.total_size,
                actual: bytes.len(),
            });
        }

        let checksum = crc32fast::hash(&bytes[64..]);
        if checksum != header.checksum {
            return Err(GrammarLoadError::ChecksumMismatch {
                expected: header.checksum,
                actual: checksum,
            });
        }

        let offsets = header.compute_offsets();
        if offsets.end as usize > bytes.len() {
            return Err(GrammarLoadError::SectionOutOfBounds("dfa_blob"));
        }

        let tables_start = offsets.tables as usize;
        let tables = &bytes[tables_start..tables_start + header.tables_size as usize];
        let data: TableData = postcard::from_bytes(tables)?;

        let dfa_ranges = read_dfa_ranges(&bytes, &header)?;
        for (index, range) in dfa_ranges.iter().enumerate() {
            deserialize_dfa(&bytes[range.clone()])
                .map_err(|reason| GrammarLoadError::InvalidDfa { index, reason })?;
        }

        check_counts(&header, &data)?;
        check_references(&data, dfa_ranges.len())?;

        Ok(Self {
            storage: ByteStorage(bytes),
            header,
            data,
            dfa_ranges,
        })
    }

    /// Load and validate a table from a byte slice.
    pub fn load(bytes: &[u8]) -> Result<Self, GrammarLoadError> {
        Self::from_bytes(bytes.to_vec())
    }

    /// Read a table file into memory and validate it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GrammarLoadError> {
        Self::from_bytes(std::fs::read(path)?)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn data(&self) -> &TableData {
        &self.data
    }

    pub fn bytes(&self) -> &[u8] {
        &self.storage
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn dfa_count(&self) -> usize {
        self.dfa_ranges.len()
    }

    /// Serialized bytes of DFA `index`.
    pub fn dfa_bytes(&self, index: usize) -> &[u8] {
        &self.storage[self.dfa_ranges[index].clone()]
    }

    pub fn symbol_count(&self) -> usize {
        self.data.symbols.len()
    }

    pub fn symbol(&self, id: SymbolId) -> &SymbolInfo {
        &self.data.symbols[id as usize]
    }

    pub fn symbol_name(&self, id: SymbolId) -> Option<&str> {
        self.data.symbols.get(id as usize).map(|s| s.name.as_str())
    }

    /// Find the first visible symbol with the given name and namedness.
    pub fn symbol_for_name(&self, name: &str, named: bool) -> Option<SymbolId> {
        self.data
            .symbols
            .iter()
            .position(|s| s.visible && s.named == named && s.name == name)
            .map(|i| i as SymbolId)
    }

    pub fn field_name(&self, id: FieldId) -> Option<&str> {
        self.data.fields.get(id as usize).map(String::as_str)
    }

    pub fn field_id_for_name(&self, name: &str) -> Option<FieldId> {
        self.data
            .fields
            .iter()
            .position(|f| f == name)
            .map(|i| i as FieldId)
    }

    pub fn state_count(&self) -> usize {
        self.data.states.len()
    }

    pub fn start_state(&self) -> StateId {
        self.data.start_state
    }

    pub fn state(&self, state: StateId) -> &ParseState {
        &self.data.states[state as usize]
    }

    /// Actions for `symbol` in `state`; empty when the symbol is unexpected.
    pub fn actions(&self, state: StateId, symbol: SymbolId) -> &[Action] {
        self.state(state).actions(symbol)
    }

    pub fn goto(&self, state: StateId, symbol: SymbolId) -> Option<StateId> {
        self.state(state).goto(symbol)
    }

    pub fn lexeme(&self, symbol: SymbolId) -> Option<&Lexeme> {
        self.data.lexemes.iter().find(|l| l.symbol == symbol)
    }

    pub fn is_extra(&self, symbol: SymbolId) -> bool {
        self.data.extras.contains(&symbol)
    }

    pub fn external_index(&self, symbol: SymbolId) -> Option<usize> {
        self.data.externals.iter().position(|&s| s == symbol)
    }
}

fn read_dfa_ranges(bytes: &[u8], header: &Header) -> Result<Vec<Range<usize>>, GrammarLoadError> {
    let offsets = header.compute_offsets();
    let table = offsets.dfa_table as usize;
    let blob = offsets.dfa_blob as usize;
    let blob_size = header.dfa_blob_size as usize;

    let entry = |i: usize| {
        let at = table + i * 4;
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize
    };

    let count = header.dfa_count as usize;
    let mut ranges = Vec::with_capacity(count);
    for i in 0..count {
        let (start, end) = (entry(i), entry(i + 1));
        if start > end || end > blob_size {
            return Err(GrammarLoadError::SectionOutOfBounds("dfa_table"));
        }
        ranges.push(blob + start..blob + end);
    }
    if entry(count) != blob_size {
        return Err(GrammarLoadError::SectionOutOfBounds("dfa_table"));
    }
    Ok(ranges)
}

fn check_counts(header: &Header, data: &TableData) -> Result<(), GrammarLoadError> {
    let pairs = [
        ("symbols", header.symbol_count as usize, data.symbols.len()),
        ("fields", header.field_count as usize, data.fields.len()),
        ("lexemes", header.lexeme_count as usize, data.lexemes.len()),
        ("externals", header.external_count as usize, data.externals.len()),
        ("states", header.state_count as usize, data.states.len()),
        ("productions", header.production_count as usize, data.productions.len()),
        ("lex modes", header.lex_mode_count as usize, data.lex_modes.len()),
    ];
    for (what, expected, actual) in pairs {
        if expected != actual {
            return Err(GrammarLoadError::Inconsistent(format!(
                "header declares {expected} {what}, tables hold {actual}"
            )));
        }
    }
    Ok(())
}

/// Every index stored in the tables must point at something that exists.
fn check_references(data: &TableData, dfa_count: usize) -> Result<(), GrammarLoadError> {
    let inconsistent = |msg: String| Err(GrammarLoadError::Inconsistent(msg));

    let symbols = data.symbols.len();
    let symbol_ok = |s: u16| (s as usize) < symbols;

    if symbols < 2
        || data.symbols[END as usize].kind != SymbolKind::End
        || data.symbols[ERROR as usize].kind != SymbolKind::Error
    {
        return inconsistent("missing reserved END/ERROR symbols".into());
    }

    for lexeme in &data.lexemes {
        if !symbol_ok(lexeme.symbol) || !data.symbols[lexeme.symbol as usize].is_terminal() {
            return inconsistent(format!("lexeme for non-terminal symbol {}", lexeme.symbol));
        }
    }
    for matcher in data.lexemes.iter().map(|l| &l.matcher).chain(&data.separators) {
        if let Matcher::Pattern { dfa, .. } = matcher
            && *dfa as usize >= dfa_count
        {
            return inconsistent(format!("pattern refers to missing DFA {dfa}"));
        }
    }
    for &s in data.extras.iter().chain(&data.externals).chain(&data.word) {
        if !symbol_ok(s) {
            return inconsistent(format!("symbol {s} out of range"));
        }
    }

    for (i, p) in data.productions.iter().enumerate() {
        if !symbol_ok(p.lhs) || data.symbols[p.lhs as usize].is_terminal() {
            return inconsistent(format!("production {i} has invalid lhs {}", p.lhs));
        }
        for step in &p.steps {
            if !symbol_ok(step.symbol)
                || step.field.is_some_and(|f| f as usize >= data.fields.len())
                || step.alias.is_some_and(|a| !symbol_ok(a))
            {
                return inconsistent(format!("production {i} has an invalid step"));
            }
        }
    }

    for mode in &data.lex_modes {
        if mode.terminals.iter().any(|&s| !symbol_ok(s)) {
            return inconsistent("lex mode refers to a missing symbol".into());
        }
    }

    let states = data.states.len();
    if data.start_state as usize >= states {
        return inconsistent(format!("start state {} out of range", data.start_state));
    }
    for (i, state) in data.states.iter().enumerate() {
        if state.lex_mode as usize >= data.lex_modes.len() {
            return inconsistent(format!("state {i} has invalid lex mode"));
        }
        if !state.actions.is_sorted_by_key(|e| e.symbol)
            || !state.gotos.is_sorted_by_key(|&(s, _)| s)
        {
            return inconsistent(format!("state {i} rows are not sorted"));
        }
        for entry in &state.actions {
            if !symbol_ok(entry.symbol) {
                return inconsistent(format!("state {i} has an action on a missing symbol"));
            }
            for action in &entry.actions {
                let ok = match *action {
                    Action::Shift(target) => (target as usize) < states,
                    Action::Reduce(p) => (p as usize) < data.productions.len(),
                    Action::ShiftExtra | Action::Accept => true,
                };
                if !ok {
                    return inconsistent(format!("state {i} has a dangling action"));
                }
            }
        }
        for &(symbol, target) in &state.gotos {
            if !symbol_ok(symbol) || target as usize >= states {
                return inconsistent(format!("state {i} has a dangling goto"));
            }
        }
    }

    Ok(())
}
