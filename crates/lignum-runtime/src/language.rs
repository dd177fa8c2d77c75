//! Loaded grammar, ready for parsing.
//!
//! A [`Language`] wraps a validated [`GrammarTable`] together with the
//! deserialized lexer DFAs and an optional external scanner. It is immutable
//! and cheap to clone, so any number of parsers can share one.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use lignum_table::{
    FieldId, GrammarLoadError, GrammarTable, StateId, SymbolId, SymbolInfo, deserialize_dfa,
};
use regex_automata::dfa::sparse;

use crate::scanner::ExternalScanner;

pub(crate) type Dfa = sparse::DFA<Vec<u8>>;

struct Tables {
    table: GrammarTable,
    dfas: Vec<Dfa>,
}

#[derive(Clone)]
pub struct Language {
    tables: Arc<Tables>,
    scanner: Option<Arc<dyn ExternalScanner>>,
}

impl Language {
    /// Load a grammar table from bytes.
    pub fn load(bytes: &[u8]) -> Result<Self, GrammarLoadError> {
        Self::from_table(GrammarTable::load(bytes)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GrammarLoadError> {
        Self::from_table(GrammarTable::from_path(path)?)
    }

    /// Wrap an already validated table, deserializing its DFAs.
    pub fn from_table(table: GrammarTable) -> Result<Self, GrammarLoadError> {
        let dfas = (0..table.dfa_count())
            .map(|index| {
                deserialize_dfa(table.dfa_bytes(index))
                    .map(|dfa| dfa.to_owned())
                    .map_err(|reason| GrammarLoadError::InvalidDfa { index, reason })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            grammar = table.name(),
            symbols = table.symbol_count(),
            states = table.state_count(),
            dfas = dfas.len(),
            "loaded grammar table"
        );

        Ok(Self {
            tables: Arc::new(Tables { table, dfas }),
            scanner: None,
        })
    }

    /// Attach the scanner for the grammar's external tokens.
    pub fn with_external_scanner(mut self, scanner: impl ExternalScanner + 'static) -> Self {
        self.scanner = Some(Arc::new(scanner));
        self
    }

    pub fn name(&self) -> &str {
        self.table().name()
    }

    /// Engine ABI version the table was built for.
    pub fn abi_version(&self) -> u32 {
        self.table().header().version
    }

    pub fn symbol_count(&self) -> usize {
        self.table().symbol_count()
    }

    pub fn symbol_name(&self, id: SymbolId) -> Option<&str> {
        self.table().symbol_name(id)
    }

    pub fn symbol_for_name(&self, name: &str, named: bool) -> Option<SymbolId> {
        self.table().symbol_for_name(name, named)
    }

    pub fn field_name(&self, id: FieldId) -> Option<&str> {
        self.table().field_name(id)
    }

    pub fn field_id_for_name(&self, name: &str) -> Option<FieldId> {
        self.table().field_id_for_name(name)
    }

    pub fn state_count(&self) -> usize {
        self.table().state_count()
    }

    pub fn external_token_names(&self) -> Vec<&str> {
        let table = self.table();
        table
            .data()
            .externals
            .iter()
            .map(|&symbol| table.symbol(symbol).name.as_str())
            .collect()
    }

    pub fn has_external_scanner(&self) -> bool {
        self.scanner.is_some()
    }

    pub fn table(&self) -> &GrammarTable {
        &self.tables.table
    }

    pub(crate) fn dfa(&self, index: u16) -> &Dfa {
        &self.tables.dfas[index as usize]
    }

    pub(crate) fn scanner(&self) -> Option<&dyn ExternalScanner> {
        self.scanner.as_deref()
    }

    pub(crate) fn info(&self, symbol: SymbolId) -> &SymbolInfo {
        self.table().symbol(symbol)
    }

    pub(crate) fn lex_mode_of(&self, state: StateId) -> u32 {
        self.table().state(state).lex_mode
    }

    /// Same tables, regardless of the attached scanner.
    pub(crate) fn same_tables(&self, other: &Language) -> bool {
        Arc::ptr_eq(&self.tables, &other.tables)
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.name())
            .field("symbols", &self.symbol_count())
            .field("states", &self.state_count())
            .field("external_scanner", &self.scanner.is_some())
            .finish()
    }
}
