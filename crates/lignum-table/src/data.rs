//! Decoded grammar table model.
//!
//! Symbol ids are laid out as: `END` (0), `ERROR` (1), terminals in
//! declaration order, external tokens, non-terminals, then alias symbols.

use serde::{Deserialize, Serialize};

pub type SymbolId = u16;
pub type StateId = u32;
pub type FieldId = u16;
pub type ProductionId = u32;
pub type LexModeId = u32;

/// End-of-input symbol.
pub const END: SymbolId = 0;
/// Error symbol, used for ERROR nodes and unrecognized input.
pub const ERROR: SymbolId = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    End,
    Error,
    /// Token recognized by the built-in lexer.
    Terminal,
    /// Token recognized by an external scanner.
    External,
    NonTerminal,
    /// Generated helper rule (repetitions, start rule). Never visible.
    Auxiliary,
    /// Renamed symbol introduced by an alias.
    Alias,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    pub named: bool,
    /// Invisible symbols are spliced into their parent when viewing a tree.
    pub visible: bool,
}

impl SymbolInfo {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::End | SymbolKind::Error | SymbolKind::Terminal | SymbolKind::External
        )
    }
}

/// How a lexeme is recognized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Matcher {
    /// Exact byte string.
    Literal(String),
    /// Anchored longest-match DFA stored in the DFA blob.
    Pattern { dfa: u16, source: String },
}

impl Matcher {
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

/// Lexical definition of a terminal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lexeme {
    pub symbol: SymbolId,
    pub matcher: Matcher,
    /// Declared lexical precedence, used to break equal-length ties.
    pub precedence: i32,
    /// Only valid when no separator precedes the token.
    pub immediate: bool,
    /// Literal that is also a complete match of the word token.
    pub keyword: bool,
}

/// One child of a production.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub symbol: SymbolId,
    pub field: Option<FieldId>,
    pub alias: Option<SymbolId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Production {
    pub lhs: SymbolId,
    pub dynamic_precedence: i32,
    /// One entry per child; its length is the number of popped children.
    pub steps: Vec<Step>,
}

impl Production {
    pub fn child_count(&self) -> usize {
        self.steps.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Shift(StateId),
    /// Shift an extra token without changing state.
    ShiftExtra,
    Reduce(ProductionId),
    Accept,
}

/// All actions for one lookahead symbol. More than one action means a GLR fork.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEntry {
    pub symbol: SymbolId,
    pub actions: Vec<Action>,
}

/// Set of terminals the lexer may produce in a group of parse states.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexMode {
    /// Sorted terminal and external symbol ids.
    pub terminals: Vec<SymbolId>,
}

impl LexMode {
    pub fn contains(&self, symbol: SymbolId) -> bool {
        self.terminals.binary_search(&symbol).is_ok()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseState {
    pub lex_mode: LexModeId,
    /// Sorted by symbol.
    pub actions: Vec<ActionEntry>,
    /// Sorted by symbol.
    pub gotos: Vec<(SymbolId, StateId)>,
}

impl ParseState {
    pub fn actions(&self, symbol: SymbolId) -> &[Action] {
        self.actions
            .binary_search_by_key(&symbol, |e| e.symbol)
            .map_or(&[], |i| self.actions[i].actions.as_slice())
    }

    pub fn goto(&self, symbol: SymbolId) -> Option<StateId> {
        self.gotos
            .binary_search_by_key(&symbol, |&(s, _)| s)
            .ok()
            .map(|i| self.gotos[i].1)
    }
}

/// Everything the runtime needs except the DFA bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableData {
    pub name: String,
    pub symbols: Vec<SymbolInfo>,
    pub fields: Vec<String>,
    /// Lexical definitions in declaration order.
    pub lexemes: Vec<Lexeme>,
    /// Skipped extras; their matches become token padding.
    pub separators: Vec<Matcher>,
    /// Extras that stay in the tree (e.g. comments).
    pub extras: Vec<SymbolId>,
    pub word: Option<SymbolId>,
    /// External token symbols, indexed by external token index.
    pub externals: Vec<SymbolId>,
    pub productions: Vec<Production>,
    pub lex_modes: Vec<LexMode>,
    pub states: Vec<ParseState>,
    pub start_state: StateId,
}
