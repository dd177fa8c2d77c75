//! Persistent syntax subtrees.
//!
//! Subtrees are immutable and reference counted. Positions are relative: each
//! subtree knows its padding (skipped separators before it) and its size, so
//! an unchanged subtree can be shared by trees where it sits at different
//! offsets.

use std::sync::Arc;

use lignum_table::{ERROR, FieldId, LexModeId, StateId, SymbolId};

use crate::language::Language;
use crate::lex::{NO_LEX_MODE, Token};

/// Parse state recorded on subtrees that must never be reused.
pub(crate) const NO_STATE: StateId = StateId::MAX;

/// Cost of a zero-width MISSING token.
pub(crate) const COST_MISSING: u32 = 110;
/// Base cost of skipping a token into an ERROR node.
pub(crate) const COST_SKIP: u32 = 100;
/// Base cost of popping finished subtrees into an ERROR node.
pub(crate) const COST_POP: u32 = 500;
/// Cost per subtree popped into an ERROR node.
pub(crate) const COST_PER_TREE: u32 = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Flags {
    pub named: bool,
    pub visible: bool,
    pub extra: bool,
    /// An ERROR node or token.
    pub error: bool,
    pub missing: bool,
    /// Built while the parser had several versions; its shape may depend on
    /// how they were merged.
    pub fragile: bool,
    pub has_error: bool,
    /// Contains a token produced by the external scanner.
    pub depends_on_scanner: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct SubtreeData {
    /// Symbol after aliasing.
    pub symbol: SymbolId,
    /// Symbol the grammar reduced or shifted; drives gotos on reuse.
    pub grammar_symbol: SymbolId,
    pub padding: usize,
    pub size: usize,
    /// Bytes examined by the lexer from the start of the padding.
    pub lookahead: usize,
    /// State on top of the stack when this subtree was pushed.
    pub parse_state: StateId,
    pub lex_mode: LexModeId,
    pub flags: Flags,
    /// Total error cost, including the children.
    pub error_cost: u32,
    /// Total dynamic precedence, including the children.
    pub dynamic_precedence: i32,
    pub children: Vec<Subtree>,
    /// Field of each child, parallel to `children`.
    pub fields: Vec<Option<FieldId>>,
    own_cost: u32,
    own_precedence: i32,
}

#[derive(Clone, Debug)]
pub(crate) struct Subtree(Arc<SubtreeData>);

impl std::ops::Deref for Subtree {
    type Target = SubtreeData;

    fn deref(&self) -> &SubtreeData {
        &self.0
    }
}

impl Subtree {
    fn new(data: SubtreeData) -> Self {
        Self(Arc::new(data))
    }

    pub fn leaf(language: &Language, token: &Token, parse_state: StateId) -> Self {
        let info = language.info(token.symbol);
        let error = token.symbol == ERROR;
        Self::new(SubtreeData {
            symbol: token.symbol,
            grammar_symbol: token.symbol,
            padding: token.padding,
            size: token.size,
            lookahead: token.lookahead,
            parse_state,
            lex_mode: token.lex_mode,
            flags: Flags {
                named: info.named,
                visible: info.visible,
                error,
                has_error: error,
                depends_on_scanner: token.external || token.scanned,
                ..Flags::default()
            },
            error_cost: 0,
            dynamic_precedence: 0,
            children: Vec::new(),
            fields: Vec::new(),
            own_cost: 0,
            own_precedence: 0,
        })
    }

    /// Zero-width token inserted by error recovery.
    pub fn missing(language: &Language, symbol: SymbolId, parse_state: StateId) -> Self {
        let info = language.info(symbol);
        Self::new(SubtreeData {
            symbol,
            grammar_symbol: symbol,
            padding: 0,
            size: 0,
            lookahead: 0,
            parse_state,
            lex_mode: NO_LEX_MODE,
            flags: Flags {
                named: info.named,
                visible: info.visible,
                missing: true,
                has_error: true,
                ..Flags::default()
            },
            error_cost: COST_MISSING,
            dynamic_precedence: 0,
            children: Vec::new(),
            fields: Vec::new(),
            own_cost: COST_MISSING,
            own_precedence: 0,
        })
    }

    /// Interior node over `children`.
    pub fn node(
        language: &Language,
        symbol: SymbolId,
        children: Vec<Subtree>,
        fields: Vec<Option<FieldId>>,
        dynamic_precedence: i32,
        parse_state: StateId,
        fragile: bool,
    ) -> Self {
        let info = language.info(symbol);
        let mut data = SubtreeData {
            symbol,
            grammar_symbol: symbol,
            padding: 0,
            size: 0,
            lookahead: 0,
            parse_state,
            lex_mode: NO_LEX_MODE,
            flags: Flags {
                named: info.named,
                visible: info.visible,
                error: symbol == ERROR,
                fragile,
                ..Flags::default()
            },
            error_cost: 0,
            dynamic_precedence: 0,
            children,
            fields,
            own_cost: 0,
            own_precedence: dynamic_precedence,
        };
        data.summarize();
        Self::new(data)
    }

    /// ERROR node wrapping `children`, shifted as an extra.
    pub fn error(language: &Language, children: Vec<Subtree>, cost: u32, parse_state: StateId) -> Self {
        let fields = vec![None; children.len()];
        let mut node = Self::node(language, ERROR, children, fields, 0, parse_state, false);
        let data = node.make_mut();
        data.flags.extra = true;
        data.own_cost = cost;
        data.parse_state = NO_STATE;
        data.summarize();
        node
    }

    /// Non-extra ERROR node spanning a whole stack that could not be parsed.
    pub fn error_root(language: &Language, children: Vec<Subtree>, cost: u32) -> Self {
        let mut node = Self::error(language, children, cost, NO_STATE);
        node.make_mut().flags.extra = false;
        node
    }

    pub fn total_len(&self) -> usize {
        self.padding + self.size
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Copy with a different visible symbol; the grammar symbol is kept.
    pub fn with_alias(&self, language: &Language, alias: SymbolId) -> Self {
        if self.symbol == alias {
            return self.clone();
        }
        let info = language.info(alias);
        let mut copy = self.clone();
        let data = copy.make_mut();
        data.symbol = alias;
        data.flags.named = info.named;
        data.flags.visible = info.visible;
        copy
    }

    pub fn with_extra(&self) -> Self {
        if self.flags.extra {
            return self.clone();
        }
        let mut copy = self.clone();
        copy.make_mut().flags.extra = true;
        copy
    }

    pub fn with_fragile(&self) -> Self {
        if self.flags.fragile {
            return self.clone();
        }
        let mut copy = self.clone();
        copy.make_mut().flags.fragile = true;
        copy
    }

    /// Copy spanning exactly `[0, len)`, used for the root.
    pub fn with_span(&self, len: usize) -> Self {
        let mut copy = self.clone();
        let data = copy.make_mut();
        data.padding = 0;
        data.size = len;
        data.parse_state = NO_STATE;
        copy
    }

    /// Copy of an ERROR node with `child` appended and `cost` added.
    pub fn with_child(&self, child: Subtree, cost: u32) -> Self {
        let mut copy = self.clone();
        let data = copy.make_mut();
        data.children.push(child);
        data.fields.push(None);
        data.own_cost += cost;
        data.summarize();
        copy
    }

    /// Copy of an unmatched lexer token skipped as an extra at `cost`.
    pub fn skipped(&self, cost: u32) -> Self {
        let mut copy = self.clone();
        let data = copy.make_mut();
        data.flags.extra = true;
        data.parse_state = NO_STATE;
        data.own_cost = cost;
        if data.children.is_empty() {
            data.error_cost = cost;
        } else {
            data.summarize();
        }
        copy
    }

    /// Copy of a skipped ERROR token extended over the next unmatched token.
    pub fn with_error_token(&self, token: &Token, cost: u32) -> Self {
        let mut copy = self.clone();
        let data = copy.make_mut();
        data.lookahead = data.lookahead.max(data.padding + data.size + token.lookahead);
        data.size += token.padding + token.size;
        data.own_cost += cost;
        data.error_cost += cost;
        data.flags.depends_on_scanner |= token.scanned;
        copy
    }

    /// First leaf that covers text, skipping empty reductions.
    pub fn first_token(&self) -> Option<&Subtree> {
        let mut pending = vec![self];
        while let Some(subtree) = pending.pop() {
            if subtree.is_leaf() {
                if subtree.total_len() > 0 {
                    return Some(subtree);
                }
                continue;
            }
            pending.extend(subtree.children.iter().rev());
        }
        None
    }

    fn make_mut(&mut self) -> &mut SubtreeData {
        Arc::make_mut(&mut self.0)
    }
}

impl Drop for SubtreeData {
    // Repetitions nest as deep as the list is long; release them with an
    // explicit stack instead of recursing.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(child) = pending.pop() {
            if let Ok(mut data) = Arc::try_unwrap(child.0) {
                pending.append(&mut data.children);
            }
        }
    }
}

impl SubtreeData {
    /// Recompute span, cost and flags from the children.
    fn summarize(&mut self) {
        let mut offset = 0;
        let mut lookahead = 0;
        let mut error_cost = 0;
        let mut dynamic_precedence = 0;
        let mut has_error = self.flags.error;
        let mut fragile = self.flags.fragile;
        let mut depends_on_scanner = false;

        for child in &self.children {
            lookahead = lookahead.max(offset + child.lookahead);
            offset += child.total_len();
            error_cost += child.error_cost;
            dynamic_precedence += child.dynamic_precedence;
            has_error |= child.flags.has_error;
            fragile |= child.flags.fragile;
            depends_on_scanner |= child.flags.depends_on_scanner;
        }

        self.padding = self.children.first().map_or(0, |c| c.padding);
        self.size = offset - self.padding;
        self.lookahead = lookahead.max(offset);
        self.error_cost = self.own_cost + error_cost;
        self.dynamic_precedence = self.own_precedence + dynamic_precedence;
        self.flags.has_error = has_error;
        self.flags.fragile = fragile;
        self.flags.depends_on_scanner = depends_on_scanner;
    }
}
