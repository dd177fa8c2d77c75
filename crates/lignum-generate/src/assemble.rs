//! Final table assembly: symbol ids, parse states, lex modes and DFAs.

use std::collections::HashMap;

use lignum_table::{
    ActionEntry, ERROR, FieldId, LexMode, LexModeId, Lexeme, Matcher, ParseState, Production,
    StateId, Step, SymbolId, SymbolInfo, SymbolKind, TableData,
};

use crate::dfa::DfaTableBuilder;
use crate::lalr::{self, Cfg, CfgProduction};
use crate::lower::{LoweredGrammar, SymRef, TokenPattern};
use crate::resolve::{self, ResolveInput, ResolvedState, StepPrecedence};
use crate::{GenerateError, Generated};

/// Symbol id assignment: `END`, `ERROR`, terminals, externals, nonterminals, aliases.
struct Layout {
    external_base: usize,
    nonterminal_base: usize,
    alias_base: usize,
}

impl Layout {
    fn new(lowered: &LoweredGrammar) -> Self {
        let external_base = 2 + lowered.terminals.len();
        let nonterminal_base = external_base + lowered.externals.len();
        Self {
            external_base,
            nonterminal_base,
            alias_base: nonterminal_base + lowered.nonterminals.len(),
        }
    }

    fn id(&self, symbol: SymRef) -> SymbolId {
        let id = match symbol {
            SymRef::Terminal(i) => 2 + i,
            SymRef::External(i) => self.external_base + i,
            SymRef::NonTerminal(i) => self.nonterminal_base + i,
        };
        id as SymbolId
    }
}

fn symbol_info(name: &str, kind: SymbolKind, named: bool, visible: bool) -> SymbolInfo {
    SymbolInfo {
        name: name.to_string(),
        kind,
        named,
        visible,
    }
}

/// Symbol table plus the symbol id each alias resolves to. An alias that
/// names an existing visible symbol reuses its id.
fn build_symbols(lowered: &LoweredGrammar) -> (Vec<SymbolInfo>, Vec<SymbolId>) {
    let mut symbols = vec![
        symbol_info("end", SymbolKind::End, true, false),
        symbol_info("ERROR", SymbolKind::Error, true, true),
    ];
    symbols.extend(
        lowered
            .terminals
            .iter()
            .map(|t| symbol_info(&t.name, SymbolKind::Terminal, t.named, t.visible)),
    );
    symbols.extend(
        lowered
            .externals
            .iter()
            .map(|e| symbol_info(&e.name, SymbolKind::External, e.named, e.visible)),
    );
    symbols.extend(lowered.nonterminals.iter().map(|n| {
        let kind = if n.auxiliary {
            SymbolKind::Auxiliary
        } else {
            SymbolKind::NonTerminal
        };
        symbol_info(&n.name, kind, true, n.visible)
    }));

    let mut aliases = Vec::with_capacity(lowered.aliases.len());
    for (name, named) in &lowered.aliases {
        let existing = symbols
            .iter()
            .position(|s| s.visible && s.named == *named && s.name == *name);
        let id = existing.unwrap_or_else(|| {
            symbols.push(symbol_info(name, SymbolKind::Alias, *named, true));
            symbols.len() - 1
        });
        aliases.push(id as SymbolId);
    }

    (symbols, aliases)
}

fn matcher(pattern: &TokenPattern, dfas: &mut DfaTableBuilder) -> Result<Matcher, GenerateError> {
    Ok(match pattern {
        TokenPattern::Literal(text) => Matcher::Literal(text.clone()),
        TokenPattern::Regex(source) => Matcher::Pattern {
            dfa: dfas.intern(source)?,
            source: source.clone(),
        },
    })
}

fn field_id(index: usize) -> Result<FieldId, GenerateError> {
    FieldId::try_from(index).map_err(|_| GenerateError::TooManySymbols(index))
}

pub(crate) fn assemble(lowered: LoweredGrammar) -> Result<Generated, GenerateError> {
    let layout = Layout::new(&lowered);
    let (symbols, aliases) = build_symbols(&lowered);
    if symbols.len() > SymbolId::MAX as usize {
        return Err(GenerateError::TooManySymbols(symbols.len()));
    }

    let mut productions = Vec::with_capacity(lowered.productions.len());
    let mut cfg_productions = Vec::with_capacity(lowered.productions.len());
    let mut precedence = Vec::with_capacity(lowered.productions.len());
    for production in &lowered.productions {
        let lhs = layout.id(SymRef::NonTerminal(production.lhs));
        let mut steps = Vec::with_capacity(production.steps.len());
        for step in &production.steps {
            steps.push(Step {
                symbol: layout.id(step.symbol),
                field: step.field.map(field_id).transpose()?,
                alias: step.alias.map(|a| aliases[a]),
            });
        }
        cfg_productions.push(CfgProduction {
            lhs,
            rhs: steps.iter().map(|s| s.symbol).collect(),
        });
        precedence.push(StepPrecedence {
            precedence: production.steps.iter().map(|s| s.precedence).collect(),
            assoc: production.steps.iter().map(|s| s.assoc).collect(),
        });
        productions.push(Production {
            lhs,
            dynamic_precedence: production.dynamic_precedence,
            steps,
        });
    }

    let cfg = Cfg {
        terminal_count: layout.nonterminal_base,
        symbol_count: layout.alias_base,
        productions: cfg_productions,
    };
    let automaton = lalr::build(&cfg);
    if automaton.len() > StateId::MAX as usize {
        return Err(GenerateError::TooManyStates(automaton.len()));
    }

    let origins: Vec<String> = lowered.nonterminals.iter().map(|n| n.origin.clone()).collect();
    let symbol_names: Vec<String> = symbols.iter().map(|s| s.name.clone()).collect();
    let extras: Vec<SymbolId> = lowered.extras.iter().map(|&e| layout.id(e)).collect();
    let (resolved, conflicts) = resolve::resolve(
        &ResolveInput {
            cfg: &cfg,
            precedence: &precedence,
            origins: &origins,
            symbol_names: &symbol_names,
            expected: &lowered.expected_conflicts,
            extras: &extras,
        },
        &automaton,
    );

    let (states, lex_modes) = build_states(resolved);

    let mut dfas = DfaTableBuilder::new();
    let mut lexemes = Vec::with_capacity(lowered.terminals.len());
    for (i, terminal) in lowered.terminals.iter().enumerate() {
        lexemes.push(Lexeme {
            symbol: layout.id(SymRef::Terminal(i)),
            matcher: matcher(&terminal.pattern, &mut dfas)?,
            precedence: terminal.precedence,
            immediate: terminal.immediate,
            keyword: terminal.keyword,
        });
    }
    let separators = lowered
        .separators
        .iter()
        .map(|p| matcher(p, &mut dfas))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        grammar = %lowered.name,
        symbols = symbols.len(),
        productions = productions.len(),
        states = states.len(),
        lex_modes = lex_modes.len(),
        dfas = dfas.len(),
        conflicts = conflicts.len(),
        "assembled parse table"
    );

    let data = TableData {
        name: lowered.name,
        symbols,
        fields: lowered.fields,
        lexemes,
        separators,
        extras,
        word: lowered.word.map(|w| layout.id(SymRef::Terminal(w))),
        externals: (0..lowered.externals.len())
            .map(|i| layout.id(SymRef::External(i)))
            .collect(),
        productions,
        lex_modes,
        states,
        start_state: 0,
    };

    let state_count = data.states.len();
    let bytes = lignum_table::emit(&data, &dfas.into_blobs())?;
    Ok(Generated {
        bytes,
        conflicts,
        state_count,
    })
}

/// Convert resolved states, sharing one lex mode between states that accept
/// the same terminals.
fn build_states(resolved: Vec<ResolvedState>) -> (Vec<ParseState>, Vec<LexMode>) {
    let mut lex_modes = Vec::new();
    let mut mode_index: HashMap<Vec<SymbolId>, LexModeId> = HashMap::new();
    let mut states = Vec::with_capacity(resolved.len());

    for state in resolved {
        let terminals: Vec<SymbolId> = state.actions.keys().copied().filter(|&s| s > ERROR).collect();
        let lex_mode = *mode_index.entry(terminals.clone()).or_insert_with(|| {
            lex_modes.push(LexMode { terminals });
            (lex_modes.len() - 1) as LexModeId
        });
        states.push(ParseState {
            lex_mode,
            actions: state
                .actions
                .into_iter()
                .map(|(symbol, actions)| ActionEntry { symbol, actions })
                .collect(),
            gotos: state.gotos.into_iter().collect(),
        });
    }

    (states, lex_modes)
}
