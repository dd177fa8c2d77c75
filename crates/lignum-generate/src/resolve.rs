//! Action table construction and conflict resolution.
//!
//! Shift/reduce conflicts are settled by comparing the reduced production's
//! precedence against the precedence of the items that would shift, then by
//! the production's associativity. Reduce/reduce conflicts keep the highest
//! precedence productions. Whatever remains is kept as a GLR fork.

use std::collections::{BTreeMap, BTreeSet};

use lignum_table::{Action, StateId, SymbolId};

use crate::lalr::{Cfg, LalrState};
use crate::lower::Assoc;

/// A conflict that survived precedence and associativity resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateId,
    /// Lookahead symbol name.
    pub symbol: String,
    /// Actions kept for the lookahead; the parser forks on them.
    pub actions: Vec<Action>,
    /// Grammar rules involved, sorted.
    pub rules: Vec<String>,
    /// Whether the grammar declares this conflict.
    pub expected: bool,
}

/// Precedence data for each production step, parallel to `Cfg::productions`.
#[derive(Debug)]
pub(crate) struct StepPrecedence {
    pub precedence: Vec<i32>,
    pub assoc: Vec<Assoc>,
}

impl StepPrecedence {
    /// The production's own precedence is the one of its last step.
    fn reduce(&self) -> (i32, Assoc) {
        match (self.precedence.last(), self.assoc.last()) {
            (Some(&p), Some(&a)) => (p, a),
            _ => (0, Assoc::None),
        }
    }
}

pub(crate) struct ResolveInput<'a> {
    pub cfg: &'a Cfg,
    pub precedence: &'a [StepPrecedence],
    /// Originating rule name per nonterminal, indexed from `terminal_count`.
    pub origins: &'a [String],
    pub symbol_names: &'a [String],
    pub expected: &'a [Vec<String>],
    pub extras: &'a [SymbolId],
}

#[derive(Debug, Default)]
pub(crate) struct ResolvedState {
    pub actions: BTreeMap<SymbolId, Vec<Action>>,
    pub gotos: BTreeMap<SymbolId, StateId>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Preference {
    Shift,
    Reduce,
    Both,
}

struct ShiftInfo {
    target: usize,
    low: i32,
    high: i32,
    rules: BTreeSet<SymbolId>,
}

pub(crate) fn resolve(
    input: &ResolveInput<'_>,
    states: &[LalrState],
) -> (Vec<ResolvedState>, Vec<Conflict>) {
    let mut resolved = Vec::with_capacity(states.len());
    let mut conflicts = Vec::new();

    for (index, state) in states.iter().enumerate() {
        let mut out = ResolvedState::default();
        let mut shifts: BTreeMap<SymbolId, ShiftInfo> = BTreeMap::new();
        let mut reduces: BTreeMap<SymbolId, Vec<u32>> = BTreeMap::new();

        for (&symbol, &target) in &state.transitions {
            if input.cfg.is_terminal(symbol) {
                shifts.insert(
                    symbol,
                    ShiftInfo {
                        target,
                        low: i32::MAX,
                        high: i32::MIN,
                        rules: BTreeSet::new(),
                    },
                );
            } else {
                out.gotos.insert(symbol, target as StateId);
            }
        }

        for (item, lookahead) in &state.items {
            let production = &input.cfg.productions[item.production as usize];
            match production.rhs.get(item.dot as usize) {
                Some(symbol) => {
                    if let Some(info) = shifts.get_mut(symbol) {
                        let p = input.precedence[item.production as usize].precedence
                            [item.dot as usize];
                        info.low = info.low.min(p);
                        info.high = info.high.max(p);
                        info.rules.insert(production.lhs);
                    }
                }
                None => {
                    for symbol in lookahead.iter() {
                        reduces.entry(symbol).or_default().push(item.production);
                    }
                }
            }
        }

        let symbols: BTreeSet<SymbolId> = shifts.keys().chain(reduces.keys()).copied().collect();
        for symbol in symbols {
            let shift = shifts.get(&symbol);
            let mut candidates = reduces.remove(&symbol).unwrap_or_default();
            candidates.sort_unstable();
            candidates.dedup();

            let (actions, conflicted) = decide(input, shift, &mut candidates);
            if conflicted {
                let mut rules: BTreeSet<&str> = BTreeSet::new();
                let lhs_of = |p: &u32| input.cfg.productions[*p as usize].lhs;
                for lhs in candidates
                    .iter()
                    .map(lhs_of)
                    .chain(shift.iter().flat_map(|s| s.rules.iter().copied()))
                {
                    let origin = &input.origins[lhs as usize - input.cfg.terminal_count];
                    rules.insert(origin.as_str());
                }
                let rules: Vec<String> = rules.into_iter().map(str::to_string).collect();
                let expected = input
                    .expected
                    .iter()
                    .any(|declared| rules.iter().all(|r| declared.contains(r)));
                let name = &input.symbol_names[symbol as usize];
                if !expected {
                    tracing::warn!(state = index, symbol = %name, rules = ?rules, "unresolved conflict");
                }
                conflicts.push(Conflict {
                    state: index as StateId,
                    symbol: name.clone(),
                    actions: actions.clone(),
                    rules,
                    expected,
                });
            }
            out.actions.insert(symbol, actions);
        }

        for &extra in input.extras {
            out.actions.entry(extra).or_insert_with(|| vec![Action::ShiftExtra]);
        }

        resolved.push(out);
    }

    (resolved, conflicts)
}

/// Pick the actions for one lookahead. Returns whether a conflict remains.
fn decide(
    input: &ResolveInput<'_>,
    shift: Option<&ShiftInfo>,
    candidates: &mut Vec<u32>,
) -> (Vec<Action>, bool) {
    let reduce_of = |p: u32| input.precedence[p as usize].reduce();
    let mut conflicted = false;

    if candidates.len() > 1 {
        let best = candidates.iter().map(|&p| reduce_of(p).0).max().unwrap_or(0);
        candidates.retain(|&p| reduce_of(p).0 == best);
        conflicted = candidates.len() > 1;
    }

    let mut keep_shift = shift.is_some();
    if let Some(info) = shift {
        if !candidates.is_empty() {
            let preferences: Vec<Preference> = candidates
                .iter()
                .map(|&p| {
                    let (precedence, assoc) = reduce_of(p);
                    if precedence > info.high {
                        Preference::Reduce
                    } else if precedence < info.low {
                        Preference::Shift
                    } else if info.low == info.high {
                        match assoc {
                            Assoc::Left => Preference::Reduce,
                            Assoc::Right => Preference::Shift,
                            Assoc::None => Preference::Both,
                        }
                    } else {
                        Preference::Both
                    }
                })
                .collect();

            if preferences.iter().all(|&p| p == Preference::Shift) {
                candidates.clear();
            } else if preferences.iter().all(|&p| p == Preference::Reduce) {
                keep_shift = false;
            } else {
                let mut kept = preferences.iter();
                candidates.retain(|_| kept.next() != Some(&Preference::Shift));
                conflicted = true;
            }
        }
    }

    let mut actions = Vec::with_capacity(candidates.len() + 1);
    if let (true, Some(info)) = (keep_shift, shift) {
        actions.push(Action::Shift(info.target as StateId));
    }
    actions.extend(candidates.iter().map(|&p| {
        if p == 0 {
            Action::Accept
        } else {
            Action::Reduce(p)
        }
    }));
    (actions, conflicted)
}
