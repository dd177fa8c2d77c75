//! LALR(1) automaton construction.
//!
//! States are identified by their kernel cores. When a transition reaches an
//! existing core, the lookaheads are merged into it and the state is queued
//! again until nothing changes.

use std::collections::{BTreeMap, HashMap, VecDeque};

use lignum_table::{END, SymbolId};

use crate::token_set::TokenSet;

/// Context-free view of the grammar, with final symbol ids.
#[derive(Debug)]
pub(crate) struct Cfg {
    /// Ids below this are terminals (including `END`, `ERROR` and externals).
    pub terminal_count: usize,
    pub symbol_count: usize,
    pub productions: Vec<CfgProduction>,
}

#[derive(Debug)]
pub(crate) struct CfgProduction {
    pub lhs: SymbolId,
    pub rhs: Vec<SymbolId>,
}

impl Cfg {
    pub fn is_terminal(&self, symbol: SymbolId) -> bool {
        (symbol as usize) < self.terminal_count
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Item {
    pub production: u32,
    pub dot: u32,
}

impl Item {
    fn advance(self) -> Self {
        Self {
            production: self.production,
            dot: self.dot + 1,
        }
    }
}

#[derive(Debug)]
pub(crate) struct LalrState {
    /// Closure items with their lookaheads.
    pub items: Vec<(Item, TokenSet)>,
    pub transitions: BTreeMap<SymbolId, usize>,
}

struct FirstSets {
    first: Vec<TokenSet>,
    nullable: Vec<bool>,
}

impl FirstSets {
    fn compute(cfg: &Cfg) -> Self {
        let nonterminals = cfg.symbol_count - cfg.terminal_count;
        let mut first = vec![TokenSet::new(); nonterminals];
        let mut nullable = vec![false; nonterminals];

        let mut changed = true;
        while changed {
            changed = false;
            for production in &cfg.productions {
                let lhs = production.lhs as usize - cfg.terminal_count;
                let mut all_nullable = true;
                for &symbol in &production.rhs {
                    if cfg.is_terminal(symbol) {
                        changed |= first[lhs].insert(symbol);
                        all_nullable = false;
                        break;
                    }
                    let rhs = symbol as usize - cfg.terminal_count;
                    if rhs != lhs {
                        let other = first[rhs].clone();
                        changed |= first[lhs].union_with(&other);
                    }
                    if !nullable[rhs] {
                        all_nullable = false;
                        break;
                    }
                }
                if all_nullable && !nullable[lhs] {
                    nullable[lhs] = true;
                    changed = true;
                }
            }
        }

        Self { first, nullable }
    }

    /// FIRST of `symbols` followed by `lookahead`.
    fn of_sequence(&self, cfg: &Cfg, symbols: &[SymbolId], lookahead: &TokenSet) -> TokenSet {
        let mut set = TokenSet::new();
        for &symbol in symbols {
            if cfg.is_terminal(symbol) {
                set.insert(symbol);
                return set;
            }
            let index = symbol as usize - cfg.terminal_count;
            set.union_with(&self.first[index]);
            if !self.nullable[index] {
                return set;
            }
        }
        set.union_with(lookahead);
        set
    }
}

struct Builder<'a> {
    cfg: &'a Cfg,
    first: FirstSets,
    by_lhs: Vec<Vec<u32>>,
}

impl Builder<'_> {
    fn closure(&self, kernel: &[(Item, TokenSet)]) -> Vec<(Item, TokenSet)> {
        let mut items: Vec<(Item, TokenSet)> = kernel.to_vec();
        let mut index: HashMap<Item, usize> =
            items.iter().enumerate().map(|(i, (item, _))| (*item, i)).collect();
        let mut queue: Vec<usize> = (0..items.len()).collect();

        while let Some(i) = queue.pop() {
            let (item, lookahead) = items[i].clone();
            let rhs = &self.cfg.productions[item.production as usize].rhs;
            let Some(&next) = rhs.get(item.dot as usize) else {
                continue;
            };
            if self.cfg.is_terminal(next) {
                continue;
            }

            let follow = self
                .first
                .of_sequence(self.cfg, &rhs[item.dot as usize + 1..], &lookahead);
            for &production in &self.by_lhs[next as usize - self.cfg.terminal_count] {
                let added = Item { production, dot: 0 };
                match index.get(&added) {
                    Some(&j) => {
                        if items[j].1.union_with(&follow) {
                            queue.push(j);
                        }
                    }
                    None => {
                        index.insert(added, items.len());
                        queue.push(items.len());
                        items.push((added, follow.clone()));
                    }
                }
            }
        }

        items.sort_by_key(|(item, _)| *item);
        items
    }

    /// Kernels reached from a closure, grouped by transition symbol.
    fn successors(&self, closure: &[(Item, TokenSet)]) -> BTreeMap<SymbolId, Vec<(Item, TokenSet)>> {
        let mut out: BTreeMap<SymbolId, Vec<(Item, TokenSet)>> = BTreeMap::new();
        for (item, lookahead) in closure {
            let rhs = &self.cfg.productions[item.production as usize].rhs;
            if let Some(&symbol) = rhs.get(item.dot as usize) {
                out.entry(symbol)
                    .or_default()
                    .push((item.advance(), lookahead.clone()));
            }
        }
        for kernel in out.values_mut() {
            kernel.sort_by_key(|(item, _)| *item);
            kernel.dedup_by(|(later, later_la), (earlier, earlier_la)| {
                if later == earlier {
                    earlier_la.union_with(later_la);
                    true
                } else {
                    false
                }
            });
        }
        out
    }
}

/// Build the LALR(1) automaton. State 0 is the start state, seeded with
/// production 0 and the `END` lookahead.
pub(crate) fn build(cfg: &Cfg) -> Vec<LalrState> {
    let mut by_lhs = vec![Vec::new(); cfg.symbol_count - cfg.terminal_count];
    for (i, production) in cfg.productions.iter().enumerate() {
        by_lhs[production.lhs as usize - cfg.terminal_count].push(i as u32);
    }
    let builder = Builder {
        cfg,
        first: FirstSets::compute(cfg),
        by_lhs,
    };

    let start = Item {
        production: 0,
        dot: 0,
    };
    let mut kernels: Vec<Vec<(Item, TokenSet)>> = vec![vec![(start, TokenSet::single(END))]];
    let mut transitions: Vec<BTreeMap<SymbolId, usize>> = vec![BTreeMap::new()];
    let mut cores: HashMap<Vec<Item>, usize> = HashMap::new();
    cores.insert(vec![start], 0);

    let mut queued = vec![true];
    let mut queue = VecDeque::from([0usize]);

    while let Some(state) = queue.pop_front() {
        queued[state] = false;
        let closure = builder.closure(&kernels[state]);

        for (symbol, kernel) in builder.successors(&closure) {
            let core: Vec<Item> = kernel.iter().map(|(item, _)| *item).collect();
            let target = match cores.get(&core) {
                Some(&target) => {
                    let mut changed = false;
                    for ((_, existing), (_, incoming)) in kernels[target].iter_mut().zip(&kernel) {
                        changed |= existing.union_with(incoming);
                    }
                    if changed && !queued[target] {
                        queued[target] = true;
                        queue.push_back(target);
                    }
                    target
                }
                None => {
                    let target = kernels.len();
                    cores.insert(core, target);
                    kernels.push(kernel);
                    transitions.push(BTreeMap::new());
                    queued.push(true);
                    queue.push_back(target);
                    target
                }
            };
            transitions[state].insert(symbol, target);
        }
    }

    kernels
        .iter()
        .zip(transitions)
        .map(|(kernel, transitions)| LalrState {
            items: builder.closure(kernel),
            transitions,
        })
        .collect()
}
