//! Error recovery.
//!
//! Runs only when every version rejected the lookahead. Each failed version
//! proposes repairs and the cheapest one wins:
//!
//! - insert a zero-width MISSING token that lets the lookahead through,
//! - pop finished subtrees into an ERROR node until a state accepts the
//!   lookahead,
//! - skip the lookahead into an ERROR node.
//!
//! Insertions and pops are limited per offset, so a version that keeps
//! failing at the same place ends up skipping. Skipping always makes
//! progress, except at the end of input, where the stack of the cheapest
//! version becomes an ERROR root instead.

use std::cmp::Ordering;

use lignum_table::{END, ERROR, SymbolId};

use crate::lex::Token;
use crate::scanner::ScannerState;
use crate::tree::{COST_PER_TREE, COST_POP, COST_SKIP, Subtree};

use super::engine::{Engine, Lookahead, Recovered, Version};
use super::error::CancelReason;
use super::trace::{Recovery, Tracer};

/// Insertions and pops allowed per version at one offset.
const MAX_RECOVERIES: u8 = 2;

struct Repair {
    version: Version,
    recovery: Recovery,
    consumed: bool,
}

impl Repair {
    /// Ties between equal costs go to insertion, then skipping, then popping.
    fn rank(&self) -> u8 {
        match self.recovery {
            Recovery::Missing(_) => 0,
            Recovery::Skip { .. } => 1,
            Recovery::Pop { .. } => 2,
            Recovery::Wrap => 3,
        }
    }
}

impl<T: Tracer> Engine<'_, T> {
    pub(super) fn recover(
        &mut self,
        failed: Vec<Version>,
        token: &Token,
        scanner: &ScannerState,
    ) -> Result<Recovered, CancelReason> {
        let position = self.position;
        let mut best: Option<(u32, u8, Repair)> = None;

        for version in &failed {
            let attempts = version.attempts_at(position);
            let mut repairs = Vec::new();
            if attempts < MAX_RECOVERIES {
                repairs.extend(self.insert_missing(version, token)?);
                repairs.extend(self.pop_until_viable(version, token));
            }
            if !token.is_end() {
                repairs.push(self.skip(version, token, scanner));
            }

            for mut repair in repairs {
                if !repair.consumed {
                    repair.version.recoveries = (position, attempts + 1);
                }
                let cost = self.stack.frame(repair.version.top).error_cost;
                let rank = repair.rank();
                // Earlier versions and repairs win ties.
                let better = best.as_ref().is_none_or(|(c, r, _)| (cost, rank) < (*c, *r));
                if better {
                    best = Some((cost, rank, repair));
                }
            }
        }

        let Some((_, _, repair)) = best else {
            return Ok(Recovered::Done(self.wrap(failed)));
        };

        if !self.simulating {
            self.tracer.trace_recover(repair.recovery, position);
        }
        tracing::debug!(recovery = ?repair.recovery, position, "recovered from syntax error");
        self.versions = vec![repair.version];
        if repair.consumed {
            if token.padding + token.size == 0 {
                self.no_scan_at = Some(position);
            }
            self.position += token.padding + token.size;
            return Ok(Recovered::Consumed);
        }
        Ok(Recovered::Retry)
    }

    /// Try every terminal the state expects as a zero-width token; keep the
    /// cheapest insertion after which some version accepts the lookahead.
    fn insert_missing(&mut self, version: &Version, token: &Token) -> Result<Option<Repair>, CancelReason> {
        let language = self.language;
        let table = language.table();
        let state = self.stack.state(version.top);

        let candidates: Vec<SymbolId> = table
            .state(state)
            .actions
            .iter()
            .map(|entry| entry.symbol)
            .filter(|&symbol| {
                symbol != END
                    && symbol != ERROR
                    && !table.is_extra(symbol)
                    && language.info(symbol).is_terminal()
            })
            .collect();

        let mut best: Option<Repair> = None;
        for symbol in candidates {
            let simulating = std::mem::replace(&mut self.simulating, true);
            let outcome = self.process(vec![version.clone()], Lookahead::Missing(symbol), &version.scanner);
            self.simulating = simulating;

            let viable = outcome?.shifted.into_iter().filter(|v| {
                !table.actions(self.stack.state(v.top), token.symbol).is_empty()
            });
            for candidate in viable {
                let better = best
                    .as_ref()
                    .is_none_or(|b| self.compare(&candidate, &b.version) == Ordering::Less);
                if better {
                    best = Some(Repair {
                        version: candidate,
                        recovery: Recovery::Missing(symbol),
                        consumed: false,
                    });
                }
            }
        }
        Ok(best)
    }

    /// Pop frames until the state below them has an action for the lookahead.
    fn pop_until_viable(&mut self, version: &Version, token: &Token) -> Option<Repair> {
        let language = self.language;
        let table = language.table();

        let mut top = version.top;
        let mut popped = Vec::new();
        loop {
            let (parent, subtree) = self.stack.pop_one(top)?;
            popped.push(subtree);
            top = parent;
            if !table.actions(self.stack.state(top), token.symbol).is_empty() {
                break;
            }
        }
        popped.reverse();

        let trees = popped.len();
        let bytes: usize = popped.iter().map(|s| s.size).sum();
        let cost = COST_POP + COST_PER_TREE * trees as u32 + bytes as u32;
        let state = self.stack.state(top);
        let error = Subtree::error(language, popped, cost, state);

        let mut repaired = version.clone();
        repaired.top = self.stack.push(top, state, error);
        Some(Repair {
            version: repaired,
            recovery: Recovery::Pop { trees },
            consumed: false,
        })
    }

    /// Put the lookahead into an ERROR node, joining an ERROR node right
    /// before it.
    fn skip(&mut self, version: &Version, token: &Token, scanner: &ScannerState) -> Repair {
        let language = self.language;
        let state = self.stack.state(version.top);
        let cost = COST_SKIP + token.size as u32;
        let leaf = Subtree::leaf(language, token, state);

        let frame = self.stack.frame(version.top);
        let previous = match (&frame.subtree, frame.parent) {
            (Some(previous), Some(parent)) if previous.flags.error && previous.flags.extra => {
                Some((previous.clone(), parent, frame.state))
            }
            _ => None,
        };

        let mut repaired = version.clone();
        repaired.scanner = scanner.clone();
        repaired.top = match previous {
            Some((previous, parent, state)) => {
                let joined = if !previous.is_leaf() {
                    previous.with_child(leaf, cost)
                } else if token.symbol == ERROR {
                    previous.with_error_token(token, cost)
                } else {
                    Subtree::error(language, vec![previous, leaf], cost, state)
                };
                self.stack.push(parent, state, joined)
            }
            None => {
                let skipped = if token.symbol == ERROR {
                    leaf.skipped(cost)
                } else {
                    Subtree::error(language, vec![leaf], cost, state)
                };
                self.stack.push(version.top, state, skipped)
            }
        };

        Repair {
            version: repaired,
            recovery: Recovery::Skip {
                bytes: token.padding + token.size,
            },
            consumed: true,
        }
    }

    /// Last resort at the end of input: the cheapest stack becomes the root.
    fn wrap(&mut self, failed: Vec<Version>) -> Subtree {
        let language = self.language;
        let len = self.text.len();
        let cheapest = failed.into_iter().min_by(|a, b| self.compare(a, b));
        let children = cheapest.map_or_else(Vec::new, |v| self.stack.subtrees(v.top));
        let cost = COST_POP + COST_PER_TREE * children.len() as u32;

        if !self.simulating {
            self.tracer.trace_recover(Recovery::Wrap, self.position);
        }
        Subtree::error_root(language, children, cost).with_span(len)
    }
}
