//! GLR parse loop.
//!
//! Each live version is a top frame index into the shared [`StackArena`] plus
//! the scanner state it carries. For every lookahead token a FIFO worklist
//! applies the table's actions to each version, forking on conflicts. Versions
//! that end up with identical stacks are merged before the next token. When
//! every version fails, [`Engine::recover`] picks the cheapest repair.

use std::cmp::Ordering;
use std::collections::VecDeque;

use lignum_table::{Action, LexModeId, ProductionId, StateId, SymbolId};

use crate::language::Language;
use crate::lex::{Lexer, Token};
use crate::scanner::ScannerState;
use crate::tree::{Subtree, Tree};

use super::error::CancelReason;
use super::options::{Fuel, ParseOptions};
use super::reuse::Reuse;
use super::stack::StackArena;
use super::trace::Tracer;

#[derive(Clone, Debug)]
pub(super) struct Version {
    pub top: u32,
    pub scanner: ScannerState,
    /// Offset of the last error recovery and how many happened there.
    pub recoveries: (usize, u8),
}

impl Version {
    fn new(top: u32) -> Self {
        Self {
            top,
            scanner: ScannerState::new(),
            recoveries: (0, 0),
        }
    }

    /// Recoveries already attempted at `position`.
    pub fn attempts_at(&self, position: usize) -> u8 {
        if self.recoveries.0 == position {
            self.recoveries.1
        } else {
            0
        }
    }
}

/// What the worklist feeds to the versions.
#[derive(Clone, Copy)]
pub(super) enum Lookahead<'t> {
    Token(&'t Token),
    /// Zero-width token inserted by error recovery.
    Missing(SymbolId),
}

impl Lookahead<'_> {
    fn symbol(&self) -> SymbolId {
        match self {
            Self::Token(token) => token.symbol,
            Self::Missing(symbol) => *symbol,
        }
    }

    fn subtree(&self, language: &Language, state: StateId) -> Subtree {
        match self {
            Self::Token(token) => Subtree::leaf(language, token, state),
            Self::Missing(symbol) => Subtree::missing(language, *symbol, state),
        }
    }
}

/// Versions sorted by what happened to them on one lookahead.
#[derive(Default)]
pub(super) struct Outcome {
    pub shifted: Vec<Version>,
    pub accepted: Vec<Version>,
    pub failed: Vec<Version>,
}

/// Result of recovering from a lookahead every version rejected.
pub(super) enum Recovered {
    /// The stack was repaired; feed the same lookahead again.
    Retry,
    /// The lookahead went into an ERROR node.
    Consumed,
    /// End of input: the whole stack became the root.
    Done(Subtree),
}

#[derive(Debug, Default)]
pub(super) struct Stats {
    pub tokens: usize,
    pub reused: usize,
    pub recoveries: usize,
}

pub(super) struct Engine<'a, T: Tracer> {
    pub language: &'a Language,
    pub text: &'a [u8],
    pub options: &'a ParseOptions,
    pub fuel: Fuel<'a>,
    pub tracer: &'a mut T,
    pub stack: StackArena,
    pub versions: Vec<Version>,
    pub reuse: Option<Reuse<'a>>,
    /// Offset where the next token's padding starts.
    pub position: usize,
    /// Lex modes the next tokens must be lexed with after a reused subtree.
    pub pending_modes: VecDeque<LexModeId>,
    /// Offset where a zero-width scanner token was skipped; the scanner is
    /// not consulted there again.
    pub no_scan_at: Option<usize>,
    /// Set while recovery tries candidate repairs; silences the tracer.
    pub simulating: bool,
    pub stats: Stats,
}

impl<'a, T: Tracer> Engine<'a, T> {
    pub fn new(
        language: &'a Language,
        text: &'a [u8],
        options: &'a ParseOptions,
        tracer: &'a mut T,
        reuse: Option<Reuse<'a>>,
    ) -> Self {
        Self {
            language,
            text,
            options,
            fuel: Fuel::new(options),
            tracer,
            stack: StackArena::new(),
            versions: Vec::new(),
            reuse,
            position: 0,
            pending_modes: VecDeque::new(),
            no_scan_at: None,
            simulating: false,
            stats: Stats::default(),
        }
    }

    /// Parse the whole text. Only cancellation can stop it.
    pub fn run(mut self) -> Result<Tree, CancelReason> {
        let language = self.language;
        let bottom = self.stack.bottom(language.table().start_state());
        self.versions.push(Version::new(bottom));

        let root = loop {
            self.fuel.tick()?;
            let mut scanner = self.versions[0].scanner.clone();
            let token = self.lex(&mut scanner);
            self.stats.tokens += 1;

            if self.try_reuse(&token)? {
                continue;
            }
            if let Some(root) = self.consume(&token, &scanner)? {
                break root;
            }
        };

        self.tracer.trace_accept(root.error_cost);
        tracing::debug!(
            grammar = language.name(),
            len = self.text.len(),
            tokens = self.stats.tokens,
            reused = self.stats.reused,
            recoveries = self.stats.recoveries,
            operations = self.fuel.operations(),
            "parsed"
        );
        Ok(Tree::new(language.clone(), self.text.to_vec(), root))
    }

    fn lex(&mut self, scanner: &mut ScannerState) -> Token {
        let modes: Vec<LexModeId> = match self.pending_modes.pop_front() {
            Some(mode) => vec![mode],
            None => {
                let mut modes: Vec<LexModeId> = self
                    .versions
                    .iter()
                    .map(|v| self.language.lex_mode_of(self.stack.state(v.top)))
                    .collect();
                modes.sort_unstable();
                modes.dedup();
                modes
            }
        };
        let use_scanner = self.no_scan_at != Some(self.position);
        let lexer = Lexer::new(self.language, self.text);
        let token = lexer.next_token(self.position, &modes, scanner, use_scanner);

        let start = self.position + token.padding;
        self.tracer.trace_lex(token.symbol, start, start + token.size);
        token
    }

    /// Feed one token until it is shifted, skipped or accepted. Returns the
    /// root once the parse is complete.
    fn consume(&mut self, token: &Token, scanner: &ScannerState) -> Result<Option<Subtree>, CancelReason> {
        loop {
            let versions = std::mem::take(&mut self.versions);
            let outcome = self.process(versions, Lookahead::Token(token), scanner)?;

            if !outcome.accepted.is_empty() {
                return Ok(Some(self.finish(outcome.accepted)));
            }
            if !outcome.shifted.is_empty() {
                self.versions = self.merge(outcome.shifted);
                self.position += token.padding + token.size;
                return Ok(None);
            }

            self.stats.recoveries += 1;
            match self.recover(outcome.failed, token, scanner)? {
                Recovered::Retry => {}
                Recovered::Consumed => return Ok(None),
                Recovered::Done(root) => return Ok(Some(root)),
            }
        }
    }

    /// Apply the actions for `lookahead` to every version.
    pub fn process(
        &mut self,
        versions: Vec<Version>,
        lookahead: Lookahead<'_>,
        scanner: &ScannerState,
    ) -> Result<Outcome, CancelReason> {
        let language = self.language;
        let table = language.table();
        let symbol = lookahead.symbol();
        let mut fragile = versions.len() > 1;
        // Guards against reduce cycles in malformed tables. Depends only on
        // the text so that full parses and reparses stop at the same point.
        let limit = (self.text.len() + 64) * 4 * self.options.max_versions;

        let mut queue: VecDeque<(usize, Version)> = versions.into_iter().enumerate().collect();
        let mut outcome = Outcome::default();
        let mut steps = 0;

        while let Some((id, version)) = queue.pop_front() {
            self.fuel.tick()?;
            steps += 1;
            if steps > limit {
                outcome.failed.push(version);
                continue;
            }

            let state = self.stack.state(version.top);
            let actions = table.actions(state, symbol);
            if actions.is_empty() {
                outcome.failed.push(version);
                continue;
            }
            if actions.len() > 1 {
                fragile = true;
                if !self.simulating {
                    self.tracer.trace_fork(id, symbol, actions.len());
                }
            }

            for &action in actions {
                let mut version = version.clone();
                match action {
                    Action::Shift(next) => {
                        let mut leaf = lookahead.subtree(language, state);
                        if fragile {
                            leaf = leaf.with_fragile();
                        }
                        version.top = self.stack.push(version.top, next, leaf);
                        if let Lookahead::Token(_) = lookahead {
                            version.scanner = scanner.clone();
                        }
                        if !self.simulating {
                            self.tracer.trace_shift(id, symbol, next);
                        }
                        outcome.shifted.push(version);
                    }
                    Action::ShiftExtra => {
                        let mut leaf = lookahead.subtree(language, state).with_extra();
                        if fragile {
                            leaf = leaf.with_fragile();
                        }
                        version.top = self.stack.push(version.top, state, leaf);
                        if let Lookahead::Token(_) = lookahead {
                            version.scanner = scanner.clone();
                        }
                        if !self.simulating {
                            self.tracer.trace_shift(id, symbol, state);
                        }
                        outcome.shifted.push(version);
                    }
                    Action::Reduce(production) => {
                        version.top = self.reduce(version.top, production, fragile, id);
                        queue.push_back((id, version));
                    }
                    Action::Accept => outcome.accepted.push(version),
                }
            }
        }
        Ok(outcome)
    }

    /// Pop the children of `production` and push the reduced node.
    pub fn reduce(&mut self, top: u32, production: ProductionId, fragile: bool, id: usize) -> u32 {
        let language = self.language;
        let table = language.table();
        let production = &table.data().productions[production as usize];
        let popped = self.stack.pop(top, production.child_count());

        let mut steps = production.steps.iter();
        let mut fields = Vec::with_capacity(popped.children.len());
        let children = popped
            .children
            .into_iter()
            .map(|child| {
                if child.flags.extra {
                    fields.push(None);
                    return child;
                }
                let Some(step) = steps.next() else {
                    fields.push(None);
                    return child;
                };
                fields.push(step.field);
                match step.alias {
                    Some(alias) => child.with_alias(language, alias),
                    None => child,
                }
            })
            .collect();

        let base_state = self.stack.state(popped.base);
        let node = Subtree::node(
            language,
            production.lhs,
            children,
            fields,
            production.dynamic_precedence,
            base_state,
            fragile,
        );
        let next = table.goto(base_state, production.lhs).unwrap_or(base_state);
        let mut top = self.stack.push(popped.base, next, node);
        for extra in popped.trailing {
            top = self.stack.push(top, next, extra);
        }

        if !self.simulating {
            self.tracer
                .trace_reduce(id, production.lhs, production.child_count(), next);
        }
        top
    }

    /// Pack versions with identical stacks and cap their number.
    fn merge(&mut self, versions: Vec<Version>) -> Vec<Version> {
        let mut kept: Vec<Version> = Vec::with_capacity(versions.len());
        let mut dropped = 0;
        for version in versions {
            let twin = kept.iter().position(|k| {
                k.scanner == version.scanner && self.stack.same_states(k.top, version.top)
            });
            match twin {
                Some(i) => {
                    if self.compare(&version, &kept[i]) == Ordering::Less {
                        kept[i] = version;
                    }
                    dropped += 1;
                }
                None => kept.push(version),
            }
        }

        let max = self.options.max_versions;
        if kept.len() > max {
            kept.sort_by(|a, b| self.compare(a, b));
            dropped += kept.len() - max;
            kept.truncate(max);
        }
        if dropped > 0 {
            self.tracer.trace_merge(kept.len(), dropped);
        }
        kept
    }

    /// Lower error cost first, then higher dynamic precedence.
    pub fn compare(&self, a: &Version, b: &Version) -> Ordering {
        let (fa, fb) = (self.stack.frame(a.top), self.stack.frame(b.top));
        fa.error_cost
            .cmp(&fb.error_cost)
            .then(fb.dynamic_precedence.cmp(&fa.dynamic_precedence))
    }

    /// Build the root from the best accepted version.
    fn finish(&mut self, accepted: Vec<Version>) -> Subtree {
        let language = self.language;
        let len = self.text.len();
        let Some(best) = accepted.into_iter().min_by(|a, b| self.compare(a, b)) else {
            return Subtree::error_root(language, Vec::new(), 0).with_span(len);
        };

        let subtrees = self.stack.subtrees(best.top);
        let Some(main) = subtrees.iter().position(|s| !s.flags.extra) else {
            return Subtree::error_root(language, subtrees, 0).with_span(len);
        };
        if subtrees.len() == 1 {
            return subtrees[main].with_span(len);
        }

        // Extras around the start symbol move into the root.
        let start = &subtrees[main];
        let mut children = Vec::with_capacity(subtrees.len() + start.children.len());
        let mut fields = Vec::with_capacity(children.capacity());
        for extra in &subtrees[..main] {
            children.push(extra.clone());
            fields.push(None);
        }
        // A start rule that matched nothing still has no children to splice.
        if language.info(start.symbol).is_terminal() {
            children.push(start.clone());
            fields.push(None);
        } else {
            children.extend(start.children.iter().cloned());
            fields.extend(start.fields.iter().copied());
        }
        for extra in &subtrees[main + 1..] {
            children.push(extra.clone());
            fields.push(None);
        }
        Subtree::node(
            language,
            start.symbol,
            children,
            fields,
            0,
            start.parse_state,
            start.flags.fragile,
        )
        .with_span(len)
    }
}
