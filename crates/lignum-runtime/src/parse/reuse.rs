//! Subtree reuse during incremental reparse.
//!
//! A [`ReuseCursor`] walks the previous tree's subtrees in text order, in old
//! coordinates. At each token boundary of the new parse the engine asks for
//! the subtrees that start at the corresponding old offset and pushes the
//! largest one that the full parse would have built identically:
//!
//! - it was built while the parser had a single version, without errors and
//!   without the external scanner,
//! - it was pushed in the current parse state,
//! - no edit touches the bytes the lexer examined for it and for the tokens
//!   up to the next non-extra token after it.
//!
//! The tokens after a reused subtree are lexed with the lex modes recorded on
//! the old leaves, so lexing sees exactly what a full parse would.

use std::collections::VecDeque;

use lignum_table::{Action, LexModeId};

use crate::lex::{NO_LEX_MODE, Token};
use crate::tree::{Subtree, TreeEdit};

use super::engine::Engine;
use super::error::CancelReason;
use super::trace::Tracer;

#[derive(Clone, Debug)]
struct Entry {
    subtree: Subtree,
    /// Old offset where the subtree's padding starts.
    start: usize,
    /// Position among the parent's children.
    index: usize,
}

/// Pre-order position in the previous tree.
#[derive(Clone, Debug)]
pub(crate) struct ReuseCursor {
    stack: Vec<Entry>,
}

impl ReuseCursor {
    pub fn new(root: &Subtree) -> Self {
        Self {
            stack: vec![Entry {
                subtree: root.clone(),
                start: 0,
                index: 0,
            }],
        }
    }

    fn current(&self) -> Option<&Entry> {
        self.stack.last()
    }

    fn descend(&mut self) -> bool {
        let Some(entry) = self.stack.last() else {
            return false;
        };
        let Some(child) = entry.subtree.children.first() else {
            return false;
        };
        let child = Entry {
            subtree: child.clone(),
            start: entry.start,
            index: 0,
        };
        self.stack.push(child);
        true
    }

    /// Move past the current subtree to the next one in text order.
    fn advance(&mut self) -> bool {
        while let Some(entry) = self.stack.pop() {
            let Some(parent) = self.stack.last() else {
                return false;
            };
            if let Some(sibling) = parent.subtree.children.get(entry.index + 1) {
                let sibling = Entry {
                    subtree: sibling.clone(),
                    start: entry.start + entry.subtree.total_len(),
                    index: entry.index + 1,
                };
                self.stack.push(sibling);
                return true;
            }
        }
        false
    }

    /// Move to the outermost subtree that starts at or after `offset` and
    /// covers text.
    fn seek(&mut self, offset: usize) {
        while let Some(entry) = self.current() {
            let end = entry.start + entry.subtree.total_len();
            if end <= offset {
                if !self.advance() {
                    return;
                }
            } else if entry.start >= offset {
                return;
            } else if !self.descend() && !self.advance() {
                return;
            }
        }
    }

    /// Subtrees starting at `offset`, outermost first, with their depth.
    fn candidates(&self, offset: usize) -> Vec<(usize, Subtree)> {
        let Some(entry) = self.current() else {
            return Vec::new();
        };
        if entry.start != offset {
            return Vec::new();
        }
        let mut depth = self.stack.len() - 1;
        let mut out = vec![(depth, entry.subtree.clone())];
        let mut subtree = &entry.subtree;
        while let Some(first) = subtree.children.first() {
            depth += 1;
            out.push((depth, first.clone()));
            subtree = first;
        }
        out
    }

    /// Move past the candidate at `depth`.
    fn skip_candidate(&mut self, depth: usize) {
        while self.stack.len() <= depth {
            if !self.descend() {
                break;
            }
        }
        self.advance();
    }

    /// Whether an ERROR node encloses the current subtree.
    fn inside_error(&self) -> bool {
        self.stack.iter().any(|entry| entry.subtree.flags.error)
    }
}

/// Previous tree and edits of a reparse.
pub(crate) struct Reuse<'a> {
    pub edit: &'a TreeEdit,
    pub cursor: ReuseCursor,
}

impl<'a> Reuse<'a> {
    pub fn new(edit: &'a TreeEdit) -> Self {
        Self {
            edit,
            cursor: ReuseCursor::new(edit.tree().root()),
        }
    }
}

/// Old-text facts about what follows a reusable subtree.
struct Follow {
    /// Old offset up to which the lexer looked.
    lookahead_end: usize,
    /// Lex modes of the tokens up to the next non-extra one.
    modes: VecDeque<LexModeId>,
}

impl<T: Tracer> Engine<'_, T> {
    /// Push a subtree of the previous tree instead of parsing its text.
    /// Returns whether one was reused; `token` is dropped in that case.
    pub(super) fn try_reuse(&mut self, token: &Token) -> Result<bool, CancelReason> {
        if self.versions.len() != 1 || token.is_end() || token.scanned {
            return Ok(false);
        }
        let Some(mut reuse) = self.reuse.take() else {
            return Ok(false);
        };
        let reused = self.reuse_from(&mut reuse, token);
        self.reuse = Some(reuse);
        reused
    }

    fn reuse_from(&mut self, reuse: &mut Reuse<'_>, token: &Token) -> Result<bool, CancelReason> {
        let language = self.language;
        let table = language.table();
        let Some(old_offset) = reuse.edit.unmap_offset(self.position) else {
            return Ok(false);
        };

        // Reductions the lookahead forces happen the same way in a full parse.
        loop {
            let top = self.versions[0].top;
            match table.actions(self.stack.state(top), token.symbol) {
                [Action::Reduce(production)] => {
                    self.fuel.tick()?;
                    self.versions[0].top = self.reduce(top, *production, false, 0);
                }
                [Action::Shift(_)] => break,
                _ => return Ok(false),
            }
        }
        if table.is_extra(token.symbol) {
            return Ok(false);
        }

        reuse.cursor.seek(old_offset);
        let top = self.versions[0].top;
        let state = self.stack.state(top);

        for (depth, candidate) in reuse.cursor.candidates(old_offset) {
            if candidate.is_leaf()
                || candidate.total_len() == 0
                || candidate.parse_state != state
                || candidate.flags.fragile
                || candidate.flags.has_error
                || candidate.flags.depends_on_scanner
                || candidate.flags.extra
            {
                continue;
            }
            let Some(next) = table.goto(state, candidate.grammar_symbol) else {
                continue;
            };
            let Some(first) = candidate.first_token() else {
                continue;
            };
            if first.grammar_symbol != token.symbol
                || first.padding != token.padding
                || first.size != token.size
            {
                continue;
            }

            let mut after = reuse.cursor.clone();
            after.skip_candidate(depth);
            let Some(follow) = self.follow(&after, reuse.edit.tree().len()) else {
                continue;
            };
            let lookahead_end = follow.lookahead_end.max(old_offset + candidate.lookahead);
            if reuse.edit.is_range_damaged(old_offset, lookahead_end) {
                continue;
            }

            let start = self.position + candidate.padding;
            let subtree = candidate.with_alias(language, candidate.grammar_symbol);
            self.versions[0].top = self.stack.push(top, next, subtree);
            self.position += candidate.total_len();
            self.pending_modes = follow.modes;
            reuse.cursor = after;
            self.stats.reused += 1;
            self.tracer
                .trace_reuse(candidate.symbol, start, start + candidate.size);
            return Ok(true);
        }
        Ok(false)
    }

    /// Walk the old leaves after a candidate up to the first non-extra token.
    /// `None` when they cannot be replayed.
    fn follow(&self, after: &ReuseCursor, old_len: usize) -> Option<Follow> {
        let mut cursor = after.clone();
        let mut follow = Follow {
            lookahead_end: 0,
            modes: VecDeque::new(),
        };
        loop {
            let Some(entry) = cursor.current() else {
                // The old parse saw the end of input here.
                if self.language.has_external_scanner() {
                    return None;
                }
                follow.lookahead_end = old_len + 1;
                return Some(follow);
            };
            if entry.subtree.total_len() == 0 {
                cursor.advance();
                continue;
            }
            if !entry.subtree.is_leaf() {
                cursor.descend();
                continue;
            }

            let leaf = &entry.subtree;
            if leaf.lex_mode == NO_LEX_MODE || leaf.flags.error || cursor.inside_error() {
                return None;
            }
            follow.modes.push_back(leaf.lex_mode);
            follow.lookahead_end = follow.lookahead_end.max(entry.start + leaf.lookahead);
            if !leaf.flags.extra {
                return Some(follow);
            }
            cursor.advance();
        }
    }
}
