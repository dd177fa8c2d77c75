//! Text edits and damage tracking.
//!
//! A batch of edits is expressed in the coordinates of the old text, sorted
//! and non-overlapping. Each edit replaces `start_byte..old_end_byte` with
//! `new_end_byte - start_byte` bytes of new text.

use std::ops::Range;

use crate::parse::EditError;

use super::{Node, Tree};

/// One textual change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InputEdit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
}

impl InputEdit {
    pub fn new(start_byte: usize, old_end_byte: usize, new_end_byte: usize) -> Self {
        Self {
            start_byte,
            old_end_byte,
            new_end_byte,
        }
    }

    /// Insert `len` bytes at `at`.
    pub fn insert(at: usize, len: usize) -> Self {
        Self::new(at, at, at + len)
    }

    /// Delete `range`.
    pub fn delete(range: Range<usize>) -> Self {
        Self::new(range.start, range.end, range.start)
    }

    /// Replace `range` with `len` bytes.
    pub fn replace(range: Range<usize>, len: usize) -> Self {
        Self::new(range.start, range.end, range.start + len)
    }

    pub fn inserted_len(&self) -> usize {
        self.new_end_byte - self.start_byte
    }

    pub fn removed_len(&self) -> usize {
        self.old_end_byte - self.start_byte
    }

    fn delta(&self) -> isize {
        self.inserted_len() as isize - self.removed_len() as isize
    }
}

/// Validated edit batch against a tree, ready for reparsing.
#[derive(Clone, Debug)]
pub struct TreeEdit {
    tree: Tree,
    edits: Vec<InputEdit>,
    new_len: usize,
    /// Per arena node: whether an edit touches its range.
    damaged: Vec<bool>,
}

impl TreeEdit {
    pub(crate) fn new(tree: &Tree, edits: &[InputEdit]) -> Result<Self, EditError> {
        let old_len = tree.len();
        let mut delta: isize = 0;
        for (index, edit) in edits.iter().enumerate() {
            if edit.old_end_byte < edit.start_byte || edit.new_end_byte < edit.start_byte {
                return Err(EditError::Malformed { index });
            }
            if edit.old_end_byte > old_len {
                return Err(EditError::OutOfBounds {
                    index,
                    end: edit.old_end_byte,
                    len: old_len,
                });
            }
            if let Some(previous) = index.checked_sub(1).map(|i| edits[i]) {
                if edit.start_byte < previous.start_byte {
                    return Err(EditError::OutOfOrder { index });
                }
                if edit.start_byte < previous.old_end_byte {
                    return Err(EditError::Overlapping { index });
                }
            }
            delta += edit.delta();
        }

        let mut this = Self {
            tree: tree.clone(),
            edits: edits.to_vec(),
            new_len: (old_len as isize + delta) as usize,
            damaged: Vec::new(),
        };
        this.damaged = (0..tree.node_count())
            .map(|index| {
                let range = tree.node_at(index).byte_range();
                this.edits
                    .iter()
                    .any(|e| e.start_byte <= range.end && e.old_end_byte >= range.start)
            })
            .collect();
        Ok(this)
    }

    /// The tree the edits apply to.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn edits(&self) -> &[InputEdit] {
        &self.edits
    }

    /// Length the new text must have.
    pub fn new_len(&self) -> usize {
        self.new_len
    }

    /// Whether an edit touches `node`, a node of [`TreeEdit::tree`].
    pub fn is_damaged(&self, node: Node<'_>) -> bool {
        self.damaged.get(node.id()).copied().unwrap_or(false)
    }

    pub fn damaged_count(&self) -> usize {
        self.damaged.iter().filter(|&&d| d).count()
    }

    /// Map an old offset into the new text. Offsets strictly inside a
    /// replaced range have no counterpart.
    pub fn map_offset(&self, old: usize) -> Option<usize> {
        let mut shift: isize = 0;
        for edit in &self.edits {
            if old <= edit.start_byte {
                break;
            }
            if old < edit.old_end_byte {
                return None;
            }
            shift += edit.delta();
        }
        Some((old as isize + shift) as usize)
    }

    /// Map a new offset back into the old text. Offsets inside inserted text
    /// have no counterpart; the end of an edit maps to its old end.
    pub(crate) fn unmap_offset(&self, new: usize) -> Option<usize> {
        let mut shift: isize = 0;
        for edit in &self.edits {
            let new_start = (edit.start_byte as isize + shift) as usize;
            let new_end = (edit.new_end_byte as isize + shift) as usize;
            if new < new_start {
                break;
            }
            if new < new_end {
                return None;
            }
            if new == new_end {
                return Some(edit.old_end_byte);
            }
            shift += edit.delta();
        }
        Some((new as isize - shift) as usize)
    }

    /// Whether an edit could change what was read from `start..end` of the
    /// old text. Edits touching `start` count; edits at `end` do not.
    pub(crate) fn is_range_damaged(&self, start: usize, end: usize) -> bool {
        self.edits
            .iter()
            .any(|e| e.start_byte < end && e.old_end_byte >= start)
    }

    /// Ranges of the new text that were inserted or replaced.
    pub fn changed_ranges(&self) -> Vec<Range<usize>> {
        let mut shift: isize = 0;
        let mut out = Vec::with_capacity(self.edits.len());
        for edit in &self.edits {
            let start = (edit.start_byte as isize + shift) as usize;
            let end = (edit.new_end_byte as isize + shift) as usize;
            out.push(start..end);
            shift += edit.delta();
        }
        out
    }
}
