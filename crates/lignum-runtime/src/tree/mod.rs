//! Syntax trees.
//!
//! A [`Tree`] owns its root [`Subtree`], a snapshot of the source and a node
//! arena. The arena lays out the visible nodes breadth-first: children of a
//! node are contiguous, and parent links are indices, so trees sharing
//! subtrees never share or mutate arenas.

mod cursor;
mod edit;
mod node;
mod subtree;

#[cfg(test)]
mod node_tests;

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::ops::Range;
use std::sync::Arc;

use lignum_table::{FieldId, SymbolId};

use crate::language::Language;
use crate::parse::EditError;

pub use cursor::TreeCursor;
pub use edit::{InputEdit, TreeEdit};
pub use node::{Node, Point};
pub(crate) use subtree::{COST_PER_TREE, COST_POP, COST_SKIP, Flags, Subtree, SubtreeData};

#[derive(Clone, Debug)]
pub(crate) struct NodeData {
    pub symbol: SymbolId,
    pub grammar_symbol: SymbolId,
    pub start: usize,
    pub end: usize,
    pub parent: Option<u32>,
    pub first_child: u32,
    pub child_count: u32,
    /// Position among the parent's children.
    pub index: u32,
    pub field: Option<FieldId>,
    pub flags: Flags,
}

struct TreeInner {
    language: Language,
    source: Vec<u8>,
    root: Subtree,
    nodes: Vec<NodeData>,
    line_starts: Vec<usize>,
}

/// Immutable syntax tree. Cloning is cheap.
#[derive(Clone)]
pub struct Tree {
    inner: Arc<TreeInner>,
}

impl Tree {
    pub(crate) fn new(language: Language, source: Vec<u8>, root: Subtree) -> Self {
        let nodes = build_arena(&root);
        let line_starts = std::iter::once(0)
            .chain(
                source
                    .iter()
                    .enumerate()
                    .filter(|&(_, &b)| b == b'\n')
                    .map(|(i, _)| i + 1),
            )
            .collect();
        Self {
            inner: Arc::new(TreeInner {
                language,
                source,
                root,
                nodes,
                line_starts,
            }),
        }
    }

    pub fn root_node(&self) -> Node<'_> {
        self.node_at(0)
    }

    pub fn walk(&self) -> TreeCursor<'_> {
        TreeCursor::new(self.root_node())
    }

    pub fn language(&self) -> &Language {
        &self.inner.language
    }

    /// Snapshot of the parsed text.
    pub fn source(&self) -> &[u8] {
        &self.inner.source
    }

    pub fn len(&self) -> usize {
        self.inner.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.source.is_empty()
    }

    /// Number of visible nodes.
    pub fn node_count(&self) -> usize {
        self.inner.nodes.len()
    }

    /// Total error cost of the chosen parse; zero for error-free text.
    pub fn error_cost(&self) -> u32 {
        self.inner.root.error_cost
    }

    /// Prepare an incremental reparse after `edits`.
    pub fn edit(&self, edits: &[InputEdit]) -> Result<TreeEdit, EditError> {
        TreeEdit::new(self, edits)
    }

    /// Ranges whose syntactic structure differs between `self` and `other`,
    /// in the coordinates of `other`.
    ///
    /// Siblings are aligned by their common prefix (same start) and common
    /// suffix (same distance from the end of the text). A single pair of
    /// unaligned siblings of the same kind is compared recursively; any other
    /// unaligned run is reported whole.
    pub fn changed_ranges(&self, other: &Tree) -> Vec<Range<usize>> {
        let (old_len, new_len) = (self.len(), other.len());
        let mut ranges: Vec<Range<usize>> = Vec::new();
        let mut pending = vec![(self.root_node(), other.root_node())];

        while let Some((old, new)) = pending.pop() {
            if old.kind_id() != new.kind_id() || old.is_missing() != new.is_missing() {
                ranges.push(new.byte_range());
                continue;
            }
            let old_children: Vec<Node<'_>> = old.children().collect();
            let new_children: Vec<Node<'_>> = new.children().collect();
            if old_children.is_empty() && new_children.is_empty() {
                if old.byte_range().len() != new.byte_range().len() {
                    ranges.push(new.byte_range());
                }
                continue;
            }

            let prefix = old_children
                .iter()
                .zip(&new_children)
                .take_while(|(a, b)| a.start_byte() == b.start_byte() && same_shape(**a, **b))
                .count();
            let suffix = old_children[prefix..]
                .iter()
                .rev()
                .zip(new_children[prefix..].iter().rev())
                .take_while(|(a, b)| old_len - a.end_byte() == new_len - b.end_byte() && same_shape(**a, **b))
                .count();
            let removed = &old_children[prefix..old_children.len() - suffix];
            let inserted = &new_children[prefix..new_children.len() - suffix];

            match (removed, inserted) {
                ([], []) => {}
                ([a], [b]) if a.kind_id() == b.kind_id() => pending.push((*a, *b)),
                _ => {
                    let start = match inserted.first() {
                        Some(first) => first.start_byte(),
                        None => prefix
                            .checked_sub(1)
                            .map_or(new.start_byte(), |i| new_children[i].end_byte()),
                    };
                    let end = inserted.last().map_or(start, |last| last.end_byte());
                    ranges.push(start..end);
                }
            }
        }

        ranges.sort_by_key(|r| (r.start, r.end));
        let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
                _ => merged.push(range),
            }
        }
        merged
    }

    /// Debug listing of every node with its kind and range.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut cursor = self.walk();
        loop {
            let node = cursor.node();
            let indent = "  ".repeat(cursor.depth());
            let _ = write!(out, "{indent}");
            if let Some(field) = cursor.field_name() {
                let _ = write!(out, "{field}: ");
            }
            if node.is_missing() {
                out.push_str("MISSING ");
            }
            if node.is_named() {
                out.push_str(node.kind());
            } else {
                let _ = write!(out, "{:?}", node.kind());
            }
            let range = node.byte_range();
            let _ = write!(out, " [{}..{})", range.start, range.end);
            if node.is_extra() && !node.is_error() {
                out.push_str(" extra");
            }
            out.push('\n');

            if !cursor.goto_first_child() {
                while !cursor.goto_next_sibling() {
                    if !cursor.goto_parent() {
                        return out;
                    }
                }
            }
        }
    }

    /// S-expression of the named structure, see [`Node::to_sexp`].
    pub fn to_sexp(&self) -> String {
        self.root_node().to_sexp()
    }

    pub(crate) fn root(&self) -> &Subtree {
        &self.inner.root
    }

    pub(crate) fn node_at(&self, index: usize) -> Node<'_> {
        Node::new(self, index as u32)
    }

    pub(crate) fn data(&self, index: u32) -> &NodeData {
        &self.inner.nodes[index as usize]
    }

    pub(crate) fn line_starts(&self) -> &[usize] {
        &self.inner.line_starts
    }
}

/// Same kinds and lengths at the same relative offsets, all the way down.
fn same_shape(a: Node<'_>, b: Node<'_>) -> bool {
    let mut pending = vec![(a, b)];
    while let Some((a, b)) = pending.pop() {
        if a.kind_id() != b.kind_id()
            || a.is_missing() != b.is_missing()
            || a.byte_range().len() != b.byte_range().len()
            || a.child_count() != b.child_count()
        {
            return false;
        }
        for (x, y) in a.children().zip(b.children()) {
            if x.start_byte() + b.start_byte() != y.start_byte() + a.start_byte() {
                return false;
            }
            pending.push((x, y));
        }
    }
    true
}

impl std::fmt::Debug for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("language", &self.language().name())
            .field("len", &self.len())
            .field("nodes", &self.node_count())
            .finish()
    }
}

/// Lay out the visible nodes breadth-first. Hidden nodes are spliced into
/// their parent; a field on a hidden node is inherited by its children.
fn build_arena(root: &Subtree) -> Vec<NodeData> {
    let mut nodes = vec![NodeData {
        symbol: root.symbol,
        grammar_symbol: root.grammar_symbol,
        start: root.padding,
        end: root.total_len(),
        parent: None,
        first_child: 0,
        child_count: 0,
        index: 0,
        field: None,
        flags: root.flags,
    }];
    let mut queue: VecDeque<(u32, &Subtree, usize)> = VecDeque::from([(0, root, 0)]);
    let mut visible = Vec::new();

    while let Some((index, subtree, padded_start)) = queue.pop_front() {
        visible.clear();
        collect_visible(subtree, padded_start, &mut visible);

        let first_child = nodes.len() as u32;
        for (i, &(child, child_start, field)) in visible.iter().enumerate() {
            let start = child_start + child.padding;
            nodes.push(NodeData {
                symbol: child.symbol,
                grammar_symbol: child.grammar_symbol,
                start,
                end: start + child.size,
                parent: Some(index),
                first_child: 0,
                child_count: 0,
                index: i as u32,
                field,
                flags: child.flags,
            });
            queue.push_back((first_child + i as u32, child, child_start));
        }
        let data = &mut nodes[index as usize];
        data.first_child = first_child;
        data.child_count = visible.len() as u32;
    }
    nodes
}

/// Visible descendants of `subtree` reached through hidden nodes, with the
/// offset where their padding starts and their effective field.
fn collect_visible<'a>(
    subtree: &'a SubtreeData,
    padded_start: usize,
    out: &mut Vec<(&'a Subtree, usize, Option<FieldId>)>,
) {
    // Hidden repetition helpers nest as deep as the list is long, so walk
    // with an explicit stack.
    let mut stack: Vec<(&'a SubtreeData, usize, usize, Option<FieldId>)> =
        vec![(subtree, 0, padded_start, None)];
    while let Some(top) = stack.last_mut() {
        let (parent, child_index, offset, inherited) = *top;
        let Some(child) = parent.children.get(child_index) else {
            stack.pop();
            continue;
        };
        top.1 += 1;
        top.2 += child.total_len();

        let field = parent.fields.get(child_index).copied().flatten().or(inherited);
        if child.flags.visible {
            out.push((child, offset, field));
        } else if !child.is_leaf() {
            stack.push((&**child, 0, offset, field));
        }
    }
}
