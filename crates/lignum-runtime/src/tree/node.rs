//! Read-only node handles.

use std::fmt::Write as _;
use std::ops::Range;
use std::str::Utf8Error;

use lignum_table::{ERROR, SymbolId};

use super::{NodeData, Tree, TreeCursor};

/// Zero-based row and byte column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// A visible node of a [`Tree`]. Cheap to copy.
#[derive(Clone, Copy)]
pub struct Node<'tree> {
    tree: &'tree Tree,
    index: u32,
}

impl<'tree> Node<'tree> {
    pub(crate) fn new(tree: &'tree Tree, index: u32) -> Self {
        Self { tree, index }
    }

    fn data(&self) -> &'tree NodeData {
        self.tree.data(self.index)
    }

    fn at(&self, index: u32) -> Node<'tree> {
        Node::new(self.tree, index)
    }

    /// Index of the node in its tree's arena.
    pub fn id(&self) -> usize {
        self.index as usize
    }

    pub fn tree(&self) -> &'tree Tree {
        self.tree
    }

    /// Node kind, after aliasing.
    pub fn kind(&self) -> &'tree str {
        self.tree.language().symbol_name(self.data().symbol).unwrap_or("")
    }

    pub fn kind_id(&self) -> SymbolId {
        self.data().symbol
    }

    /// Kind of the grammar rule that produced the node, before aliasing.
    pub fn grammar_kind(&self) -> &'tree str {
        self.tree
            .language()
            .symbol_name(self.data().grammar_symbol)
            .unwrap_or("")
    }

    pub fn grammar_id(&self) -> SymbolId {
        self.data().grammar_symbol
    }

    pub fn is_named(&self) -> bool {
        self.data().flags.named
    }

    pub fn is_extra(&self) -> bool {
        self.data().flags.extra
    }

    pub fn is_error(&self) -> bool {
        self.data().symbol == ERROR
    }

    pub fn is_missing(&self) -> bool {
        self.data().flags.missing
    }

    /// Whether the node is or contains an ERROR or MISSING node.
    pub fn has_error(&self) -> bool {
        self.data().flags.has_error
    }

    pub fn start_byte(&self) -> usize {
        self.data().start
    }

    pub fn end_byte(&self) -> usize {
        self.data().end
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.data().start..self.data().end
    }

    pub fn start_position(&self) -> Point {
        self.point(self.start_byte())
    }

    pub fn end_position(&self) -> Point {
        self.point(self.end_byte())
    }

    fn point(&self, byte: usize) -> Point {
        let line_starts = self.tree.line_starts();
        let row = line_starts.partition_point(|&start| start <= byte).saturating_sub(1);
        Point::new(row, byte - line_starts[row])
    }

    pub fn child_count(&self) -> usize {
        self.data().child_count as usize
    }

    pub fn child(&self, i: usize) -> Option<Node<'tree>> {
        let data = self.data();
        (i < data.child_count as usize).then(|| self.at(data.first_child + i as u32))
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'tree>> + 'tree {
        let (tree, data) = (self.tree, self.data());
        (data.first_child..data.first_child + data.child_count).map(move |i| Node::new(tree, i))
    }

    pub fn named_children(&self) -> impl Iterator<Item = Node<'tree>> + 'tree {
        self.children().filter(|n| n.is_named())
    }

    pub fn named_child_count(&self) -> usize {
        self.named_children().count()
    }

    pub fn named_child(&self, i: usize) -> Option<Node<'tree>> {
        self.named_children().nth(i)
    }

    pub fn parent(&self) -> Option<Node<'tree>> {
        self.data().parent.map(|p| self.at(p))
    }

    pub fn next_sibling(&self) -> Option<Node<'tree>> {
        let parent = self.parent()?;
        parent.child(self.data().index as usize + 1)
    }

    pub fn prev_sibling(&self) -> Option<Node<'tree>> {
        let parent = self.parent()?;
        let index = (self.data().index as usize).checked_sub(1)?;
        parent.child(index)
    }

    pub fn next_named_sibling(&self) -> Option<Node<'tree>> {
        let mut node = self.next_sibling()?;
        while !node.is_named() {
            node = node.next_sibling()?;
        }
        Some(node)
    }

    pub fn prev_named_sibling(&self) -> Option<Node<'tree>> {
        let mut node = self.prev_sibling()?;
        while !node.is_named() {
            node = node.prev_sibling()?;
        }
        Some(node)
    }

    /// Field name of this node in its parent.
    pub fn field_name(&self) -> Option<&'tree str> {
        let field = self.data().field?;
        self.tree.language().field_name(field)
    }

    pub fn field_name_for_child(&self, i: usize) -> Option<&'tree str> {
        self.child(i)?.field_name()
    }

    pub fn child_by_field_name(&self, name: &str) -> Option<Node<'tree>> {
        self.children_by_field_name(name).next()
    }

    pub fn children_by_field_name(&self, name: &str) -> impl Iterator<Item = Node<'tree>> + 'tree {
        let field = self.tree.language().field_id_for_name(name);
        self.children()
            .filter(move |child| field.is_some() && child.data().field == field)
    }

    /// Smallest node that contains `start..end`.
    pub fn descendant_for_byte_range(&self, start: usize, end: usize) -> Option<Node<'tree>> {
        if start < self.start_byte() || end > self.end_byte() {
            return None;
        }
        let mut node = *self;
        'descend: loop {
            for child in node.children() {
                if child.start_byte() <= start && end <= child.end_byte() {
                    // A zero-width child only contains an empty range at its
                    // own position; prefer a wider sibling.
                    if child.start_byte() == child.end_byte() && start < end {
                        continue;
                    }
                    node = child;
                    continue 'descend;
                }
            }
            return Some(node);
        }
    }

    /// Source bytes covered by the node.
    pub fn text(&self) -> &'tree [u8] {
        &self.tree.source()[self.byte_range()]
    }

    pub fn utf8_text(&self) -> Result<&'tree str, Utf8Error> {
        std::str::from_utf8(self.text())
    }

    pub fn walk(&self) -> TreeCursor<'tree> {
        TreeCursor::new(*self)
    }

    /// S-expression of the named nodes, with `field:` prefixes. Missing
    /// nodes render as `(MISSING kind)`, anonymous ones as `(MISSING "x")`.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        let mut cursor = self.walk();
        let mut first = true;
        let mut open: Vec<usize> = Vec::new();

        loop {
            let node = cursor.node();
            let shown = node.is_named() || node.is_missing() || cursor.depth() == 0;
            if shown {
                if !first {
                    out.push(' ');
                }
                first = false;
                if let Some(field) = cursor.field_name() {
                    let _ = write!(out, "{field}: ");
                }
                if node.is_missing() {
                    if node.is_named() {
                        let _ = write!(out, "(MISSING {}", node.kind());
                    } else {
                        let _ = write!(out, "(MISSING {:?}", node.kind());
                    }
                } else {
                    let _ = write!(out, "({}", node.kind());
                }
            }

            if cursor.goto_first_child() {
                open.push(usize::from(shown));
                continue;
            }
            if shown {
                out.push(')');
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return out;
                }
                if open.pop() == Some(1) {
                    out.push(')');
                }
            }
        }
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.index == other.index
    }
}

impl Eq for Node<'_> {}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{Node {} {:?}}}", self.kind(), self.byte_range())
    }
}
