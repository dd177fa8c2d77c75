//! Stateful tree walking.

use lignum_table::SymbolId;

use super::{Node, Point, Tree};

/// Cursor over the visible nodes below a starting node.
///
/// The cursor never moves above the node it was created from.
#[derive(Clone, Copy)]
pub struct TreeCursor<'tree> {
    tree: &'tree Tree,
    root: u32,
    current: u32,
    depth: usize,
}

impl<'tree> TreeCursor<'tree> {
    pub(crate) fn new(node: Node<'tree>) -> Self {
        let index = node.id() as u32;
        Self {
            tree: node.tree(),
            root: index,
            current: index,
            depth: 0,
        }
    }

    pub fn node(&self) -> Node<'tree> {
        Node::new(self.tree, self.current)
    }

    /// Field of the current node in its parent; `None` at the starting node.
    pub fn field_name(&self) -> Option<&'tree str> {
        if self.current == self.root {
            return None;
        }
        self.node().field_name()
    }

    /// Distance from the starting node.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn reset(&mut self, node: Node<'tree>) {
        *self = Self::new(node);
    }

    pub fn goto_first_child(&mut self) -> bool {
        let Some(child) = self.node().child(0) else {
            return false;
        };
        self.enter(child);
        true
    }

    pub fn goto_last_child(&mut self) -> bool {
        let node = self.node();
        let Some(child) = node.child_count().checked_sub(1).and_then(|i| node.child(i)) else {
            return false;
        };
        self.enter(child);
        true
    }

    pub fn goto_parent(&mut self) -> bool {
        if self.current == self.root {
            return false;
        }
        let Some(parent) = self.node().parent() else {
            return false;
        };
        self.current = parent.id() as u32;
        self.depth -= 1;
        true
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        if self.current == self.root {
            return false;
        }
        let Some(sibling) = self.node().next_sibling() else {
            return false;
        };
        self.current = sibling.id() as u32;
        true
    }

    pub fn goto_previous_sibling(&mut self) -> bool {
        if self.current == self.root {
            return false;
        }
        let Some(sibling) = self.node().prev_sibling() else {
            return false;
        };
        self.current = sibling.id() as u32;
        true
    }

    /// Move to the first child that ends after `byte`, returning its index.
    pub fn goto_first_child_for_byte(&mut self, byte: usize) -> Option<usize> {
        let (index, child) = self
            .node()
            .children()
            .enumerate()
            .find(|(_, child)| child.end_byte() > byte)?;
        self.enter(child);
        Some(index)
    }

    /// Move to the first child that ends after `point`, returning its index.
    pub fn goto_first_child_for_point(&mut self, point: Point) -> Option<usize> {
        let (index, child) = self
            .node()
            .children()
            .enumerate()
            .find(|(_, child)| child.end_position() > point)?;
        self.enter(child);
        Some(index)
    }

    /// Move in pre-order to the next node of kind `symbol` below the
    /// starting node.
    pub fn goto_next_of_kind(&mut self, symbol: SymbolId) -> bool {
        let saved = *self;
        loop {
            if !self.goto_first_child() {
                loop {
                    if self.goto_next_sibling() {
                        break;
                    }
                    if !self.goto_parent() {
                        *self = saved;
                        return false;
                    }
                }
            }
            if self.node().kind_id() == symbol {
                return true;
            }
        }
    }

    fn enter(&mut self, child: Node<'tree>) {
        self.current = child.id() as u32;
        self.depth += 1;
    }
}

impl std::fmt::Debug for TreeCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeCursor")
            .field("node", &self.node())
            .field("depth", &self.depth)
            .finish()
    }
}
