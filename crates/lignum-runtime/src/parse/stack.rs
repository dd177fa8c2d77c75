//! Parse stack arena for GLR versions.
//!
//! Implements the cactus stack pattern: frames are append-only and point to
//! their parent, so versions forked from a common prefix share it. "Popping"
//! just moves a version's top pointer; frames are dropped with the arena at
//! the end of the parse.

use lignum_table::StateId;

use crate::tree::Subtree;

#[derive(Clone, Debug)]
pub(crate) struct Frame {
    pub state: StateId,
    /// Subtree pushed with this frame; `None` only for the bottom frame.
    pub subtree: Option<Subtree>,
    /// Parent frame index (for cactus stack).
    pub parent: Option<u32>,
    /// Text offset where this frame's subtree ends.
    pub position: usize,
    /// Error cost of every subtree from the bottom up to this frame.
    pub error_cost: u32,
    /// Dynamic precedence of every subtree from the bottom up to this frame.
    pub dynamic_precedence: i32,
}

/// Result of popping the children of a reduction.
pub(crate) struct Popped {
    /// Frame left on top after popping.
    pub base: u32,
    /// Children in text order, including interior extras.
    pub children: Vec<Subtree>,
    /// Extras that were on top of the stack; they stay outside the node.
    pub trailing: Vec<Subtree>,
}

#[derive(Debug, Default)]
pub(crate) struct StackArena {
    frames: Vec<Frame>,
}

impl StackArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a bottom frame, returns its index.
    pub fn bottom(&mut self, state: StateId) -> u32 {
        let index = self.frames.len() as u32;
        self.frames.push(Frame {
            state,
            subtree: None,
            parent: None,
            position: 0,
            error_cost: 0,
            dynamic_precedence: 0,
        });
        index
    }

    /// Push `subtree` on top of `parent`, returns the new frame's index.
    pub fn push(&mut self, parent: u32, state: StateId, subtree: Subtree) -> u32 {
        let index = self.frames.len() as u32;
        let below = &self.frames[parent as usize];
        let position = below.position + subtree.total_len();
        let error_cost = below.error_cost + subtree.error_cost;
        let dynamic_precedence = below.dynamic_precedence + subtree.dynamic_precedence;
        self.frames.push(Frame {
            state,
            subtree: Some(subtree),
            parent: Some(parent),
            position,
            error_cost,
            dynamic_precedence,
        });
        index
    }

    #[inline]
    pub fn frame(&self, index: u32) -> &Frame {
        &self.frames[index as usize]
    }

    #[inline]
    pub fn state(&self, index: u32) -> StateId {
        self.frames[index as usize].state
    }

    /// Pop `count` non-extra subtrees from `top`, keeping trailing extras apart.
    pub fn pop(&self, top: u32, count: usize) -> Popped {
        let mut index = top;
        let mut trailing = Vec::new();
        while let Some(subtree) = self.extra_at(index) {
            trailing.push(subtree.clone());
            index = self.parent_of(index);
        }
        trailing.reverse();

        let mut children = Vec::new();
        let mut remaining = count;
        while remaining > 0 {
            let frame = self.frame(index);
            let (Some(subtree), Some(parent)) = (&frame.subtree, frame.parent) else {
                break;
            };
            if !subtree.flags.extra {
                remaining -= 1;
            }
            children.push(subtree.clone());
            index = parent;
        }
        children.reverse();

        Popped {
            base: index,
            children,
            trailing,
        }
    }

    /// Pop exactly one frame of any kind.
    pub fn pop_one(&self, top: u32) -> Option<(u32, Subtree)> {
        let frame = self.frame(top);
        let subtree = frame.subtree.clone()?;
        Some((frame.parent?, subtree))
    }

    /// Subtrees from the bottom of the stack to `top`.
    pub fn subtrees(&self, top: u32) -> Vec<Subtree> {
        let mut out = Vec::new();
        let mut index = Some(top);
        while let Some(i) = index {
            let frame = self.frame(i);
            if let Some(subtree) = &frame.subtree {
                out.push(subtree.clone());
            }
            index = frame.parent;
        }
        out.reverse();
        out
    }

    /// Whether two stacks hold the same state sequence at the same offsets.
    pub fn same_states(&self, mut a: u32, mut b: u32) -> bool {
        loop {
            if a == b {
                return true;
            }
            let (fa, fb) = (self.frame(a), self.frame(b));
            if fa.state != fb.state || fa.position != fb.position {
                return false;
            }
            match (fa.parent, fb.parent) {
                (Some(pa), Some(pb)) => {
                    a = pa;
                    b = pb;
                }
                (None, None) => return true,
                _ => return false,
            }
        }
    }

    fn extra_at(&self, index: u32) -> Option<&Subtree> {
        self.frame(index).subtree.as_ref().filter(|s| s.flags.extra)
    }

    fn parent_of(&self, index: u32) -> u32 {
        self.frame(index).parent.unwrap_or(index)
    }
}
