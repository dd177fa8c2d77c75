use lignum_table::SymbolId;

use crate::Language;
use crate::lex::{NO_LEX_MODE, Token};
use crate::test_utils::parens;
use crate::tree::Subtree;

use super::stack::StackArena;

const NUMBER: SymbolId = 2;
const OPEN: SymbolId = 3;

fn leaf(language: &Language, symbol: SymbolId, padding: usize, size: usize) -> Subtree {
    let token = Token {
        symbol,
        padding,
        size,
        lookahead: padding + size,
        lex_mode: NO_LEX_MODE,
        external: false,
        scanned: false,
    };
    Subtree::leaf(language, &token, 0)
}

#[test]
fn push_accumulates_position() {
    let language = parens();
    let mut stack = StackArena::new();
    let bottom = stack.bottom(0);

    let a = stack.push(bottom, 1, leaf(&language, OPEN, 2, 1));
    let b = stack.push(a, 3, leaf(&language, NUMBER, 0, 2));

    assert_eq!(stack.frame(a).position, 3);
    assert_eq!(stack.frame(b).position, 5);
    assert_eq!(stack.state(b), 3);
    assert_eq!(stack.frame(b).parent, Some(a));
}

#[test]
fn pop_collects_children_in_order_and_keeps_trailing_extras() {
    let language = parens();
    let mut stack = StackArena::new();
    let bottom = stack.bottom(0);
    let a = stack.push(bottom, 1, leaf(&language, OPEN, 0, 1));
    let extra = stack.push(a, 1, leaf(&language, NUMBER, 0, 1).with_extra());
    let b = stack.push(extra, 3, leaf(&language, NUMBER, 0, 2));
    let trailing = stack.push(b, 3, leaf(&language, NUMBER, 0, 1).with_extra());

    let popped = stack.pop(trailing, 2);

    assert_eq!(popped.base, bottom);
    let sizes: Vec<(usize, bool)> = popped
        .children
        .iter()
        .map(|c| (c.size, c.flags.extra))
        .collect();
    assert_eq!(sizes, vec![(1, false), (1, true), (2, false)]);
    assert_eq!(popped.trailing.len(), 1);
}

#[test]
fn forked_versions_share_their_prefix() {
    let language = parens();
    let mut stack = StackArena::new();
    let bottom = stack.bottom(0);
    let shared = stack.push(bottom, 1, leaf(&language, OPEN, 0, 1));
    let left = stack.push(shared, 3, leaf(&language, NUMBER, 0, 1));
    let right = stack.push(shared, 3, leaf(&language, NUMBER, 0, 1));
    let other = stack.push(shared, 4, leaf(&language, NUMBER, 0, 1));

    assert!(stack.same_states(left, right));
    assert!(!stack.same_states(left, other));
    assert_eq!(stack.subtrees(left).len(), 2);
    assert_eq!(stack.pop(right, 1).base, shared);
}

#[test]
fn error_cost_and_precedence_accumulate() {
    let language = parens();
    let mut stack = StackArena::new();
    let bottom = stack.bottom(0);
    let missing = Subtree::missing(&language, NUMBER, 1);
    let top = stack.push(bottom, 3, missing);

    assert_eq!(stack.frame(bottom).error_cost, 0);
    assert_eq!(stack.frame(top).error_cost, 110);
    assert_eq!(stack.frame(top).dynamic_precedence, 0);
}

#[test]
fn pop_one_stops_at_bottom() {
    let language = parens();
    let mut stack = StackArena::new();
    let bottom = stack.bottom(0);
    let top = stack.push(bottom, 1, leaf(&language, OPEN, 0, 1));

    let (parent, subtree) = stack.pop_one(top).unwrap();
    assert_eq!(parent, bottom);
    assert_eq!(subtree.symbol, OPEN);
    assert!(stack.pop_one(bottom).is_none());
}
