use indoc::indoc;
use lignum_core::{Grammar, Rule};

use crate::test_utils::{language, parse, statements};
use crate::{Point, Tree};

const SOURCE: &str = indoc! {"
    let a = 1;
    b + 2;"};

fn tree() -> Tree {
    parse(&statements(), SOURCE)
}

#[test]
fn root_covers_the_text() {
    let tree = tree();
    let root = tree.root_node();

    assert_eq!(root.kind(), "program");
    assert_eq!(root.byte_range(), 0..17);
    assert_eq!(root.start_position(), Point::new(0, 0));
    assert_eq!(root.end_position(), Point::new(1, 6));
    assert_eq!(root.parent(), None);
    assert_eq!(root.child_count(), 2);
    assert_eq!(tree.node_count(), 13);
}

#[test]
fn children_include_anonymous_nodes() {
    let tree = tree();
    let statement = tree.root_node().child(0).unwrap();

    let kinds: Vec<&str> = statement.children().map(|n| n.kind()).collect();
    assert_eq!(kinds, vec!["let", "identifier", "=", "number", ";"]);
    assert_eq!(statement.named_child_count(), 2);
    let named: Vec<&str> = statement.named_children().map(|n| n.kind()).collect();
    assert_eq!(named, vec!["identifier", "number"]);
    assert!(!statement.child(0).unwrap().is_named());
    assert_eq!(statement.child(5), None);
}

#[test]
fn fields_are_looked_up_by_name() {
    let tree = tree();
    let statement = tree.root_node().child(0).unwrap();

    assert_eq!(statement.field_name_for_child(1), Some("name"));
    assert_eq!(statement.field_name_for_child(0), None);
    let value = statement.child_by_field_name("value").unwrap();
    assert_eq!(value.utf8_text().unwrap(), "1");
    assert_eq!(value.field_name(), Some("value"));
    assert_eq!(statement.child_by_field_name("nope"), None);

    let sum = tree.root_node().child(1).unwrap().named_child(0).unwrap();
    let left: Vec<&str> = sum
        .children_by_field_name("left")
        .map(|n| n.utf8_text().unwrap())
        .collect();
    assert_eq!(left, vec!["b"]);
}

#[test]
fn siblings_and_parents() {
    let tree = tree();
    let root = tree.root_node();
    let first = root.child(0).unwrap();
    let second = root.child(1).unwrap();

    assert_eq!(first.next_sibling(), Some(second));
    assert_eq!(second.prev_sibling(), Some(first));
    assert_eq!(first.prev_sibling(), None);
    assert_eq!(second.next_sibling(), None);
    assert_eq!(second.parent(), Some(root));

    let keyword = first.child(0).unwrap();
    assert_eq!(keyword.next_named_sibling().unwrap().kind(), "identifier");
    let semicolon = first.child(4).unwrap();
    assert_eq!(semicolon.prev_named_sibling().unwrap().kind(), "number");
}

#[test]
fn positions_track_lines() {
    let tree = tree();
    let sum = tree.root_node().child(1).unwrap().named_child(0).unwrap();

    assert_eq!(sum.kind(), "sum");
    assert_eq!(sum.byte_range(), 11..16);
    assert_eq!(sum.start_position(), Point::new(1, 0));
    assert_eq!(sum.end_position(), Point::new(1, 5));
    assert_eq!(format!("{sum:?}"), "{Node sum 11..16}");
    assert_eq!(Point::new(1, 5).to_string(), "(1, 5)");
}

#[test]
fn descendant_for_byte_range_finds_smallest_node() {
    let tree = tree();
    let root = tree.root_node();

    assert_eq!(root.descendant_for_byte_range(15, 16).unwrap().kind(), "number");
    assert_eq!(root.descendant_for_byte_range(11, 16).unwrap().kind(), "sum");
    assert_eq!(root.descendant_for_byte_range(4, 4).unwrap().kind(), "identifier");
    assert_eq!(root.descendant_for_byte_range(8, 12).unwrap(), root);
    assert_eq!(root.descendant_for_byte_range(0, 18), None);
}

#[test]
fn cursor_walks_in_preorder() {
    let tree = tree();
    let mut cursor = tree.walk();

    assert!(cursor.goto_first_child());
    assert_eq!(cursor.node().kind(), "let_statement");
    assert_eq!(cursor.depth(), 1);
    assert!(cursor.goto_first_child());
    assert!(cursor.goto_next_sibling());
    assert_eq!(cursor.field_name(), Some("name"));
    assert!(cursor.goto_previous_sibling());
    assert!(!cursor.goto_previous_sibling());
    assert!(cursor.goto_parent());
    assert!(cursor.goto_parent());
    assert!(!cursor.goto_parent());
    assert_eq!(cursor.field_name(), None);

    assert!(cursor.goto_last_child());
    assert_eq!(cursor.node().kind(), "expression_statement");
    assert!(!cursor.goto_next_sibling());
}

#[test]
fn cursor_seeks_by_offset_and_kind() {
    let tree = tree();
    let number = tree.language().symbol_for_name("number", true).unwrap();

    let mut cursor = tree.walk();
    assert_eq!(cursor.goto_first_child_for_byte(12), Some(1));
    assert_eq!(cursor.node().kind(), "expression_statement");

    let mut cursor = tree.walk();
    assert_eq!(cursor.goto_first_child_for_point(Point::new(0, 3)), Some(0));

    let mut cursor = tree.walk();
    assert!(cursor.goto_next_of_kind(number));
    assert_eq!(cursor.node().byte_range(), 8..9);
    assert!(cursor.goto_next_of_kind(number));
    assert_eq!(cursor.node().byte_range(), 15..16);
    assert!(!cursor.goto_next_of_kind(number));
    assert_eq!(cursor.node().byte_range(), 15..16);
}

#[test]
fn cursor_is_confined_to_its_start_node() {
    let tree = tree();
    let second = tree.root_node().child(1).unwrap();
    let mut cursor = second.walk();

    assert!(!cursor.goto_next_sibling());
    assert!(!cursor.goto_parent());
    assert!(cursor.goto_first_child());
    cursor.reset(second);
    assert_eq!(cursor.node(), second);
    assert_eq!(cursor.depth(), 0);
}

#[test]
fn aliases_rename_nodes() {
    let language = language(
        &Grammar::new("pairs")
            .rule(
                "pair",
                Rule::seq([
                    Rule::alias(Rule::sym("word"), "key", true),
                    Rule::string(":"),
                    Rule::sym("word"),
                ]),
            )
            .rule("word", Rule::pattern("[a-z]+")),
    );
    let tree = parse(&language, "a:b");
    let key = tree.root_node().child(0).unwrap();

    assert_eq!(key.kind(), "key");
    assert_eq!(key.grammar_kind(), "word");
    assert_ne!(key.kind_id(), key.grammar_id());
    assert_eq!(tree.to_sexp(), "(pair (key) (word))");
}

#[test]
fn sexp_of_a_subtree() {
    let tree = tree();
    let statement = tree.root_node().child(1).unwrap();

    assert_eq!(
        statement.to_sexp(),
        "(expression_statement (sum left: (identifier) right: (number)))"
    );
}
