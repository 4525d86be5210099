//! Property-based tests over generated arithmetic sources.

use proptest::prelude::*;

use canopy::{Node, Parser, SupportLang, TextEdit, Tree};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_operand() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..10_000).prop_map(|n| n.to_string()),
        "[a-z][a-z0-9_]{0,6}".prop_filter("not a keyword", |s| !is_keyword(s)),
    ]
}

fn is_keyword(s: &str) -> bool {
    matches!(
        s,
        "and" | "as" | "def" | "del" | "for" | "if" | "in" | "is" | "not" | "or" | "elif"
            | "else" | "from" | "with" | "try" | "pass" | "class" | "while" | "yield"
            | "raise" | "break" | "async" | "await" | "import" | "global" | "lambda"
            | "assert" | "except" | "return" | "finally" | "continue" | "nonlocal"
            | "print" | "exec" | "match" | "case" | "type"
    )
}

/// Expressions like `a + 3 * (b - 7)`.
fn arb_expression() -> impl Strategy<Value = String> {
    arb_operand().prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), prop_oneof![Just("+"), Just("-"), Just("*")], inner.clone())
                .prop_map(|(l, op, r)| format!("{l} {op} {r}")),
            inner.prop_map(|e| format!("({e})")),
        ]
    })
}

/// A few lines of expression statements.
fn arb_source() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_expression(), 1..5).prop_map(|lines| lines.join("\n"))
}

fn parse(source: &str) -> Tree {
    let mut parser = Parser::with_grammar(&SupportLang::Python).unwrap();
    parser.parse_str(source, None).unwrap()
}

fn all_nodes(root: Node) -> Vec<Node> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        stack.extend(node.children().iter().rev().cloned());
        out.push(node);
    }
    out
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn root_text_is_source(source in arb_source()) {
        let tree = parse(&source);
        let root = tree.root_node();
        prop_assert_eq!(root.text(), Some(source.as_bytes()));
        prop_assert!(!tree.root_node().has_error());
    }

    #[test]
    fn children_point_back_to_parent(source in arb_source()) {
        let tree = parse(&source);
        for node in all_nodes(tree.root_node()) {
            for child in node.children() {
                let parent = child.parent();
                prop_assert_eq!(parent.as_ref(), Some(&node));
                prop_assert!(child.start_byte() >= node.start_byte());
                prop_assert!(child.end_byte() <= node.end_byte());
            }
        }
    }

    #[test]
    fn cursor_visits_preorder(source in arb_source()) {
        let tree = parse(&source);
        let expected = all_nodes(tree.root_node());

        let mut visited = Vec::new();
        let mut cursor = tree.walk();
        'walk: loop {
            visited.push(cursor.node().clone());
            if cursor.goto_first_child() {
                let child = cursor.node().clone();
                prop_assert!(cursor.goto_parent());
                prop_assert_eq!(cursor.node(), visited.last().unwrap());
                prop_assert!(cursor.goto_first_child());
                prop_assert_eq!(cursor.node(), &child);
                continue;
            }
            while !cursor.goto_next_sibling() {
                if !cursor.goto_parent() {
                    break 'walk;
                }
            }
        }
        prop_assert_eq!(visited, expected);
    }

    #[test]
    fn append_edit_preserves_prefix(source in arb_source(), extra in arb_expression()) {
        let mut parser = Parser::with_grammar(&SupportLang::Python).unwrap();
        let mut tree = parser.parse_str(&source, None).unwrap();
        let before: Vec<_> = tree
            .root_node()
            .children()
            .iter()
            .map(|n| (n.kind(), n.byte_range(), n.to_sexp()))
            .collect();

        let addition = format!("\n{extra}");
        let edit = TextEdit::insert(source.as_bytes(), source.len(), addition.as_bytes()).unwrap();
        let new_source = edit.apply(source.as_bytes(), addition.as_bytes()).unwrap();
        tree.edit(&edit).unwrap();
        let reparsed = parser.parse(new_source, Some(&tree)).unwrap();

        let after: Vec<_> = reparsed
            .root_node()
            .children()
            .iter()
            .take(before.len())
            .map(|n| (n.kind(), n.byte_range(), n.to_sexp()))
            .collect();
        prop_assert_eq!(after, before);
    }
}
