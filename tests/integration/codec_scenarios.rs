//! Codec behavior on concrete trees and hand-written row sets.

use super::support::{text_leaf, two_leaf_tree};
use coursetree::codec::{flatten_tree, rebuild, NodeRow};
use coursetree::error::ConsistencyError;
use coursetree::tree::{ContainerNode, LeafKind, LeafNode, NodeType, Tree};
use coursetree::types::{ContextId, NodeId};

#[test]
fn two_leaves_under_root_flatten_to_three_rows() {
    let tree = two_leaf_tree(ContextId::course("c1"));
    let rows = flatten_tree(&tree);

    assert_eq!(rows.len(), 3);
    let root_id = tree.root.id();
    assert_eq!(rows[0].parent_id, None);
    assert_eq!(rows[0].node_type, NodeType::Container);
    for (index, row) in rows[1..].iter().enumerate() {
        assert_eq!(row.parent_id.as_ref(), Some(root_id));
        assert_eq!(row.order_index, index as u32);
        assert_eq!(row.node_type, NodeType::Leaf);
    }

    let rebuilt = rebuild(&rows).unwrap().unwrap();
    assert_eq!(rebuilt, tree);
    let titles: Vec<&str> = rebuilt.root.children().iter().map(|n| n.title()).collect();
    assert_eq!(titles, vec!["First", "Second"]);
}

#[test]
fn container_and_leaf_columns_follow_nullability() {
    let tree = Tree::new(
        ContextId::template("t1"),
        ContainerNode::new("Rust")
            .with_child(ContainerNode::new("Empty"))
            .with_child(LeafNode::new(
                "Closures",
                LeafKind::Code {
                    programming_language: "rust".to_string(),
                    code_context: None,
                },
            )),
    );

    for row in flatten_tree(&tree) {
        match row.node_type {
            NodeType::Container => {
                assert!(row.leaf_type.is_none());
                assert!(row.reading_text_regular.is_none());
                assert!(row.reading_text_short.is_none());
                assert!(row.reading_text_long.is_none());
                assert!(row.quiz_questions.is_none());
                assert!(row.data.is_none());
            }
            NodeType::Leaf => {
                assert!(row.leaf_type.is_some());
                assert_eq!(row.reading_text_regular.as_deref(), Some(""));
                assert!(row.reading_text_short.is_some());
                assert!(row.reading_text_long.is_some());
                assert_eq!(row.quiz_questions, Some(Vec::new()));
                assert!(row.data.is_some());
            }
        }
    }
}

#[test]
fn rebuild_sorts_siblings_by_order_index() {
    let tree = Tree::new(
        ContextId::course("c1"),
        ContainerNode::new("Root")
            .with_child(text_leaf("a"))
            .with_child(text_leaf("b"))
            .with_child(text_leaf("c"))
            .with_child(text_leaf("d")),
    );
    let mut rows = flatten_tree(&tree);
    rows.reverse();
    rows.swap(0, 2);

    assert_eq!(rebuild(&rows).unwrap().unwrap(), tree);
}

#[test]
fn empty_row_set_is_not_an_error() {
    let rows: Vec<NodeRow> = Vec::new();
    assert_eq!(rebuild(&rows).unwrap(), None);
}

#[test]
fn two_null_parents_is_inconsistent() {
    let mut rows = flatten_tree(&two_leaf_tree(ContextId::course("c1")));
    rows[2].parent_id = None;
    assert!(matches!(
        rebuild(&rows),
        Err(ConsistencyError::MultipleRoots { .. })
    ));
}

#[test]
fn missing_parent_is_an_orphan() {
    let mut rows = flatten_tree(&two_leaf_tree(ContextId::course("c1")));
    rows[1].parent_id = Some(NodeId::new("nowhere"));
    assert!(matches!(
        rebuild(&rows),
        Err(ConsistencyError::OrphanRow { .. })
    ));
}

#[test]
fn rows_without_root_are_inconsistent() {
    let mut rows = flatten_tree(&two_leaf_tree(ContextId::course("c1")));
    rows.remove(0);
    assert!(rebuild(&rows).is_err());
}
