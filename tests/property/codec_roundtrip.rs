//! Property-based tests for the codec and validator on arbitrary trees

use coursetree::codec::{flatten_tree, rebuild};
use coursetree::tree::validate::parse_tree;
use coursetree::tree::{ContainerNode, LeafKind, LeafNode, Node, NodeType, Tree};
use coursetree::types::{ContextId, NodeId};
use proptest::collection::vec;
use proptest::option;
use proptest::prelude::*;
use std::collections::HashMap;

fn leaf_kind() -> impl Strategy<Value = LeafKind> {
    prop_oneof![
        option::of("[a-z]{1,8}").prop_map(|text_category| LeafKind::Text { text_category }),
        ("[a-z]{2}", ".{0,12}", ".{0,12}", ".{0,12}").prop_map(
            |(target_language, regular, short, long)| LeafKind::LanguageVocabulary {
                target_language,
                reading_text_regular_translated: regular,
                reading_text_short_translated: short,
                reading_text_long_translated: long,
            }
        ),
        ("[a-z]{2,10}", option::of(".{0,20}")).prop_map(|(programming_language, code_context)| {
            LeafKind::Code {
                programming_language,
                code_context,
            }
        }),
    ]
}

fn leaf() -> impl Strategy<Value = Node> {
    (
        ".{0,10}",
        option::of(".{0,10}"),
        (".{0,16}", ".{0,8}", ".{0,24}"),
        vec(".{0,12}", 0..4),
        leaf_kind(),
    )
        .prop_map(|(title, description, (regular, short, long), quiz, kind)| {
            let mut leaf = LeafNode::new(title, kind)
                .with_readings(regular, short, long)
                .with_quiz(quiz);
            leaf.description = description;
            leaf.into()
        })
}

fn node() -> impl Strategy<Value = Node> {
    leaf().prop_recursive(4, 48, 6, |inner| {
        (".{0,10}", option::of(".{0,10}"), vec(inner, 0..6)).prop_map(
            |(title, description, children)| {
                Node::Container(ContainerNode {
                    id: NodeId::generate(),
                    title,
                    description,
                    children,
                })
            },
        )
    })
}

fn tree() -> impl Strategy<Value = Tree> {
    (".{0,10}", vec(node(), 0..6)).prop_map(|(title, children)| {
        let mut root = ContainerNode::new(title);
        root.children = children;
        Tree::new(ContextId::template("prop"), root)
    })
}

#[test]
fn rebuild_inverts_flatten() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&tree(), |tree| {
            let rows = flatten_tree(&tree);
            prop_assert_eq!(rows.len(), tree.node_count());
            let rebuilt = rebuild(&rows).unwrap();
            prop_assert_eq!(rebuilt, Some(tree));
            Ok(())
        })
        .unwrap();
}

#[test]
fn rebuild_ignores_row_order() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&tree(), |tree| {
            let mut rows = flatten_tree(&tree);
            rows.reverse();
            prop_assert_eq!(rebuild(&rows).unwrap(), Some(tree));
            Ok(())
        })
        .unwrap();
}

#[test]
fn flattened_rows_respect_nullability_and_order() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&tree(), |tree| {
            let rows = flatten_tree(&tree);
            let mut siblings: HashMap<Option<NodeId>, Vec<u32>> = HashMap::new();
            for row in &rows {
                siblings
                    .entry(row.parent_id.clone())
                    .or_default()
                    .push(row.order_index);
                match row.node_type {
                    NodeType::Container => {
                        prop_assert!(row.leaf_type.is_none());
                        prop_assert!(row.reading_text_regular.is_none());
                        prop_assert!(row.quiz_questions.is_none());
                        prop_assert!(row.data.is_none());
                    }
                    NodeType::Leaf => {
                        prop_assert!(row.reading_text_regular.is_some());
                        prop_assert!(row.reading_text_short.is_some());
                        prop_assert!(row.reading_text_long.is_some());
                        prop_assert!(row.quiz_questions.is_some());
                    }
                }
            }
            prop_assert_eq!(siblings.get(&None).map(Vec::len), Some(1));
            for (_, mut indices) in siblings {
                indices.sort_unstable();
                let expected: Vec<u32> = (0..indices.len() as u32).collect();
                prop_assert_eq!(indices, expected);
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn wire_json_validates_back_to_the_same_tree() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&tree(), |tree| {
            let parsed = parse_tree(&tree.to_json(), tree.context.clone()).unwrap();
            prop_assert_eq!(parsed, tree);
            Ok(())
        })
        .unwrap();
}
