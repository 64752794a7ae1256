//! Tree codec
//!
//! Flattens a tree into order-indexed rows for one context and rebuilds the tree
//! from those rows. `rebuild(flatten(t))` reproduces `t` exactly, child order
//! included.

mod row;

pub use row::NodeRow;

use row::{decode_leaf_data, encode_leaf_data};

use crate::error::ConsistencyError;
use crate::tree::{ContainerNode, LeafNode, Node, NodeType, Tree};
use crate::types::{ContextId, NodeId};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// Flatten a tree into rows, pre-order.
pub fn flatten_tree(tree: &Tree) -> Vec<NodeRow> {
    flatten(&tree.root, &tree.context)
}

/// Flatten `root` into rows for `context`, pre-order.
///
/// The root row has no parent; every other row carries its parent's id and its
/// 0-based position among its siblings.
pub fn flatten(root: &Node, context: &ContextId) -> Vec<NodeRow> {
    let mut rows = Vec::new();
    push_rows(root, context, None, 0, &mut rows);
    rows
}

fn push_rows(
    node: &Node,
    context: &ContextId,
    parent_id: Option<&NodeId>,
    order_index: u32,
    rows: &mut Vec<NodeRow>,
) {
    let mut row = NodeRow {
        id: node.id().clone(),
        context_id: context.clone(),
        parent_id: parent_id.cloned(),
        node_type: node.node_type(),
        leaf_type: None,
        title: node.title().to_string(),
        description: node.description().map(str::to_string),
        order_index,
        reading_text_regular: None,
        reading_text_short: None,
        reading_text_long: None,
        quiz_questions: None,
        data: None,
    };

    match node {
        Node::Leaf(leaf) => {
            row.leaf_type = Some(leaf.leaf_type());
            row.reading_text_regular = Some(leaf.reading_text_regular.clone());
            row.reading_text_short = Some(leaf.reading_text_short.clone());
            row.reading_text_long = Some(leaf.reading_text_long.clone());
            row.quiz_questions = Some(leaf.quiz_questions.clone());
            row.data = Some(encode_leaf_data(&leaf.kind));
            rows.push(row);
        }
        Node::Container(container) => {
            rows.push(row);
            for (index, child) in container.children.iter().enumerate() {
                push_rows(child, context, Some(&container.id), index as u32, rows);
            }
        }
    }
}

/// Rebuild a tree from the rows of one context.
///
/// Returns `Ok(None)` for an empty row set. Rows may arrive in any order;
/// siblings are ordered by `order_index`.
#[instrument(level = "debug", skip(rows), fields(row_count = rows.len()))]
pub fn rebuild(rows: &[NodeRow]) -> Result<Option<Tree>, ConsistencyError> {
    if rows.is_empty() {
        return Ok(None);
    }

    let mut ids: HashSet<&NodeId> = HashSet::with_capacity(rows.len());
    for row in rows {
        if !ids.insert(&row.id) {
            return Err(ConsistencyError::DuplicateNodeId(row.id.clone()));
        }
    }

    let roots: Vec<&NodeRow> = rows.iter().filter(|row| row.parent_id.is_none()).collect();
    let root = match roots.as_slice() {
        [] => {
            return Err(ConsistencyError::MissingRoot {
                row_count: rows.len(),
            })
        }
        [root] => *root,
        _ => {
            return Err(ConsistencyError::MultipleRoots {
                ids: roots.iter().map(|row| row.id.clone()).collect(),
            })
        }
    };

    let mut groups: HashMap<&NodeId, Vec<&NodeRow>> = HashMap::new();
    for row in rows {
        if row.context_id != root.context_id {
            return Err(ConsistencyError::ContextMismatch {
                id: row.id.clone(),
                expected: root.context_id.clone(),
                found: row.context_id.clone(),
            });
        }
        if let Some(parent_id) = &row.parent_id {
            if !ids.contains(parent_id) {
                return Err(ConsistencyError::OrphanRow {
                    id: row.id.clone(),
                    parent_id: parent_id.clone(),
                });
            }
            groups.entry(parent_id).or_default().push(row);
        }
    }

    for (parent_id, siblings) in groups.iter_mut() {
        siblings.sort_by_key(|row| row.order_index);
        if let Some(pair) = siblings
            .windows(2)
            .find(|pair| pair[0].order_index == pair[1].order_index)
        {
            return Err(ConsistencyError::DuplicateOrderIndex {
                parent_id: (*parent_id).clone(),
                order_index: pair[0].order_index,
            });
        }
    }

    let mut built = 0usize;
    let node = build_node(root, &groups, &mut built)?;
    if built != rows.len() {
        return Err(ConsistencyError::UnreachableRows {
            count: rows.len() - built,
        });
    }

    debug!(context = %root.context_id, nodes = built, "Rebuilt tree from rows");
    Ok(Some(Tree {
        context: root.context_id.clone(),
        root: node,
    }))
}

fn build_node(
    row: &NodeRow,
    groups: &HashMap<&NodeId, Vec<&NodeRow>>,
    built: &mut usize,
) -> Result<Node, ConsistencyError> {
    *built += 1;
    let children = groups.get(&row.id);

    match row.node_type {
        NodeType::Container => {
            let children = children
                .map(|siblings| {
                    siblings
                        .iter()
                        .map(|child| build_node(child, groups, built))
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()?
                .unwrap_or_default();
            Ok(Node::Container(ContainerNode {
                id: row.id.clone(),
                title: row.title.clone(),
                description: row.description.clone(),
                children,
            }))
        }
        NodeType::Leaf => {
            if let Some(child) = children.and_then(|siblings| siblings.first()) {
                return Err(ConsistencyError::ChildUnderLeaf {
                    id: child.id.clone(),
                    parent_id: row.id.clone(),
                });
            }
            let column = |value: &Option<String>, name: &'static str| {
                value
                    .clone()
                    .ok_or_else(|| ConsistencyError::MissingLeafColumn {
                        id: row.id.clone(),
                        column: name,
                    })
            };
            let leaf_type = row
                .leaf_type
                .ok_or_else(|| ConsistencyError::MissingLeafColumn {
                    id: row.id.clone(),
                    column: "leaf_type",
                })?;
            Ok(Node::Leaf(LeafNode {
                id: row.id.clone(),
                title: row.title.clone(),
                description: row.description.clone(),
                reading_text_regular: column(&row.reading_text_regular, "reading_text_regular")?,
                reading_text_short: column(&row.reading_text_short, "reading_text_short")?,
                reading_text_long: column(&row.reading_text_long, "reading_text_long")?,
                quiz_questions: row.quiz_questions.clone().ok_or_else(|| {
                    ConsistencyError::MissingLeafColumn {
                        id: row.id.clone(),
                        column: "quiz_questions",
                    }
                })?,
                kind: decode_leaf_data(&row.id, leaf_type, row.data.as_deref())?,
            }))
        }
    }
}
