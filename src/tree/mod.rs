//! Course and template trees
//!
//! A finalized tree is a strict, single-rooted hierarchy of containers and leaves.
//! Ownership flows from a container to its children only; parent lookups are done
//! by traversal from the root, never through stored back-references.

pub mod validate;

use crate::types::{ContextId, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Node discriminant as stored in the `node_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Container,
    Leaf,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Container => "container",
            NodeType::Leaf => "leaf",
        }
    }
}

/// Leaf discriminant selecting the type-specific fields of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafType {
    Text,
    LanguageVocabulary,
    Code,
}

impl LeafType {
    pub const ALL: [LeafType; 3] = [LeafType::Text, LeafType::LanguageVocabulary, LeafType::Code];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeafType::Text => "text",
            LeafType::LanguageVocabulary => "language_vocabulary",
            LeafType::Code => "code",
        }
    }
}

impl fmt::Display for LeafType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeafType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeafType::ALL
            .into_iter()
            .find(|leaf_type| leaf_type.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Type-specific leaf fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "leafType", rename_all = "snake_case")]
pub enum LeafKind {
    #[serde(rename_all = "camelCase")]
    Text { text_category: Option<String> },
    #[serde(rename_all = "camelCase")]
    LanguageVocabulary {
        target_language: String,
        reading_text_regular_translated: String,
        reading_text_short_translated: String,
        reading_text_long_translated: String,
    },
    #[serde(rename_all = "camelCase")]
    Code {
        programming_language: String,
        code_context: Option<String>,
    },
}

impl LeafKind {
    pub fn leaf_type(&self) -> LeafType {
        match self {
            LeafKind::Text { .. } => LeafType::Text,
            LeafKind::LanguageVocabulary { .. } => LeafType::LanguageVocabulary,
            LeafKind::Code { .. } => LeafType::Code,
        }
    }

    pub fn text() -> Self {
        LeafKind::Text {
            text_category: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerNode {
    pub id: NodeId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub children: Vec<Node>,
}

impl ContainerNode {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: NodeId::generate(),
            title: title.into(),
            description: None,
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafNode {
    pub id: NodeId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub reading_text_regular: String,
    pub reading_text_short: String,
    pub reading_text_long: String,
    pub quiz_questions: Vec<String>,
    #[serde(flatten)]
    pub kind: LeafKind,
}

impl LeafNode {
    pub fn new(title: impl Into<String>, kind: LeafKind) -> Self {
        Self {
            id: NodeId::generate(),
            title: title.into(),
            description: None,
            reading_text_regular: String::new(),
            reading_text_short: String::new(),
            reading_text_long: String::new(),
            quiz_questions: Vec::new(),
            kind,
        }
    }

    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_readings(
        mut self,
        regular: impl Into<String>,
        short: impl Into<String>,
        long: impl Into<String>,
    ) -> Self {
        self.reading_text_regular = regular.into();
        self.reading_text_short = short.into();
        self.reading_text_long = long.into();
        self
    }

    pub fn with_quiz(mut self, questions: Vec<String>) -> Self {
        self.quiz_questions = questions;
        self
    }

    pub fn leaf_type(&self) -> LeafType {
        self.kind.leaf_type()
    }
}

/// A node of a finalized tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "nodeType", rename_all = "lowercase")]
pub enum Node {
    Container(ContainerNode),
    Leaf(LeafNode),
}

impl From<ContainerNode> for Node {
    fn from(value: ContainerNode) -> Self {
        Node::Container(value)
    }
}

impl From<LeafNode> for Node {
    fn from(value: LeafNode) -> Self {
        Node::Leaf(value)
    }
}

impl Node {
    pub fn id(&self) -> &NodeId {
        match self {
            Node::Container(c) => &c.id,
            Node::Leaf(l) => &l.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Node::Container(c) => &c.title,
            Node::Leaf(l) => &l.title,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Node::Container(c) => c.description.as_deref(),
            Node::Leaf(l) => l.description.as_deref(),
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Container(_) => NodeType::Container,
            Node::Leaf(_) => NodeType::Leaf,
        }
    }

    /// Children in order; always empty for a leaf.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Container(c) => &c.children,
            Node::Leaf(_) => &[],
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            Node::Leaf(l) => Some(l),
            Node::Container(_) => None,
        }
    }

    pub fn as_container(&self) -> Option<&ContainerNode> {
        match self {
            Node::Container(c) => Some(c),
            Node::Leaf(_) => None,
        }
    }

    fn set_id(&mut self, id: NodeId) {
        match self {
            Node::Container(c) => c.id = id,
            Node::Leaf(l) => l.id = id,
        }
    }
}

/// Pre-order walk yielding each node with its depth (root = 0).
pub struct PreOrder<'a> {
    stack: Vec<(usize, &'a Node)>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (usize, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children().iter().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}

/// A finalized tree bound to its owning context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    pub context: ContextId,
    pub root: Node,
}

impl Tree {
    pub fn new(context: ContextId, root: impl Into<Node>) -> Self {
        Self {
            context,
            root: root.into(),
        }
    }

    pub fn walk(&self) -> PreOrder<'_> {
        PreOrder {
            stack: vec![(0, &self.root)],
        }
    }

    pub fn node_count(&self) -> usize {
        self.walk().count()
    }

    /// Deepest level present in the tree (a lone root is depth 0).
    pub fn depth(&self) -> usize {
        self.walk().map(|(depth, _)| depth).max().unwrap_or(0)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &LeafNode> {
        self.walk().filter_map(|(_, node)| node.as_leaf())
    }

    pub fn find(&self, id: &NodeId) -> Option<&Node> {
        self.walk().map(|(_, node)| node).find(|node| node.id() == id)
    }

    /// Nodes from the root down to `id`, inclusive.
    pub fn path_to(&self, id: &NodeId) -> Option<Vec<&Node>> {
        fn descend<'a>(node: &'a Node, id: &NodeId, path: &mut Vec<&'a Node>) -> bool {
            path.push(node);
            if node.id() == id {
                return true;
            }
            for child in node.children() {
                if descend(child, id, path) {
                    return true;
                }
            }
            path.pop();
            false
        }

        let mut path = Vec::new();
        descend(&self.root, id, &mut path).then_some(path)
    }

    pub fn breadcrumb(&self, id: &NodeId) -> Option<String> {
        self.path_to(id).map(|path| {
            path.iter()
                .map(|node| node.title())
                .collect::<Vec<_>>()
                .join(" > ")
        })
    }

    /// Copy this tree into another context with fresh node ids.
    ///
    /// Titles, leaf content and child order are preserved.
    pub fn instantiate(&self, context: ContextId) -> Tree {
        fn reidentify(node: &mut Node) {
            node.set_id(NodeId::generate());
            if let Node::Container(container) = node {
                container.children.iter_mut().for_each(reidentify);
            }
        }

        let mut root = self.root.clone();
        reidentify(&mut root);
        Tree { context, root }
    }

    /// Indented text outline, one node per line.
    pub fn outline(&self) -> String {
        self.walk()
            .map(|(depth, node)| match node {
                Node::Container(c) => {
                    format!("{}{} ({} children)", "  ".repeat(depth), c.title, c.children.len())
                }
                Node::Leaf(l) => format!("{}- {} [{}]", "  ".repeat(depth), l.title, l.leaf_type()),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Nested wire representation (camelCase, `nodeType`/`leafType` tagged).
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.root).unwrap_or(serde_json::Value::Null)
    }
}
