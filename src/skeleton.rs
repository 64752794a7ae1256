//! Generation-time skeleton
//!
//! A mutable arena of containers and leaves used only while a tree is being grown.
//! Containers track whether their children have been assigned (`children` is
//! `Some`) and whether they were cut off from further expansion. Parent links are
//! arena indices, so the skeleton holds no reference cycles.

use crate::error::ConsistencyError;
use crate::generation::LeafContent;
use crate::tree::LeafType;
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet, VecDeque};

/// Position of a node in the skeleton arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkeletonIndex(usize);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkeletonBody {
    Container {
        /// `None` until the container has been populated.
        children: Option<Vec<SkeletonIndex>>,
        do_not_populate: bool,
    },
    Leaf {
        leaf_type: LeafType,
        content: Option<LeafContent>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonNode {
    pub id: NodeId,
    pub title: String,
    pub parent: Option<SkeletonIndex>,
    pub body: SkeletonBody,
}

impl SkeletonNode {
    pub fn is_container(&self) -> bool {
        matches!(self.body, SkeletonBody::Container { .. })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.body, SkeletonBody::Leaf { .. })
    }

    pub fn is_populated(&self) -> bool {
        matches!(
            self.body,
            SkeletonBody::Container {
                children: Some(_),
                ..
            }
        )
    }

    pub fn do_not_populate(&self) -> bool {
        matches!(
            self.body,
            SkeletonBody::Container {
                do_not_populate: true,
                ..
            }
        )
    }

    /// Eligible for population: an unpopulated container that was not cut off.
    pub fn can_receive_children(&self) -> bool {
        matches!(
            self.body,
            SkeletonBody::Container {
                children: None,
                do_not_populate: false,
            }
        )
    }
}

/// Shape of a child about to be attached to a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewChild {
    Container { title: String, do_not_populate: bool },
    Leaf { title: String, leaf_type: LeafType },
}

/// The in-progress tree. The root always sits at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    nodes: Vec<SkeletonNode>,
}

impl Skeleton {
    /// A skeleton holding a single unpopulated root container.
    pub fn new(root_title: impl Into<String>) -> Self {
        Self {
            nodes: vec![SkeletonNode {
                id: NodeId::generate(),
                title: root_title.into(),
                parent: None,
                body: SkeletonBody::Container {
                    children: None,
                    do_not_populate: false,
                },
            }],
        }
    }

    pub fn root(&self) -> SkeletonIndex {
        SkeletonIndex(0)
    }

    /// Indices are only minted by this skeleton, so lookups cannot miss.
    pub fn node(&self, index: SkeletonIndex) -> &SkeletonNode {
        &self.nodes[index.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn find(&self, id: &NodeId) -> Option<SkeletonIndex> {
        self.nodes
            .iter()
            .position(|node| &node.id == id)
            .map(SkeletonIndex)
    }

    /// Children in attachment order; empty for leaves and unpopulated containers.
    pub fn children(&self, index: SkeletonIndex) -> &[SkeletonIndex] {
        match &self.node(index).body {
            SkeletonBody::Container {
                children: Some(children),
                ..
            } => children,
            _ => &[],
        }
    }

    /// Distance from the root (root = 0).
    pub fn level(&self, index: SkeletonIndex) -> usize {
        let mut level = 0;
        let mut current = self.node(index).parent;
        while let Some(parent) = current {
            level += 1;
            current = self.node(parent).parent;
        }
        level
    }

    /// Titles from the root down to `index`, inclusive.
    pub fn upstream_titles(&self, index: SkeletonIndex) -> Vec<&str> {
        let mut titles = vec![self.node(index).title.as_str()];
        let mut current = self.node(index).parent;
        while let Some(parent) = current {
            titles.push(self.node(parent).title.as_str());
            current = self.node(parent).parent;
        }
        titles.reverse();
        titles
    }

    pub fn breadcrumb(&self, index: SkeletonIndex) -> String {
        self.upstream_titles(index).join(" > ")
    }

    /// Breadth-first order from the root.
    pub fn breadth_first(&self) -> Vec<SkeletonIndex> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::from([self.root()]);
        while let Some(index) = queue.pop_front() {
            order.push(index);
            queue.extend(self.children(index).iter().copied());
        }
        order
    }

    pub fn nodes_at_level(&self, level: usize) -> Vec<SkeletonIndex> {
        self.breadth_first()
            .into_iter()
            .filter(|index| self.level(*index) == level)
            .collect()
    }

    pub fn level_counts(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for index in self.breadth_first() {
            *counts.entry(self.level(index)).or_insert(0) += 1;
        }
        counts
    }

    pub fn max_depth(&self) -> usize {
        self.breadth_first()
            .into_iter()
            .map(|index| self.level(index))
            .max()
            .unwrap_or(0)
    }

    /// Containers eligible for population, shallowest first.
    pub fn containers_to_populate(&self) -> Vec<SkeletonIndex> {
        self.breadth_first()
            .into_iter()
            .filter(|index| self.node(*index).can_receive_children())
            .collect()
    }

    /// Containers holding at least one leaf child, shallowest first.
    pub fn groups_with_leaves(&self) -> Vec<SkeletonIndex> {
        self.breadth_first()
            .into_iter()
            .filter(|index| {
                self.children(*index)
                    .iter()
                    .any(|child| self.node(*child).is_leaf())
            })
            .collect()
    }

    /// Leaf children of `group` that have no content yet.
    pub fn pending_leaves(&self, group: SkeletonIndex) -> Vec<SkeletonIndex> {
        self.children(group)
            .iter()
            .copied()
            .filter(|child| {
                matches!(
                    self.node(*child).body,
                    SkeletonBody::Leaf { content: None, .. }
                )
            })
            .collect()
    }

    /// Attach `children` to an eligible container, in the given order.
    ///
    /// The container only becomes populated once every child is in the arena.
    pub fn attach_children(
        &mut self,
        parent: SkeletonIndex,
        children: Vec<NewChild>,
    ) -> Result<Vec<SkeletonIndex>, ConsistencyError> {
        let parent_node = self.node(parent);
        match &parent_node.body {
            SkeletonBody::Leaf { .. } => {
                return Err(ConsistencyError::NotAContainer {
                    id: parent_node.id.clone(),
                })
            }
            SkeletonBody::Container {
                children: Some(_), ..
            } => {
                return Err(ConsistencyError::AlreadyPopulated {
                    id: parent_node.id.clone(),
                })
            }
            SkeletonBody::Container { children: None, .. } => {}
        }

        let mut attached = Vec::with_capacity(children.len());
        for child in children {
            let (title, body) = match child {
                NewChild::Container {
                    title,
                    do_not_populate,
                } => (
                    title,
                    SkeletonBody::Container {
                        children: None,
                        do_not_populate,
                    },
                ),
                NewChild::Leaf { title, leaf_type } => (
                    title,
                    SkeletonBody::Leaf {
                        leaf_type,
                        content: None,
                    },
                ),
            };
            let index = SkeletonIndex(self.nodes.len());
            self.nodes.push(SkeletonNode {
                id: NodeId::generate(),
                title,
                parent: Some(parent),
                body,
            });
            attached.push(index);
        }

        if let SkeletonBody::Container { children, .. } = &mut self.nodes[parent.0].body {
            *children = Some(attached.clone());
        }
        Ok(attached)
    }

    /// Cut a container off from any further expansion.
    pub fn mark_do_not_populate(&mut self, index: SkeletonIndex) {
        if let SkeletonBody::Container {
            do_not_populate, ..
        } = &mut self.nodes[index.0].body
        {
            *do_not_populate = true;
        }
    }

    pub fn set_leaf_content(&mut self, index: SkeletonIndex, content: LeafContent) {
        if let SkeletonBody::Leaf {
            content: slot, ..
        } = &mut self.nodes[index.0].body
        {
            *slot = Some(content);
        }
    }

    pub fn leaf_content(&self, index: SkeletonIndex) -> Option<&LeafContent> {
        match &self.node(index).body {
            SkeletonBody::Leaf { content, .. } => content.as_ref(),
            SkeletonBody::Container { .. } => None,
        }
    }

    /// Outline of the path from the root to `target`.
    ///
    /// Nodes on the path are expanded, off-path nodes are elided with `...`, and the
    /// target is marked. Handed to the content generator as structural context.
    pub fn relevant_structure(&self, target: SkeletonIndex) -> String {
        let mut on_path = HashSet::new();
        let mut current = Some(target);
        while let Some(index) = current {
            on_path.insert(index);
            current = self.node(index).parent;
        }

        let mut lines = Vec::new();
        self.render_relevant(self.root(), target, &on_path, 0, &mut lines);
        lines.join("\n")
    }

    fn render_relevant(
        &self,
        index: SkeletonIndex,
        target: SkeletonIndex,
        on_path: &HashSet<SkeletonIndex>,
        indent: usize,
        lines: &mut Vec<String>,
    ) {
        let suffix = if index == target {
            "  # <-- target"
        } else if on_path.contains(&index) {
            ""
        } else {
            " ..."
        };
        lines.push(format!(
            "{}{}:{}",
            "  ".repeat(indent),
            self.node(index).title,
            suffix
        ));
        if on_path.contains(&index) {
            for child in self.children(index) {
                self.render_relevant(*child, target, on_path, indent + 1, lines);
            }
        }
    }

    /// Serialize as a JSON checkpoint.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load a JSON checkpoint, checking that the parent links and children lists
    /// describe one tree rooted at index 0.
    pub fn from_json(raw: &str) -> Result<Self, ConsistencyError> {
        let skeleton: Skeleton = serde_json::from_str(raw)
            .map_err(|err| ConsistencyError::InvalidCheckpoint(err.to_string()))?;
        skeleton.check_links()?;
        Ok(skeleton)
    }

    /// Every non-root node is listed exactly once, by the parent it points at,
    /// and is reachable from the root. Traversals rely on this to terminate.
    fn check_links(&self) -> Result<(), ConsistencyError> {
        let root = self
            .nodes
            .first()
            .ok_or(ConsistencyError::MissingRoot { row_count: 0 })?;
        if root.parent.is_some() || !root.is_container() {
            return Err(ConsistencyError::MissingRoot {
                row_count: self.nodes.len(),
            });
        }

        let mut seen = HashSet::new();
        let mut listed = vec![false; self.nodes.len()];
        for (position, node) in self.nodes.iter().enumerate() {
            if !seen.insert(&node.id) {
                return Err(ConsistencyError::DuplicateNodeId(node.id.clone()));
            }
            for child in self.children_unchecked(node) {
                let Some(child_node) = self.nodes.get(child.0) else {
                    return Err(ConsistencyError::DanglingIndex { index: child.0 });
                };
                if child.0 == 0 {
                    return Err(ConsistencyError::InvalidCheckpoint(format!(
                        "root is listed as a child of {}",
                        node.id
                    )));
                }
                if listed[child.0] {
                    return Err(ConsistencyError::InvalidCheckpoint(format!(
                        "node {} is listed as a child more than once",
                        child_node.id
                    )));
                }
                if child_node.parent != Some(SkeletonIndex(position)) {
                    return Err(ConsistencyError::InvalidCheckpoint(format!(
                        "node {} is listed under {} but points at another parent",
                        child_node.id, node.id
                    )));
                }
                listed[child.0] = true;
            }
        }

        for (position, node) in self.nodes.iter().enumerate().skip(1) {
            if listed[position] {
                continue;
            }
            return Err(match node.parent.filter(|parent| parent.0 < self.nodes.len()) {
                Some(parent) => ConsistencyError::OrphanRow {
                    id: node.id.clone(),
                    parent_id: self.nodes[parent.0].id.clone(),
                },
                None => ConsistencyError::DanglingIndex { index: position },
            });
        }

        let reachable = self.breadth_first().len();
        if reachable != self.nodes.len() {
            return Err(ConsistencyError::UnreachableRows {
                count: self.nodes.len() - reachable,
            });
        }
        Ok(())
    }

    fn children_unchecked<'a>(&self, node: &'a SkeletonNode) -> &'a [SkeletonIndex] {
        match &node.body {
            SkeletonBody::Container {
                children: Some(children),
                ..
            } => children,
            _ => &[],
        }
    }
}
