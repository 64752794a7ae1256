//! Core identifier types shared across the tree, codec, store and generation layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque node identifier, unique within one context.
///
/// Freshly generated ids are UUID v4 tokens; ids supplied by external payloads are
/// accepted verbatim as long as they are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Which kind of owner a tree belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    Course,
    Template,
}

impl ContextKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextKind::Course => "course",
            ContextKind::Template => "template",
        }
    }
}

/// The owning course or template of a tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId {
    pub kind: ContextKind,
    pub id: String,
}

impl ContextId {
    pub fn course(id: impl Into<String>) -> Self {
        Self {
            kind: ContextKind::Course,
            id: id.into(),
        }
    }

    pub fn template(id: impl Into<String>) -> Self {
        Self {
            kind: ContextKind::Template,
            id: id.into(),
        }
    }

    /// Parse `course:<id>` or `template:<id>`.
    pub fn parse(value: &str) -> Option<Self> {
        let (kind, id) = value.split_once(':')?;
        if id.trim().is_empty() {
            return None;
        }
        match kind {
            "course" => Some(Self::course(id)),
            "template" => Some(Self::template(id)),
            _ => None,
        }
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}
