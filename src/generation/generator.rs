//! Content generator capability
//!
//! The scheduler and fan-out never talk to a model directly. They receive a
//! [`ContentGenerator`] and hand it fully prepared requests, so tests can swap in a
//! deterministic fake.

use crate::error::GenerationError;
use crate::generation::plan::GenerationPlan;
use crate::tree::LeafType;
use crate::types::NodeId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Plan fields shared by every request of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanContext {
    pub title: String,
    pub description: String,
    pub instructions: Vec<String>,
    pub max_depth: usize,
    pub allowed_leaf_types: Vec<LeafType>,
}

impl From<&GenerationPlan> for PlanContext {
    fn from(plan: &GenerationPlan) -> Self {
        Self {
            title: plan.title.clone(),
            description: plan.description.clone(),
            instructions: plan.instructions.clone(),
            max_depth: plan.max_depth,
            allowed_leaf_types: plan.allowed_leaf_types(),
        }
    }
}

/// Ask for the immediate children of one container.
#[derive(Debug, Clone)]
pub struct ClassificationRequest {
    pub container_id: NodeId,
    pub title: String,
    /// Titles from the root to the container, joined with ` > `.
    pub breadcrumb: String,
    pub source_level: usize,
    pub target_level: usize,
    /// Children at `target_level` will be stored as leaves whatever is proposed.
    pub leaves_only: bool,
    pub structure: String,
    pub plan: Arc<PlanContext>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposedKind {
    Container,
    Leaf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedChild {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ProposedKind,
    #[serde(default)]
    pub leaf_type: Option<LeafType>,
}

impl ProposedChild {
    pub fn container(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: ProposedKind::Container,
            leaf_type: None,
        }
    }

    pub fn leaf(title: impl Into<String>, leaf_type: LeafType) -> Self {
        Self {
            title: title.into(),
            kind: ProposedKind::Leaf,
            leaf_type: Some(leaf_type),
        }
    }
}

/// Ask for the content of one leaf.
#[derive(Debug, Clone)]
pub struct LeafRequest {
    pub leaf_id: NodeId,
    pub title: String,
    pub leaf_type: LeafType,
    /// Ancestor titles from the root down to the parent container.
    pub ancestor_path: Vec<String>,
    pub breadcrumb: String,
    pub plan: Arc<PlanContext>,
}

/// Generated leaf payload. Type-specific fields are optional; the converter
/// fills defaults for anything left unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeafContent {
    pub description: Option<String>,
    pub reading_text_regular: String,
    pub reading_text_short: String,
    pub reading_text_long: String,
    pub quiz_questions: Vec<String>,
    pub text_category: Option<String>,
    pub target_language: Option<String>,
    pub reading_text_regular_translated: Option<String>,
    pub reading_text_short_translated: Option<String>,
    pub reading_text_long_translated: Option<String>,
    pub programming_language: Option<String>,
    pub code_context: Option<String>,
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Propose the ordered children of a container.
    async fn classify_children(
        &self,
        request: &ClassificationRequest,
    ) -> Result<Vec<ProposedChild>, GenerationError>;

    /// Produce reading texts, quiz prompts and type-specific fields for a leaf.
    async fn generate_leaf_content(
        &self,
        request: &LeafRequest,
    ) -> Result<LeafContent, GenerationError>;
}

#[async_trait]
impl<G: ContentGenerator + ?Sized> ContentGenerator for Arc<G> {
    async fn classify_children(
        &self,
        request: &ClassificationRequest,
    ) -> Result<Vec<ProposedChild>, GenerationError> {
        (**self).classify_children(request).await
    }

    async fn generate_leaf_content(
        &self,
        request: &LeafRequest,
    ) -> Result<LeafContent, GenerationError> {
        (**self).generate_leaf_content(request).await
    }
}
