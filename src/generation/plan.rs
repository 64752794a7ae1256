use crate::error::GenerationError;
use crate::tree::LeafType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Deepest structure a plan may request, in levels below the root.
pub const MAX_PLAN_DEPTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseCategory {
    Generic,
    LanguageVocabulary,
    LanguageGrammar,
    LanguageConversation,
    LanguageListening,
}

impl CourseCategory {
    /// Leaf types a course of this category may contain. The first entry is the
    /// fallback used whenever a proposed leaf type has to be coerced.
    pub fn allowed_leaf_types(&self) -> &'static [LeafType] {
        match self {
            CourseCategory::LanguageVocabulary => &[LeafType::Text, LeafType::LanguageVocabulary],
            CourseCategory::Generic
            | CourseCategory::LanguageGrammar
            | CourseCategory::LanguageConversation
            | CourseCategory::LanguageListening => &[LeafType::Text],
        }
    }
}

impl Default for CourseCategory {
    fn default() -> Self {
        CourseCategory::Generic
    }
}

/// Read-only input of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationPlan {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub max_depth: usize,
    #[serde(default)]
    pub category: CourseCategory,
    #[serde(default)]
    pub instructions: Vec<String>,
    /// Containers allowed per classification step before the rest are cut off.
    #[serde(default)]
    pub item_cap: Option<usize>,
    /// Overrides the category's leaf types when set.
    #[serde(default)]
    pub allowed_leaf_types: Option<Vec<LeafType>>,
}

impl GenerationPlan {
    pub fn new(title: impl Into<String>, max_depth: usize) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            max_depth,
            category: CourseCategory::Generic,
            instructions: Vec::new(),
            item_cap: None,
            allowed_leaf_types: None,
        }
    }

    pub fn allowed_leaf_types(&self) -> Vec<LeafType> {
        match &self.allowed_leaf_types {
            Some(types) if !types.is_empty() => types.clone(),
            _ => self.category.allowed_leaf_types().to_vec(),
        }
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.title.trim().is_empty() {
            return Err(GenerationError::InvalidPlan(
                "Generation plan title cannot be empty".to_string(),
            ));
        }
        if !(1..=MAX_PLAN_DEPTH).contains(&self.max_depth) {
            return Err(GenerationError::InvalidPlan(format!(
                "Generation plan maxDepth must be between 1 and {}, got {}",
                MAX_PLAN_DEPTH, self.max_depth
            )));
        }
        if self.item_cap == Some(0) {
            return Err(GenerationError::InvalidPlan(
                "Generation plan itemCap must be at least 1".to_string(),
            ));
        }
        if matches!(&self.allowed_leaf_types, Some(types) if types.is_empty()) {
            return Err(GenerationError::InvalidPlan(
                "Generation plan allowedLeafTypes cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of one EXPAND_LEVEL iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub iteration: usize,
    pub containers_expanded: usize,
    pub containers_created: usize,
    pub leaves_created: usize,
    /// Containers created with `do_not_populate` because of the item cap.
    pub cutoff_count: usize,
    /// Proposed containers stored as leaves because of the depth bound.
    pub coerced_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationReport {
    pub plan_title: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub level_summaries: Vec<LevelSummary>,
    pub leaf_groups: usize,
    pub leaves_generated: usize,
    /// Leaves that already carried content, e.g. after resuming a checkpoint.
    pub leaves_reused: usize,
}

impl PopulationReport {
    pub fn new(plan_title: String) -> Self {
        Self {
            plan_title,
            started_at: Utc::now(),
            finished_at: None,
            level_summaries: Vec::new(),
            leaf_groups: 0,
            leaves_generated: 0,
            leaves_reused: 0,
        }
    }

    pub fn iterations(&self) -> usize {
        self.level_summaries.len()
    }
}
