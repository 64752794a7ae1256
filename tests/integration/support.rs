//! Shared fixtures: a scripted content generator and small tree builders.

use async_trait::async_trait;
use coursetree::error::GenerationError;
use coursetree::generation::{
    ClassificationRequest, ContentGenerator, LeafContent, LeafRequest, ProposedChild,
};
use coursetree::tree::{ContainerNode, LeafKind, LeafNode, LeafType, Tree};
use coursetree::types::ContextId;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// In-flight leaf requests: (current, peak).
#[derive(Default)]
pub struct InFlight {
    counts: Mutex<(usize, usize)>,
}

impl InFlight {
    fn enter(&self) {
        let mut counts = self.counts.lock();
        counts.0 += 1;
        counts.1 = counts.1.max(counts.0);
    }

    fn leave(&self) {
        self.counts.lock().0 -= 1;
    }

    pub fn peak(&self) -> usize {
        self.counts.lock().1
    }
}

/// Deterministic generator: children are looked up by container title, falling
/// back to a default list; leaves in `failing` and containers in
/// `failing_containers` error out.
#[derive(Default)]
pub struct ScriptedGenerator {
    children: HashMap<String, Vec<ProposedChild>>,
    default_children: Vec<ProposedChild>,
    failing: HashSet<String>,
    failing_containers: HashSet<String>,
    pub classify_calls: Mutex<Vec<(String, usize)>>,
    pub leaf_calls: Mutex<Vec<String>>,
    pub in_flight: InFlight,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_children(mut self, title: &str, children: Vec<ProposedChild>) -> Self {
        self.children.insert(title.to_string(), children);
        self
    }

    pub fn with_default_children(mut self, children: Vec<ProposedChild>) -> Self {
        self.default_children = children;
        self
    }

    pub fn failing_leaf(mut self, title: &str) -> Self {
        self.failing.insert(title.to_string());
        self
    }

    pub fn failing_container(mut self, title: &str) -> Self {
        self.failing_containers.insert(title.to_string());
        self
    }

    pub fn classified_titles(&self) -> Vec<String> {
        self.classify_calls
            .lock()
            .iter()
            .map(|(title, _)| title.clone())
            .collect()
    }

    pub fn leaf_titles(&self) -> Vec<String> {
        let mut titles = self.leaf_calls.lock().clone();
        titles.sort();
        titles
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn classify_children(
        &self,
        request: &ClassificationRequest,
    ) -> Result<Vec<ProposedChild>, GenerationError> {
        self.classify_calls
            .lock()
            .push((request.title.clone(), request.source_level));
        if self.failing_containers.contains(&request.title) {
            return Err(GenerationError::RequestFailed(format!(
                "scripted classification failure for {}",
                request.title
            )));
        }
        Ok(self
            .children
            .get(&request.title)
            .cloned()
            .unwrap_or_else(|| self.default_children.clone()))
    }

    async fn generate_leaf_content(
        &self,
        request: &LeafRequest,
    ) -> Result<LeafContent, GenerationError> {
        self.leaf_calls.lock().push(request.title.clone());
        // Suspend once so every sibling in the same join is entered before any returns.
        self.in_flight.enter();
        tokio::task::yield_now().await;
        self.in_flight.leave();
        if self.failing.contains(&request.title) {
            return Err(GenerationError::RequestFailed(format!(
                "scripted failure for {}",
                request.title
            )));
        }
        Ok(LeafContent {
            description: Some(format!("Learn {}", request.title)),
            reading_text_regular: format!("{} (regular)", request.title),
            reading_text_short: format!("{} (short)", request.title),
            reading_text_long: format!("{} (long)", request.title),
            quiz_questions: vec![format!("What is {}?", request.title)],
            ..LeafContent::default()
        })
    }
}

pub fn text_leaf(title: &str) -> LeafNode {
    LeafNode::new(title, LeafKind::text()).with_readings(
        format!("{title} regular"),
        format!("{title} short"),
        format!("{title} long"),
    )
}

/// Scenario A: a root container with two text leaves.
pub fn two_leaf_tree(context: ContextId) -> Tree {
    Tree::new(
        context,
        ContainerNode::new("Root")
            .with_child(text_leaf("First"))
            .with_child(text_leaf("Second").with_quiz(vec!["Why?".to_string()])),
    )
}

pub fn leaf(title: &str) -> ProposedChild {
    ProposedChild::leaf(title, LeafType::Text)
}
