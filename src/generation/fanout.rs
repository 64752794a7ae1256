//! Leaf content fan-out: all leaves of one parent concurrently, parents in sequence.

use crate::error::{GenerationError, LeafFailure};
use crate::generation::generator::{ContentGenerator, LeafRequest, PlanContext};
use crate::skeleton::{Skeleton, SkeletonBody, SkeletonIndex};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutSummary {
    pub groups: usize,
    pub generated: usize,
    pub reused: usize,
}

pub struct LeafFanout<'g, G: ContentGenerator + ?Sized> {
    generator: &'g G,
}

impl<'g, G: ContentGenerator + ?Sized> LeafFanout<'g, G> {
    pub fn new(generator: &'g G) -> Self {
        Self { generator }
    }

    /// Fill every leaf without content. Stops at the first failed group; leaves
    /// completed before the failure keep their content in the skeleton.
    pub async fn run(
        &self,
        skeleton: &mut Skeleton,
        plan: &Arc<PlanContext>,
    ) -> Result<FanoutSummary, GenerationError> {
        let mut summary = FanoutSummary::default();
        for group in skeleton.groups_with_leaves() {
            let leaf_count = skeleton
                .children(group)
                .iter()
                .filter(|child| skeleton.node(**child).is_leaf())
                .count();
            let generated = self.generate_group(skeleton, group, plan).await?;
            summary.groups += 1;
            summary.generated += generated;
            summary.reused += leaf_count - generated;
        }
        info!(
            groups = summary.groups,
            generated = summary.generated,
            reused = summary.reused,
            "Leaf fan-out completed"
        );
        Ok(summary)
    }

    /// Generate the pending leaves of one parent, joining all sibling requests.
    ///
    /// Successful siblings are written back even when others fail; the failure
    /// lists every leaf that did not get content.
    pub async fn generate_group(
        &self,
        skeleton: &mut Skeleton,
        group: SkeletonIndex,
        plan: &Arc<PlanContext>,
    ) -> Result<usize, GenerationError> {
        let pending = skeleton.pending_leaves(group);
        if pending.is_empty() {
            return Ok(0);
        }

        let ancestor_path: Vec<String> = skeleton
            .upstream_titles(group)
            .into_iter()
            .map(str::to_string)
            .collect();
        let requests: Vec<(SkeletonIndex, LeafRequest)> = pending
            .iter()
            .filter_map(|index| {
                let node = skeleton.node(*index);
                match node.body {
                    SkeletonBody::Leaf { leaf_type, .. } => Some((
                        *index,
                        LeafRequest {
                            leaf_id: node.id.clone(),
                            title: node.title.clone(),
                            leaf_type,
                            ancestor_path: ancestor_path.clone(),
                            breadcrumb: skeleton.breadcrumb(*index),
                            plan: Arc::clone(plan),
                        },
                    )),
                    SkeletonBody::Container { .. } => None,
                }
            })
            .collect();

        let parent_id = skeleton.node(group).id.clone();
        debug!(parent = %parent_id, leaves = requests.len(), "Generating leaf group");

        let outcomes = join_all(requests.iter().map(|(index, request)| async move {
            (*index, self.generator.generate_leaf_content(request).await)
        }))
        .await;

        let total = outcomes.len();
        let mut failures = Vec::new();
        let mut generated = 0usize;
        for (index, outcome) in outcomes {
            match outcome {
                Ok(content) => {
                    skeleton.set_leaf_content(index, content);
                    generated += 1;
                }
                Err(err) => {
                    let leaf_id = skeleton.node(index).id.clone();
                    warn!(parent = %parent_id, leaf = %leaf_id, error = %err, "Leaf generation failed");
                    failures.push(LeafFailure {
                        leaf_id,
                        message: err.to_string(),
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(generated)
        } else {
            Err(GenerationError::LeafGroupFailed {
                parent_id,
                total,
                failures,
            })
        }
    }
}
