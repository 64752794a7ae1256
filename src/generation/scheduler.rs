//! Population scheduler
//!
//! Drives a skeleton through `Init -> ExpandLevel <-> CheckTermination ->
//! GenerateLeaves -> Done`. The scheduler is the only mutator of the skeleton it
//! is given and awaits every generator call before touching the skeleton again.

use crate::error::{GenerationError, TreeError};
use crate::generation::convert::finalize;
use crate::generation::fanout::LeafFanout;
use crate::generation::generator::{
    ClassificationRequest, ContentGenerator, PlanContext, ProposedChild, ProposedKind,
};
use crate::generation::plan::{GenerationPlan, LevelSummary, PopulationReport};
use crate::skeleton::{NewChild, Skeleton, SkeletonIndex};
use crate::tree::validate::check_tree;
use crate::tree::{LeafType, Tree};
use crate::types::ContextId;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationState {
    Init,
    ExpandLevel,
    CheckTermination,
    GenerateLeaves,
    Done,
}

#[derive(Debug)]
pub struct GenerationOutcome {
    pub tree: Tree,
    pub report: PopulationReport,
}

pub struct PopulationScheduler<'g, G: ContentGenerator + ?Sized> {
    generator: &'g G,
    plan: GenerationPlan,
    context: Arc<PlanContext>,
}

impl<'g, G: ContentGenerator + ?Sized> PopulationScheduler<'g, G> {
    pub fn new(generator: &'g G, plan: GenerationPlan) -> Result<Self, GenerationError> {
        plan.validate()?;
        let context = Arc::new(PlanContext::from(&plan));
        Ok(Self {
            generator,
            plan,
            context,
        })
    }

    pub fn plan(&self) -> &GenerationPlan {
        &self.plan
    }

    /// A fresh skeleton whose root carries the plan title.
    pub fn initial_skeleton(&self) -> Skeleton {
        Skeleton::new(self.plan.title.clone())
    }

    /// Grow `skeleton` until nothing is eligible, fill every leaf and convert.
    ///
    /// On error the skeleton keeps everything produced so far and can be
    /// checkpointed and passed back in to resume.
    #[instrument(skip_all, fields(plan = %self.plan.title, max_depth = self.plan.max_depth))]
    pub async fn run(
        &self,
        skeleton: &mut Skeleton,
        context: ContextId,
    ) -> Result<GenerationOutcome, TreeError> {
        let mut report = PopulationReport::new(self.plan.title.clone());
        let mut state = PopulationState::Init;

        loop {
            debug!(state = ?state, "Population state");
            state = match state {
                PopulationState::Init => {
                    info!(
                        nodes = skeleton.node_count(),
                        eligible = skeleton.containers_to_populate().len(),
                        "Population started"
                    );
                    PopulationState::CheckTermination
                }
                PopulationState::ExpandLevel => {
                    let summary = self
                        .expand_level(skeleton, report.iterations() + 1)
                        .await?;
                    report.level_summaries.push(summary);
                    PopulationState::CheckTermination
                }
                PopulationState::CheckTermination => {
                    if skeleton.containers_to_populate().is_empty() {
                        PopulationState::GenerateLeaves
                    } else {
                        PopulationState::ExpandLevel
                    }
                }
                PopulationState::GenerateLeaves => {
                    let summary = LeafFanout::new(self.generator)
                        .run(skeleton, &self.context)
                        .await?;
                    report.leaf_groups = summary.groups;
                    report.leaves_generated = summary.generated;
                    report.leaves_reused = summary.reused;
                    PopulationState::Done
                }
                PopulationState::Done => break,
            };
        }

        let tree = finalize(skeleton, context)?;
        check_tree(&tree)?;
        report.finished_at = Some(Utc::now());
        info!(
            iterations = report.iterations(),
            nodes = tree.node_count(),
            depth = tree.depth(),
            "Population finished"
        );
        Ok(GenerationOutcome { tree, report })
    }

    /// Classify the children of every currently eligible container, in
    /// breadth-first order.
    pub async fn expand_level(
        &self,
        skeleton: &mut Skeleton,
        iteration: usize,
    ) -> Result<LevelSummary, TreeError> {
        let eligible = skeleton.containers_to_populate();
        let mut summary = LevelSummary {
            iteration,
            ..LevelSummary::default()
        };

        for container in eligible {
            let request = self.classification_request(skeleton, container);
            let proposed = self.generator.classify_children(&request).await?;
            let children = self.normalize(request.source_level, proposed, &mut summary);
            skeleton.attach_children(container, children)?;
            summary.containers_expanded += 1;
        }

        info!(
            iteration,
            expanded = summary.containers_expanded,
            containers = summary.containers_created,
            leaves = summary.leaves_created,
            cutoffs = summary.cutoff_count,
            coerced = summary.coerced_count,
            "Level expanded"
        );
        Ok(summary)
    }

    fn classification_request(
        &self,
        skeleton: &Skeleton,
        container: SkeletonIndex,
    ) -> ClassificationRequest {
        let node = skeleton.node(container);
        let source_level = skeleton.level(container);
        ClassificationRequest {
            container_id: node.id.clone(),
            title: node.title.clone(),
            breadcrumb: skeleton.breadcrumb(container),
            source_level,
            target_level: source_level + 1,
            leaves_only: self.at_depth_bound(source_level),
            structure: skeleton.relevant_structure(container),
            plan: Arc::clone(&self.context),
        }
    }

    /// Children of a container at `source_level` may not be containers once
    /// they would sit at or below the plan's maximum depth.
    fn at_depth_bound(&self, source_level: usize) -> bool {
        source_level + 1 >= self.plan.max_depth
    }

    fn fallback_leaf_type(&self) -> LeafType {
        self.context
            .allowed_leaf_types
            .first()
            .copied()
            .unwrap_or(LeafType::Text)
    }

    /// Apply depth coercion, leaf-type normalisation and the item cap.
    fn normalize(
        &self,
        source_level: usize,
        proposed: Vec<ProposedChild>,
        summary: &mut LevelSummary,
    ) -> Vec<NewChild> {
        let leaves_only = self.at_depth_bound(source_level);
        let mut containers = 0usize;

        proposed
            .into_iter()
            .map(|child| match child.kind {
                ProposedKind::Container if leaves_only => {
                    summary.coerced_count += 1;
                    summary.leaves_created += 1;
                    NewChild::Leaf {
                        title: child.title,
                        leaf_type: self.fallback_leaf_type(),
                    }
                }
                ProposedKind::Container => {
                    let do_not_populate = self
                        .plan
                        .item_cap
                        .is_some_and(|cap| containers >= cap);
                    containers += 1;
                    summary.containers_created += 1;
                    if do_not_populate {
                        summary.cutoff_count += 1;
                    }
                    NewChild::Container {
                        title: child.title,
                        do_not_populate,
                    }
                }
                ProposedKind::Leaf => {
                    let leaf_type = child
                        .leaf_type
                        .filter(|leaf_type| self.context.allowed_leaf_types.contains(leaf_type))
                        .unwrap_or_else(|| self.fallback_leaf_type());
                    summary.leaves_created += 1;
                    NewChild::Leaf {
                        title: child.title,
                        leaf_type,
                    }
                }
            })
            .collect()
    }
}
