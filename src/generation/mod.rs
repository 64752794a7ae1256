//! Staged tree generation: plan, content generator capability, population
//! scheduler, leaf fan-out and the skeleton-to-tree converter.

pub mod convert;
pub mod fanout;
pub mod generator;
pub mod plan;
pub mod scheduler;

pub use convert::finalize;
pub use fanout::{FanoutSummary, LeafFanout};
pub use generator::{
    ClassificationRequest, ContentGenerator, LeafContent, LeafRequest, PlanContext, ProposedChild,
    ProposedKind,
};
pub use plan::{CourseCategory, GenerationPlan, LevelSummary, PopulationReport};
pub use scheduler::{GenerationOutcome, PopulationScheduler, PopulationState};
