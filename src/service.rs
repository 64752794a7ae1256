//! Tree service
//!
//! Ties the validator, codec, store and scheduler together. Every write validates
//! the whole tree first; a tree that breaks an invariant never reaches storage.

use crate::codec::{flatten_tree, rebuild};
use crate::error::TreeError;
use crate::generation::{ContentGenerator, GenerationOutcome, GenerationPlan, PopulationScheduler};
use crate::skeleton::Skeleton;
use crate::store::TreeStore;
use crate::tree::validate::{check_tree, parse_tree};
use crate::tree::Tree;
use crate::types::ContextId;
use serde_json::Value;
use tracing::{info, instrument};

pub struct TreeService<S: TreeStore> {
    store: S,
}

impl<S: TreeStore> TreeService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate, flatten and insert `tree` as one batch.
    #[instrument(skip_all, fields(context = %tree.context))]
    pub fn save_tree(&self, tree: &Tree) -> Result<(), TreeError> {
        check_tree(tree)?;
        let rows = flatten_tree(tree);
        self.store.insert_batch(&tree.context, &rows)?;
        info!(rows = rows.len(), "Tree saved");
        Ok(())
    }

    /// `None` when the context has no tree yet.
    pub fn load_tree(&self, context: &ContextId) -> Result<Option<Tree>, TreeError> {
        let rows = self.store.fetch(context)?;
        Ok(rebuild(&rows)?)
    }

    /// Validate an externally supplied nested payload and store it under `context`.
    pub fn import_tree(&self, context: ContextId, payload: &Value) -> Result<Tree, TreeError> {
        let tree = parse_tree(payload, context)?;
        self.save_tree(&tree)?;
        Ok(tree)
    }

    /// Copy a stored template into a course with fresh node ids.
    ///
    /// `None` when the template has no tree.
    pub fn instantiate_template(
        &self,
        template: &ContextId,
        course: ContextId,
    ) -> Result<Option<Tree>, TreeError> {
        let Some(source) = self.load_tree(template)? else {
            return Ok(None);
        };
        let tree = source.instantiate(course);
        self.save_tree(&tree)?;
        info!(template = %template, course = %tree.context, "Template instantiated");
        Ok(Some(tree))
    }

    /// Remove a context's tree; returns the number of rows removed.
    pub fn delete_tree(&self, context: &ContextId) -> Result<usize, TreeError> {
        Ok(self.store.delete_context(context)?)
    }

    /// Run a full generation over `skeleton` and persist the result.
    ///
    /// A failed run leaves its partial state in `skeleton` and writes nothing.
    pub async fn generate_tree<G: ContentGenerator + ?Sized>(
        &self,
        generator: &G,
        plan: GenerationPlan,
        context: ContextId,
        skeleton: &mut Skeleton,
    ) -> Result<GenerationOutcome, TreeError> {
        let scheduler = PopulationScheduler::new(generator, plan)?;
        let outcome = scheduler.run(skeleton, context).await?;
        self.save_tree(&outcome.tree)?;
        Ok(outcome)
    }
}
