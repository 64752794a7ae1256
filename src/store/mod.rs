//! Row storage
//!
//! Backends only see flat [`NodeRow`]s. A context is written once as an atomic
//! batch, read back whole, and deleted whole.

pub mod persistence;

pub use persistence::SledTreeStore;

use crate::codec::NodeRow;
use crate::error::StorageError;
use crate::types::ContextId;
use parking_lot::RwLock;
use std::collections::HashMap;

pub trait TreeStore: Send + Sync {
    /// Insert every row of one context. Fails if the context already has rows or
    /// any row belongs to another context; nothing is written on failure.
    fn insert_batch(&self, context: &ContextId, rows: &[NodeRow]) -> Result<(), StorageError>;

    /// All rows of a context ordered by order index; empty when none are stored.
    fn fetch(&self, context: &ContextId) -> Result<Vec<NodeRow>, StorageError>;

    /// Remove every row of a context, returning how many were removed.
    fn delete_context(&self, context: &ContextId) -> Result<usize, StorageError>;

    fn contains(&self, context: &ContextId) -> Result<bool, StorageError> {
        Ok(!self.fetch(context)?.is_empty())
    }
}

pub(crate) fn check_batch(context: &ContextId, rows: &[NodeRow]) -> Result<(), StorageError> {
    match rows.iter().find(|row| &row.context_id != context) {
        Some(row) => Err(StorageError::ForeignRow {
            expected: context.clone(),
            found: row.context_id.clone(),
        }),
        None => Ok(()),
    }
}

pub(crate) fn sort_rows(rows: &mut [NodeRow]) {
    rows.sort_by_key(|row| row.order_index);
}

/// Process-local store for tests and dry runs.
#[derive(Default)]
pub struct InMemoryTreeStore {
    contexts: RwLock<HashMap<ContextId, Vec<NodeRow>>>,
}

impl InMemoryTreeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TreeStore for InMemoryTreeStore {
    fn insert_batch(&self, context: &ContextId, rows: &[NodeRow]) -> Result<(), StorageError> {
        check_batch(context, rows)?;
        let mut contexts = self.contexts.write();
        if contexts.contains_key(context) {
            return Err(StorageError::ContextExists(context.clone()));
        }
        if !rows.is_empty() {
            contexts.insert(context.clone(), rows.to_vec());
        }
        Ok(())
    }

    fn fetch(&self, context: &ContextId) -> Result<Vec<NodeRow>, StorageError> {
        let mut rows = self
            .contexts
            .read()
            .get(context)
            .cloned()
            .unwrap_or_default();
        sort_rows(&mut rows);
        Ok(rows)
    }

    fn delete_context(&self, context: &ContextId) -> Result<usize, StorageError> {
        Ok(self
            .contexts
            .write()
            .remove(context)
            .map(|rows| rows.len())
            .unwrap_or(0))
    }
}
