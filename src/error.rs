//! Error types for course and template trees.

use crate::types::{ContextId, NodeId};
use thiserror::Error;

/// A malformed or incomplete node shape in an incoming nested payload.
///
/// `path` locates the offending node, e.g. `root.children[2].children[0]`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{path}: expected a JSON object")]
    NotAnObject { path: String },

    #[error("{path}: missing required field `{field}`")]
    MissingField { path: String, field: &'static str },

    #[error("{path}: field `{field}` must be {expected}")]
    WrongType {
        path: String,
        field: &'static str,
        expected: &'static str,
    },

    #[error("{path}: field `{field}` cannot be empty")]
    EmptyField { path: String, field: &'static str },

    #[error("{path}: unknown node type `{value}`")]
    UnknownNodeType { path: String, value: String },

    #[error("{path}: unknown leaf type `{value}`")]
    UnknownLeafType { path: String, value: String },

    #[error("{path}: leaf nodes cannot carry a children collection")]
    LeafWithChildren { path: String },

    #[error("{path}: container has null children after population")]
    NullChildren { path: String },

    #[error("{path}: duplicate node id `{id}`")]
    DuplicateId { path: String, id: String },

    #[error("{path}: nesting exceeds the maximum depth of {limit}")]
    DepthExceeded { path: String, limit: usize },
}

/// The codec or converter found a structure that cannot form a single-rooted tree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("No root row (row with a null parent) among {row_count} rows")]
    MissingRoot { row_count: usize },

    #[error("Multiple root rows: {ids:?}")]
    MultipleRoots { ids: Vec<NodeId> },

    #[error("Row {id} references missing parent {parent_id}")]
    OrphanRow { id: NodeId, parent_id: NodeId },

    #[error("Row {id} is attached under leaf {parent_id}")]
    ChildUnderLeaf { id: NodeId, parent_id: NodeId },

    #[error("Duplicate node id {0}")]
    DuplicateNodeId(NodeId),

    #[error("Siblings under {parent_id} share order index {order_index}")]
    DuplicateOrderIndex { parent_id: NodeId, order_index: u32 },

    #[error("{count} rows are not reachable from the root")]
    UnreachableRows { count: usize },

    #[error("Leaf row {id} is missing column `{column}`")]
    MissingLeafColumn { id: NodeId, column: &'static str },

    #[error("Leaf row {id} has invalid leaf data: {message}")]
    InvalidLeafData { id: NodeId, message: String },

    #[error("Container {id} was never populated")]
    UnpopulatedContainer { id: NodeId },

    #[error("Container {id} is already populated")]
    AlreadyPopulated { id: NodeId },

    #[error("Node {id} is not a container")]
    NotAContainer { id: NodeId },

    #[error("Skeleton index {index} is out of range")]
    DanglingIndex { index: usize },

    #[error("Invalid skeleton checkpoint: {0}")]
    InvalidCheckpoint(String),

    #[error("Row {id} belongs to {found}, expected {expected}")]
    ContextMismatch {
        id: NodeId,
        expected: ContextId,
        found: ContextId,
    },
}

/// One failed leaf inside a sibling group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafFailure {
    pub leaf_id: NodeId,
    pub message: String,
}

/// The content generation backend failed or answered with something unusable.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Provider request failed: {0}")]
    RequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    AuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Provider model not found: {0}")]
    ModelNotFound(String),

    #[error("Unparseable generator response: {0}")]
    Unparseable(String),

    #[error("Generation plan rejected: {0}")]
    InvalidPlan(String),

    #[error("{} of {total} leaves under {parent_id} failed", .failures.len())]
    LeafGroupFailed {
        parent_id: NodeId,
        total: usize,
        failures: Vec<LeafFailure>,
    },
}

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Context {0} already has a stored tree")]
    ContextExists(ContextId),

    #[error("Rows for {expected} contain a row for {found}")]
    ForeignRow { expected: ContextId, found: ContextId },

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Storage encoding error: {0}")]
    Encoding(String),
}

/// Umbrella error returned by service-level operations.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Invalid tree: {0}")]
    Validation(#[from] ValidationError),

    #[error("Inconsistent tree: {0}")]
    Consistency(#[from] ConsistencyError),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl TreeError {
    /// Only backend failures are worth retrying; a broken tree stays broken.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TreeError::Generation(_))
    }
}

impl From<config::ConfigError> for TreeError {
    fn from(err: config::ConfigError) -> Self {
        TreeError::ConfigError(err.to_string())
    }
}
