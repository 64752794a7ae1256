//! Coursetree: hierarchical course and template trees
//!
//! A strict tree of containers and leaves, a codec that flattens it into
//! order-indexed rows and rebuilds it, and a staged generator that grows a tree
//! level by level under a pluggable content generator.

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod provider;
pub mod service;
pub mod skeleton;
pub mod store;
pub mod tree;
pub mod types;

pub use codec::{flatten, flatten_tree, rebuild, NodeRow};
pub use error::{ConsistencyError, GenerationError, StorageError, TreeError, ValidationError};
pub use service::TreeService;
pub use tree::{ContainerNode, LeafKind, LeafNode, LeafType, Node, NodeType, Tree};
pub use types::{ContextId, ContextKind, NodeId};
