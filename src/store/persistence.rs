//! Sled-backed row store

use crate::codec::NodeRow;
use crate::error::StorageError;
use crate::store::{check_batch, sort_rows, TreeStore};
use crate::types::ContextId;
use std::path::Path;
use tracing::debug;

/// Rows are bincode values keyed by `<context>\0<node id>`, so one prefix scan
/// yields a whole context.
pub struct SledTreeStore {
    db: sled::Db,
}

fn sled_error(action: &str, e: sled::Error) -> StorageError {
    StorageError::IoError(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("Failed to {}: {}", action, e),
    ))
}

fn context_prefix(context: &ContextId) -> Vec<u8> {
    let mut prefix = context.to_string().into_bytes();
    prefix.push(0);
    prefix
}

impl SledTreeStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| sled_error("open sled database", e))?;
        Ok(Self { db })
    }

    /// Throwaway database, removed when dropped.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| sled_error("open temporary sled database", e))?;
        Ok(Self { db })
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db
            .flush()
            .map_err(|e| sled_error("flush sled database", e))?;
        Ok(())
    }
}

impl TreeStore for SledTreeStore {
    fn insert_batch(&self, context: &ContextId, rows: &[NodeRow]) -> Result<(), StorageError> {
        check_batch(context, rows)?;
        let prefix = context_prefix(context);
        if self.db.scan_prefix(&prefix).next().is_some() {
            return Err(StorageError::ContextExists(context.clone()));
        }

        let mut batch = sled::Batch::default();
        for row in rows {
            let mut key = prefix.clone();
            key.extend_from_slice(row.id.as_str().as_bytes());
            let value = bincode::serialize(row).map_err(|e| {
                StorageError::Encoding(format!("Failed to serialize row {}: {}", row.id, e))
            })?;
            batch.insert(key, value);
        }

        self.db
            .apply_batch(batch)
            .map_err(|e| sled_error("apply row batch", e))?;
        debug!(context = %context, rows = rows.len(), "Inserted row batch");
        Ok(())
    }

    fn fetch(&self, context: &ContextId) -> Result<Vec<NodeRow>, StorageError> {
        let mut rows = Vec::new();
        for entry in self.db.scan_prefix(context_prefix(context)) {
            let (_, value) = entry.map_err(|e| sled_error("read row", e))?;
            let row: NodeRow = bincode::deserialize(&value)
                .map_err(|e| StorageError::Encoding(format!("Failed to deserialize row: {}", e)))?;
            rows.push(row);
        }
        sort_rows(&mut rows);
        Ok(rows)
    }

    fn delete_context(&self, context: &ContextId) -> Result<usize, StorageError> {
        let mut batch = sled::Batch::default();
        let mut removed = 0usize;
        for entry in self.db.scan_prefix(context_prefix(context)).keys() {
            let key = entry.map_err(|e| sled_error("read row key", e))?;
            batch.remove(key);
            removed += 1;
        }
        self.db
            .apply_batch(batch)
            .map_err(|e| sled_error("delete context rows", e))?;
        debug!(context = %context, rows = removed, "Deleted context");
        Ok(removed)
    }
}
