//! Per-user tree collections over a key-value store.
//!
//! This is the serialization boundary: one key per user holds the whole
//! collection as a JSON array. `load`/`save` are best-effort and never
//! fail; `try_load`/`try_save` surface storage problems to callers that
//! want them.

use crate::error::StorageError;
use crate::kv::KeyValueStore;
use crate::tree::Tree;

pub const STORAGE_KEY_PREFIX: &str = "treecraft.creator_trees.v1";

/// Storage key for a user's collection.
pub fn storage_key(user_id: &str) -> String {
    format!("{STORAGE_KEY_PREFIX}:{user_id}")
}

#[derive(Debug)]
pub struct TreeRepository<S> {
    store: S,
}

impl<S: KeyValueStore> TreeRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load a user's trees in storage order.
    ///
    /// Missing, unreadable or malformed data yields an empty collection.
    pub fn load(&self, user_id: &str) -> Vec<Tree> {
        self.try_load(user_id).unwrap_or_else(|error| {
            tracing::warn!(user_id, %error, "treating unreadable tree collection as empty");
            Vec::new()
        })
    }

    /// Persist the full collection, replacing the previous one. Failures
    /// are logged and dropped.
    pub fn save(&self, user_id: &str, trees: &[Tree]) {
        if let Err(error) = self.try_save(user_id, trees) {
            tracing::warn!(user_id, %error, "failed to persist tree collection");
        }
    }

    pub fn find(&self, user_id: &str, tree_id: &str) -> Option<Tree> {
        self.load(user_id)
            .into_iter()
            .find(|tree| tree.id == tree_id)
    }

    pub fn try_load(&self, user_id: &str) -> Result<Vec<Tree>, StorageError> {
        let key = storage_key(user_id);
        let Some(raw) = self.store.get(&key)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
            key,
            message: e.to_string(),
        })
    }

    pub fn try_save(&self, user_id: &str, trees: &[Tree]) -> Result<(), StorageError> {
        let raw =
            serde_json::to_string(trees).map_err(|e| StorageError::Serialize(e.to_string()))?;
        self.store.set(&storage_key(user_id), &raw)?;
        tracing::debug!(user_id, trees = trees.len(), "persisted tree collection");
        Ok(())
    }
}
