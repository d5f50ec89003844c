//! In-memory document store, for tests and dry runs.

use super::{with_row_ids, ReferenceStore, StoreError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<BTreeMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Vec<Value>>>, StoreError> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

impl ReferenceStore for MemoryStore {
    fn collection_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn read_collection(&self, name: &str) -> Result<Vec<Value>, StoreError> {
        self.lock()?
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::CollectionMissing {
                name: name.to_string(),
            })
    }

    fn replace_collection(&self, name: &str, documents: Vec<Value>) -> Result<usize, StoreError> {
        let documents = with_row_ids(documents);
        let count = documents.len();
        self.lock()?.insert(name.to_string(), documents);
        Ok(count)
    }
}
