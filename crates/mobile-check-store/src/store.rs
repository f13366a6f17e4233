//! The payload store contract and its in-memory backend.

use std::collections::HashMap;

use async_trait::async_trait;
use mobile_check_core::{EntryId, Result, StoredEntry};
use parking_lot::RwLock;

/// Trait for payload storage backends.
///
/// Every backend maps an [`EntryId`] to at most one payload. Identifiers are
/// generated by the store on [`put`](PayloadStore::put).
#[async_trait]
pub trait PayloadStore: Send + Sync {
    /// Stores a payload under a freshly generated identifier.
    async fn put(&self, payload: serde_json::Value) -> Result<EntryId>;

    /// Looks up a payload, leaving it in place.
    async fn get(&self, id: &EntryId) -> Result<Option<StoredEntry>>;

    /// Looks up a payload and removes it.
    ///
    /// When two callers race on the same identifier only one of them
    /// receives the entry.
    async fn take(&self, id: &EntryId) -> Result<Option<StoredEntry>>;

    /// Removes a payload. Returns `true` if one was present.
    async fn delete(&self, id: &EntryId) -> Result<bool>;

    /// Returns the number of stored payloads.
    async fn count(&self) -> Result<usize>;

    /// Short name of the backend, for logs and status output.
    fn backend_name(&self) -> &'static str;
}

/// In-memory payload store.
///
/// Contents are lost when the process exits and are not shared between
/// processes.
pub struct InMemoryStore {
    entries: RwLock<HashMap<EntryId, StoredEntry>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PayloadStore for InMemoryStore {
    async fn put(&self, payload: serde_json::Value) -> Result<EntryId> {
        let mut entries = self.entries.write();
        let mut id = EntryId::new();
        while entries.contains_key(&id) {
            id = EntryId::new();
        }
        entries.insert(id, StoredEntry::new(id, payload));
        Ok(id)
    }

    async fn get(&self, id: &EntryId) -> Result<Option<StoredEntry>> {
        Ok(self.entries.read().get(id).cloned())
    }

    async fn take(&self, id: &EntryId) -> Result<Option<StoredEntry>> {
        Ok(self.entries.write().remove(id))
    }

    async fn delete(&self, id: &EntryId) -> Result<bool> {
        Ok(self.entries.write().remove(id).is_some())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;

    /// Contract shared by every backend.
    pub(crate) async fn exercise_store(store: &dyn PayloadStore) {
        let payload = json!([[0, "Check light", 2, "Exterior", "North"]]);
        let id = store.put(payload.clone()).await.unwrap();

        let entry = store.get(&id).await.unwrap().unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.payload, payload);

        // Reads leave the entry in place.
        assert!(store.get(&id).await.unwrap().is_some());
        assert_eq!(store.count().await.unwrap(), 1);

        let taken = store.take(&id).await.unwrap().unwrap();
        assert_eq!(taken.payload, payload);
        assert!(store.take(&id).await.unwrap().is_none());
        assert!(store.get(&id).await.unwrap().is_none());

        let unknown = EntryId::new();
        assert!(store.get(&unknown).await.unwrap().is_none());
        assert!(!store.delete(&unknown).await.unwrap());

        let id = store.put(json!({"a": 1})).await.unwrap();
        assert!(store.delete(&id).await.unwrap());
        assert!(!store.delete(&id).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryStore::new();
        exercise_store(&store).await;
        assert_eq!(store.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_in_memory_ids_are_unique() {
        let store = InMemoryStore::new();
        let mut ids = HashSet::new();
        for i in 0..500 {
            ids.insert(store.put(json!(i)).await.unwrap());
        }
        assert_eq!(ids.len(), 500);
        assert_eq!(store.count().await.unwrap(), 500);
    }

    #[tokio::test]
    async fn test_in_memory_concurrent_take() {
        let store = std::sync::Arc::new(InMemoryStore::new());
        let id = store.put(json!({"once": true})).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = std::sync::Arc::clone(&store);
                tokio::spawn(async move { store.take(&id).await.unwrap() })
            })
            .collect();

        let mut hits = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                hits += 1;
            }
        }
        assert_eq!(hits, 1);
    }
}
