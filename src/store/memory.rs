//! In-Memory Entry Store

use super::{ConfigEntry, EntryId, EntryPatch, EntryQuery, EntryStore, NewEntry, now_millis};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct Inner {
    by_key: BTreeMap<String, ConfigEntry>,
    key_by_id: HashMap<EntryId, String>,
}

/// Entry store kept in process memory, listing in key order
#[derive(Default)]
pub struct MemoryEntryStore {
    inner: RwLock<Inner>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_key.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn find_one(&self, query: &EntryQuery) -> StoreResult<Option<ConfigEntry>> {
        let inner = self.inner.read().await;
        let found = match query {
            EntryQuery::Key(key) => inner.by_key.get(key).cloned(),
            EntryQuery::All => inner.by_key.values().next().cloned(),
        };
        Ok(found)
    }

    async fn find_all(&self, query: &EntryQuery) -> StoreResult<Vec<ConfigEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_key
            .values()
            .filter(|entry| query.matches(entry))
            .cloned()
            .collect())
    }

    async fn create(&self, fields: NewEntry) -> StoreResult<ConfigEntry> {
        let mut inner = self.inner.write().await;
        if inner.by_key.contains_key(&fields.key) {
            return Err(StoreError::DuplicateKey(fields.key));
        }

        let id = EntryId::generate();
        let now = now_millis();
        let entry = ConfigEntry {
            id: Some(id.clone()),
            key: fields.key,
            value: fields.value,
            is_default: fields.is_default,
            created_at: now,
            updated_at: now,
        };

        debug!(key = %entry.key, id = id.as_str(), "Created entry");
        inner.key_by_id.insert(id, entry.key.clone());
        inner.by_key.insert(entry.key.clone(), entry.clone());
        Ok(entry)
    }

    async fn update(&self, id: &EntryId, patch: EntryPatch) -> StoreResult<ConfigEntry> {
        let mut inner = self.inner.write().await;
        let key = inner
            .key_by_id
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::MissingEntry(id.to_string()))?;
        let entry = inner
            .by_key
            .get_mut(&key)
            .ok_or_else(|| StoreError::MissingEntry(id.to_string()))?;

        entry.value = patch.value;
        entry.is_default = patch.is_default;
        entry.updated_at = now_millis().max(entry.updated_at);

        debug!(key = %entry.key, id = id.as_str(), "Updated entry");
        Ok(entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_entry(key: &str, value: serde_json::Value) -> NewEntry {
        NewEntry {
            key: key.to_string(),
            value,
            is_default: false,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemoryEntryStore::new();
        let created = store.create(new_entry("a", json!(1))).await.unwrap();

        assert!(created.id.is_some());
        assert_eq!(created.created_at, created.updated_at);

        let found = store.find_one(&EntryQuery::key("a")).await.unwrap();
        assert_eq!(found, Some(created));
        assert_eq!(store.find_one(&EntryQuery::key("b")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected() {
        let store = MemoryEntryStore::new();
        store.create(new_entry("a", json!(1))).await.unwrap();

        let err = store.create(new_entry("a", json!(2))).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateKey("a".to_string()));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_keeps_created_at() {
        let store = MemoryEntryStore::new();
        let created = store.create(new_entry("a", json!(1))).await.unwrap();
        let id = created.id.clone().unwrap();

        let updated = store
            .update(&id, EntryPatch { value: json!(2), is_default: true })
            .await
            .unwrap();

        assert_eq!(updated.value, json!(2));
        assert!(updated.is_default);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let store = MemoryEntryStore::new();
        let id = EntryId::generate();
        let err = store
            .update(&id, EntryPatch { value: json!(1), is_default: false })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingEntry(_)));
    }

    #[tokio::test]
    async fn test_find_all_in_key_order() {
        let store = MemoryEntryStore::new();
        for key in ["b", "c", "a"] {
            store.create(new_entry(key, json!(null))).await.unwrap();
        }

        let keys: Vec<String> = store
            .find_all(&EntryQuery::All)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.key)
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }
}
