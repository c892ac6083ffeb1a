//! Change-Aware Mutator
//!
//! Writes a single key only when its value actually differs. The mutator
//! never notifies; callers publish when [`SetOutcome::changed`] is true.
//!
//! `set` is read-then-write against the store and is not atomic: two
//! concurrent writers on one key can interleave and the later write wins
//! even if its "unchanged" check ran against stale data. The store's unique
//! constraint still prevents duplicate keys; a racing create surfaces as
//! `StoreError::DuplicateKey`.

use super::resolver::validate_key;
use super::value::values_equal;
use crate::error::{ConfigResult, StoreError};
use crate::store::{ConfigEntry, EntryId, EntryPatch, EntryQuery, EntryStore, NewEntry};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Result of a single write
#[derive(Debug, Clone, PartialEq)]
pub struct SetOutcome {
    pub entry: ConfigEntry,
    pub changed: bool,
    pub created: bool,
}

/// What a write has to do, given the current entry
#[derive(Debug, Clone, PartialEq)]
pub enum WriteDecision {
    Create,
    Update(EntryId),
    Unchanged,
}

/// Pure change detection: compare the stored entry against the new value
pub fn decide(existing: Option<&ConfigEntry>, value: &Value) -> Result<WriteDecision, StoreError> {
    let Some(entry) = existing else {
        return Ok(WriteDecision::Create);
    };

    if values_equal(&entry.value, value) {
        return Ok(WriteDecision::Unchanged);
    }

    entry
        .id
        .clone()
        .map(WriteDecision::Update)
        .ok_or_else(|| StoreError::MissingEntry(entry.key.clone()))
}

/// Applies key/value writes with write-if-different semantics
#[derive(Clone)]
pub struct Mutator {
    store: Arc<dyn EntryStore>,
}

impl Mutator {
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self { store }
    }

    /// Create or update `key`, skipping the write when the value is unchanged
    pub async fn set(&self, key: &str, value: Value, is_default: bool) -> ConfigResult<SetOutcome> {
        validate_key(key)?;

        let existing = self.store.find_one(&EntryQuery::key(key)).await?;

        match decide(existing.as_ref(), &value)? {
            WriteDecision::Unchanged => {
                debug!(key, "Value unchanged, skipping write");
                let entry = existing.ok_or_else(|| StoreError::MissingEntry(key.to_string()))?;
                Ok(SetOutcome {
                    entry,
                    changed: false,
                    created: false,
                })
            }
            WriteDecision::Update(id) => {
                let entry = self.store.update(&id, EntryPatch { value, is_default }).await?;
                debug!(key, is_default, "Updated config entry");
                Ok(SetOutcome {
                    entry,
                    changed: true,
                    created: false,
                })
            }
            WriteDecision::Create => {
                let entry = self
                    .store
                    .create(NewEntry {
                        key: key.to_string(),
                        value,
                        is_default,
                    })
                    .await?;
                debug!(key, is_default, "Created config entry");
                Ok(SetOutcome {
                    entry,
                    changed: true,
                    created: true,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryEntryStore;
    use serde_json::json;

    fn mutator() -> (Mutator, Arc<MemoryEntryStore>) {
        let store = Arc::new(MemoryEntryStore::new());
        (Mutator::new(store.clone()), store)
    }

    #[test]
    fn test_decide() {
        assert_eq!(decide(None, &json!(1)).unwrap(), WriteDecision::Create);

        let id = EntryId::generate();
        let entry = ConfigEntry {
            id: Some(id.clone()),
            key: "k".to_string(),
            value: json!({"a": 1}),
            is_default: true,
            created_at: 1,
            updated_at: 1,
        };
        assert_eq!(decide(Some(&entry), &json!({"a": 1.0})).unwrap(), WriteDecision::Unchanged);
        assert_eq!(decide(Some(&entry), &json!({"a": 2})).unwrap(), WriteDecision::Update(id));
    }

    #[tokio::test]
    async fn test_set_creates_missing_key() {
        let (mutator, store) = mutator();

        let outcome = mutator.set("a.b", json!(1), false).await.unwrap();
        assert!(outcome.changed);
        assert!(outcome.created);
        assert!(!outcome.entry.is_default);

        let stored = store.find_one(&EntryQuery::key("a.b")).await.unwrap().unwrap();
        assert_eq!(stored.value, json!(1));
    }

    #[tokio::test]
    async fn test_set_same_value_is_noop() {
        let (mutator, _store) = mutator();

        let first = mutator.set("k", json!([1, 2]), false).await.unwrap();
        let second = mutator.set("k", json!([1, 2]), false).await.unwrap();

        assert!(!second.changed);
        assert!(!second.created);
        assert_eq!(second.entry.updated_at, first.entry.updated_at);
        assert_eq!(second.entry, first.entry);
    }

    #[tokio::test]
    async fn test_set_different_value_updates() {
        let (mutator, _store) = mutator();

        let first = mutator.set("k", json!("x"), true).await.unwrap();
        let second = mutator.set("k", json!("y"), false).await.unwrap();

        assert!(second.changed);
        assert!(!second.created);
        assert!(!second.entry.is_default);
        assert_eq!(second.entry.value, json!("y"));
        assert_eq!(second.entry.created_at, first.entry.created_at);
        assert!(second.entry.updated_at >= first.entry.updated_at);
    }

    #[tokio::test]
    async fn test_empty_key_never_reaches_store() {
        let (mutator, store) = mutator();
        let err = mutator.set("", json!(1), false).await.unwrap_err();
        assert!(err.is_validation());
        assert!(store.is_empty().await);
    }
}
