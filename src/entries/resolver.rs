//! Key Resolver
//!
//! Answers lookups by exact key, by a list of keys, or by wildcard mask.

use super::mask::{has_wildcard, KeyMask};
use crate::error::{ConfigResult, ConfigStoreError};
use crate::store::{ConfigEntry, EntryQuery, EntryStore};
use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Outcome of resolving a single key
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// Exact key lookup; `None` when the key is absent
    Exact(Option<ConfigEntry>),
    /// Wildcard lookup; empty when nothing matches
    Masked(Vec<ConfigEntry>),
}

impl Resolved {
    /// Flatten into a list of entries
    pub fn into_entries(self) -> Vec<ConfigEntry> {
        match self {
            Resolved::Exact(entry) => entry.into_iter().collect(),
            Resolved::Masked(entries) => entries,
        }
    }
}

/// Resolves keys and masks against an entry store
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn EntryStore>,
}

impl Resolver {
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self { store }
    }

    /// Resolve one key, delegating to mask matching when it has wildcards
    pub async fn get_one(&self, key: &str) -> ConfigResult<Resolved> {
        validate_key(key)?;

        if has_wildcard(key) {
            return Ok(Resolved::Masked(self.get_by_mask(key).await?));
        }

        Ok(Resolved::Exact(self.get_exact(key).await?))
    }

    /// Exact lookup only; wildcard characters are matched literally
    pub async fn get_exact(&self, key: &str) -> ConfigResult<Option<ConfigEntry>> {
        validate_key(key)?;
        Ok(self.store.find_one(&EntryQuery::key(key)).await?)
    }

    /// Resolve each key, flatten, and keep the first entry seen per key
    pub async fn get_many(&self, keys: &[String]) -> ConfigResult<Vec<ConfigEntry>> {
        for key in keys {
            validate_key(key)?;
        }

        let resolved = try_join_all(keys.iter().map(|key| self.get_one(key))).await?;

        let mut seen = HashSet::new();
        let entries: Vec<ConfigEntry> = resolved
            .into_iter()
            .flat_map(Resolved::into_entries)
            .filter(|entry| seen.insert(entry.key.clone()))
            .collect();

        debug!(requested = keys.len(), returned = entries.len(), "Resolved key list");
        Ok(entries)
    }

    /// Every entry whose key matches the mask
    pub async fn get_by_mask(&self, mask: &str) -> ConfigResult<Vec<ConfigEntry>> {
        let matcher = KeyMask::compile(mask)
            .map_err(|e| ConfigStoreError::validation(format!("invalid mask '{}': {}", mask, e)))?;

        let entries: Vec<ConfigEntry> = self
            .list_all()
            .await?
            .into_iter()
            .filter(|entry| matcher.matches(&entry.key))
            .collect();

        debug!(mask = matcher.as_str(), matched = entries.len(), "Resolved key mask");
        Ok(entries)
    }

    /// Unfiltered read of the whole store
    pub async fn list_all(&self) -> ConfigResult<Vec<ConfigEntry>> {
        Ok(self.store.find_all(&EntryQuery::All).await?)
    }
}

pub(crate) fn validate_key(key: &str) -> ConfigResult<()> {
    if key.is_empty() {
        return Err(ConfigStoreError::validation("key must not be empty"));
    }
    Ok(())
}
