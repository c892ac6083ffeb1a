//! Entry Store Module
//!
//! Keyed record storage the configuration core reads and writes. The store
//! enforces key uniqueness and owns id and timestamp assignment.

pub mod memory;
pub mod types;

pub use memory::MemoryEntryStore;
pub use types::*;

use crate::error::StoreResult;
use async_trait::async_trait;

/// Durable keyed record storage with a unique constraint on `key`
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// First entry matching the query, if any
    async fn find_one(&self, query: &EntryQuery) -> StoreResult<Option<ConfigEntry>>;

    /// Every entry matching the query
    async fn find_all(&self, query: &EntryQuery) -> StoreResult<Vec<ConfigEntry>>;

    /// Insert a new entry; fails with `DuplicateKey` if the key exists
    async fn create(&self, fields: NewEntry) -> StoreResult<ConfigEntry>;

    /// Overwrite value and default flag of an existing entry
    async fn update(&self, id: &EntryId, patch: EntryPatch) -> StoreResult<ConfigEntry>;
}
