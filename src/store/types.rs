//! Entry Store Types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Store-assigned identity of an entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(String);

impl EntryId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single configuration record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntry {
    #[serde(skip)]
    pub id: Option<EntryId>,
    pub key: String,
    pub value: Value,
    pub is_default: bool,
    /// Milliseconds since the Unix epoch, set once on creation
    pub created_at: u64,
    /// Milliseconds since the Unix epoch, refreshed on every update
    pub updated_at: u64,
}

/// Lookup filter accepted by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryQuery {
    All,
    Key(String),
}

impl EntryQuery {
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    pub fn matches(&self, entry: &ConfigEntry) -> bool {
        match self {
            EntryQuery::All => true,
            EntryQuery::Key(key) => entry.key == *key,
        }
    }
}

/// Fields for a new entry; the store fills in id and timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub key: String,
    pub value: Value,
    pub is_default: bool,
}

/// Fields written by an update
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPatch {
    pub value: Value,
    pub is_default: bool,
}

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
