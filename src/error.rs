//! Error Types
//!
//! Typed failures surfaced by the configuration store core. Absent lookups
//! are not errors: they come back as `None` or an empty sequence.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for core configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigStoreError>;

/// Failures reported by an [`EntryStore`](crate::store::EntryStore).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Unique-key constraint violated on create.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Update addressed an entry id the store does not hold.
    #[error("entry not found: {0}")]
    MissingEntry(String),

    /// Backend could not serve the request (connectivity, shutdown).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failures reported by a [`ChangeNotifier`](crate::events::ChangeNotifier).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifyError {
    /// The channel behind the notifier has been shut down.
    #[error("notification channel closed")]
    Closed,

    /// The notifier refused the event.
    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Errors returned by the resolver, mutator, reconciler and service facade.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigStoreError {
    /// Malformed input, rejected before touching the store.
    #[error("validation error: {0}")]
    Validation(String),

    /// Store failure, propagated unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ConfigStoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the error came from caller input rather than the backend.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_converts_transparently() {
        let err: ConfigStoreError = StoreError::DuplicateKey("a.b".to_string()).into();
        assert_eq!(err.to_string(), "duplicate key: a.b");
        assert!(!err.is_validation());
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigStoreError::validation("key must not be empty");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "validation error: key must not be empty");
    }
}
