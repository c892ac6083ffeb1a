//! Confstore Library
//!
//! Centralized configuration store. Clients read and write named values,
//! built-in defaults are reconciled against stored overrides at startup, and
//! `config.changed` is published whenever a write actually changes a value.

pub mod config;
pub mod entries;
pub mod error;
pub mod events;
pub mod management;
pub mod metrics;
pub mod shutdown;
pub mod store;

pub use config::{DefaultConfig, ServiceConfig};
pub use entries::ConfigService;
pub use error::{ConfigStoreError, NotifyError, StoreError};
pub use shutdown::ShutdownCoordinator;
pub use store::{ConfigEntry, EntryStore, MemoryEntryStore};

/// Common error type for service setup and the binary
pub type Result<T> = anyhow::Result<T>;
