//! Configuration Module
//!
//! Service settings loading and validation, plus the default-value source
//! reconciled into the store at startup.

pub mod defaults;
pub mod manager;
pub mod types;

pub use defaults::DefaultConfig;
pub use manager::ConfigManager;
pub use types::*;
