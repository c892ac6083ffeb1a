//! Management API Module
//!
//! HTTP surface over the configuration service: get, set, full dump,
//! migrate, change events and metrics.

pub mod api;
pub mod handlers;
pub mod server;
pub mod types;

pub use api::ManagementApi;
pub use handlers::AppState;
pub use server::ManagementServer;
pub use types::*;
