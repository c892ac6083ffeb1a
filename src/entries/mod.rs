//! Configuration Entries Module
//!
//! Key resolution, change-aware writes and default reconciliation over an
//! [`EntryStore`](crate::store::EntryStore).

pub mod mask;
pub mod mutator;
pub mod reconciler;
pub mod resolver;
pub mod service;
pub mod value;

pub use mask::{has_wildcard, KeyMask};
pub use mutator::{Mutator, SetOutcome, WriteDecision};
pub use reconciler::{ReconcileAction, ReconcileReport, Reconciler};
pub use resolver::{Resolved, Resolver};
pub use service::{ConfigService, GetResult, KeySelector, KeyValue, SetRequest, SetResult};
pub use value::values_equal;
