//! Metrics Module
//!
//! Prometheus counters for reads, writes, changes and reconciliation.

pub mod collector;

pub use collector::Metrics;
