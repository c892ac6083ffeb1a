//! Metrics Collector

use prometheus::{Counter, Histogram, HistogramOpts, Registry, TextEncoder};
use std::time::Duration;
use tracing::error;

/// Collects and exports service metrics
pub struct Metrics {
    registry: Registry,

    get_requests_total: Counter,
    set_requests_total: Counter,
    changes_total: Counter,
    notify_failures_total: Counter,
    store_errors_total: Counter,
    reconcile_duration: Histogram,
}

impl Metrics {
    /// Create a collector with every metric registered
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let get_requests_total = Counter::new(
            "confstore_get_requests_total",
            "Total number of get requests",
        )?;
        let set_requests_total = Counter::new(
            "confstore_set_requests_total",
            "Total number of key/value writes requested",
        )?;
        let changes_total = Counter::new(
            "confstore_changes_total",
            "Total number of writes that changed a stored value",
        )?;
        let notify_failures_total = Counter::new(
            "confstore_notify_failures_total",
            "Total change notifications that failed to publish",
        )?;
        let store_errors_total = Counter::new(
            "confstore_store_errors_total",
            "Total entry store failures surfaced to callers",
        )?;
        let reconcile_duration = Histogram::with_opts(
            HistogramOpts::new(
                "confstore_reconcile_duration_seconds",
                "Duration of default reconciliation runs in seconds",
            )
            .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        )?;

        registry.register(Box::new(get_requests_total.clone()))?;
        registry.register(Box::new(set_requests_total.clone()))?;
        registry.register(Box::new(changes_total.clone()))?;
        registry.register(Box::new(notify_failures_total.clone()))?;
        registry.register(Box::new(store_errors_total.clone()))?;
        registry.register(Box::new(reconcile_duration.clone()))?;

        Ok(Self {
            registry,
            get_requests_total,
            set_requests_total,
            changes_total,
            notify_failures_total,
            store_errors_total,
            reconcile_duration,
        })
    }

    pub fn record_get(&self) {
        self.get_requests_total.inc();
    }

    pub fn record_set(&self, pairs: usize) {
        self.set_requests_total.inc_by(pairs as f64);
    }

    pub fn record_changes(&self, count: usize) {
        self.changes_total.inc_by(count as f64);
    }

    pub fn record_notify_failure(&self) {
        self.notify_failures_total.inc();
    }

    pub fn record_store_error(&self) {
        self.store_errors_total.inc();
    }

    pub fn observe_reconcile(&self, elapsed: Duration) {
        self.reconcile_duration.observe(elapsed.as_secs_f64());
    }

    pub fn get_changes_total(&self) -> u64 {
        self.changes_total.get() as u64
    }

    pub fn get_notify_failures(&self) -> u64 {
        self.notify_failures_total.get() as u64
    }

    pub fn get_store_errors(&self) -> u64 {
        self.store_errors_total.get() as u64
    }

    /// Prometheus text exposition of every registered metric
    pub fn export_prometheus(&self) -> String {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        match encoder.encode_to_string(&families) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode Prometheus metrics: {}", e);
                String::new()
            }
        }
    }
}
