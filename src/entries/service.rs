//! Configuration Service
//!
//! Request-facing facade over the resolver, mutator and reconciler. This is
//! the layer that decides to publish `config.changed`; the mutator only
//! reports whether a write changed anything.

use super::mask::has_wildcard;
use super::mutator::{Mutator, SetOutcome};
use super::reconciler::{ReconcileReport, Reconciler};
use super::resolver::{Resolved, Resolver};
use crate::config::DefaultConfig;
use crate::error::{ConfigResult, ConfigStoreError};
use crate::events::{ChangeNotifier, CONFIG_CHANGED_TOPIC};
use crate::metrics::Metrics;
use crate::store::{ConfigEntry, EntryStore};
use futures::future::join_all;
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Keys requested by a `get`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum KeySelector {
    One(String),
    Many(Vec<String>),
}

/// Answer to a `get`
#[derive(Debug, Clone, PartialEq)]
pub enum GetResult {
    /// Exact single key; `None` when absent
    One(Option<ConfigEntry>),
    /// Single wildcard key
    Masked(Vec<ConfigEntry>),
    /// Key list, deduplicated by key
    Many(Vec<ConfigEntry>),
}

/// One key/value pair to write
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeyValue {
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Payload of a `set`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SetRequest {
    One(KeyValue),
    Batch(Vec<KeyValue>),
}

/// Answer to a `set`
#[derive(Debug, Clone, PartialEq)]
pub enum SetResult {
    One(ConfigEntry),
    /// Per-pair results in request order; pairs succeed or fail independently
    Batch(Vec<ConfigResult<ConfigEntry>>),
}

/// Shared configuration service
pub struct ConfigService {
    resolver: Resolver,
    mutator: Mutator,
    reconciler: Reconciler,
    notifier: Arc<dyn ChangeNotifier>,
    metrics: Option<Arc<Metrics>>,
    ready: AtomicBool,
}

impl ConfigService {
    pub fn new(
        store: Arc<dyn EntryStore>,
        notifier: Arc<dyn ChangeNotifier>,
        defaults: Arc<DefaultConfig>,
    ) -> Self {
        let resolver = Resolver::new(store.clone());
        let mutator = Mutator::new(store);
        let reconciler = Reconciler::new(resolver.clone(), mutator.clone(), defaults);

        Self {
            resolver,
            mutator,
            reconciler,
            notifier,
            metrics: None,
            ready: AtomicBool::new(false),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn defaults(&self) -> &DefaultConfig {
        self.reconciler.defaults()
    }

    /// True once a reconciliation run has completed
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Look up one key, one mask, or a list of either
    pub async fn get(&self, selector: &KeySelector) -> ConfigResult<GetResult> {
        if let Some(metrics) = &self.metrics {
            metrics.record_get();
        }

        let result = match selector {
            KeySelector::One(key) => match self.resolver.get_one(key).await {
                Ok(Resolved::Exact(entry)) => Ok(GetResult::One(entry)),
                Ok(Resolved::Masked(entries)) => Ok(GetResult::Masked(entries)),
                Err(e) => Err(e),
            },
            KeySelector::Many(keys) => self.resolver.get_many(keys).await.map(GetResult::Many),
        };
        self.track(result)
    }

    /// Client write: always clears the default flag
    pub async fn set(&self, request: SetRequest) -> ConfigResult<SetResult> {
        match request {
            SetRequest::One(pair) => self.set_one(pair).await.map(SetResult::One),
            SetRequest::Batch(pairs) => {
                let results = join_all(pairs.into_iter().map(|pair| self.set_one(pair))).await;
                let failed = results.iter().filter(|r| r.is_err()).count();
                if failed > 0 {
                    warn!(failed, total = results.len(), "Batch write finished with failures");
                }
                Ok(SetResult::Batch(results))
            }
        }
    }

    /// Write a single pair and publish if it changed the stored value
    pub async fn set_one(&self, pair: KeyValue) -> ConfigResult<ConfigEntry> {
        if let Some(metrics) = &self.metrics {
            metrics.record_set(1);
        }

        if has_wildcard(&pair.key) {
            return Err(ConfigStoreError::validation(format!(
                "key '{}' contains a wildcard character",
                pair.key
            )));
        }

        let SetOutcome { entry, changed, .. } =
            self.track(self.mutator.set(&pair.key, pair.value, false).await)?;

        if changed {
            self.publish_change(&entry).await;
        }
        Ok(entry)
    }

    /// Full dump for trusted callers
    pub async fn all(&self) -> ConfigResult<Vec<ConfigEntry>> {
        self.track(self.resolver.list_all().await)
    }

    /// Reconcile defaults into the store and publish what changed.
    ///
    /// Changes committed before a failure are still published; the run then
    /// returns the first failure and the service stays not ready.
    pub async fn migrate(&self) -> ConfigResult<ReconcileReport> {
        let started = Instant::now();
        let report = self.reconciler.reconcile().await;

        if let Some(metrics) = &self.metrics {
            metrics.observe_reconcile(started.elapsed());
        }

        for entry in &report.changes {
            self.publish_change(entry).await;
        }

        if !report.is_complete() {
            warn!(
                failed = report.failed.len(),
                committed = report.changes.len(),
                "Default reconciliation incomplete"
            );
        }
        let report = self.track(report.into_result())?;

        if !self.ready.swap(true, Ordering::AcqRel) {
            info!(
                defaults = self.defaults().len(),
                created = report.created.len(),
                updated = report.updated.len(),
                "Default configuration reconciled, service ready"
            );
        }
        Ok(report)
    }

    async fn publish_change(&self, entry: &ConfigEntry) {
        if let Some(metrics) = &self.metrics {
            metrics.record_changes(1);
        }

        // the write is already committed; a failed publish is only logged
        if let Err(e) = self.notifier.publish(CONFIG_CHANGED_TOPIC, entry).await {
            warn!(key = %entry.key, error = %e, "Failed to publish config change");
            if let Some(metrics) = &self.metrics {
                metrics.record_notify_failure();
            }
        }
    }

    fn track<T>(&self, result: ConfigResult<T>) -> ConfigResult<T> {
        if let (Err(ConfigStoreError::Store(e)), Some(metrics)) = (&result, &self.metrics) {
            warn!(error = %e, "Entry store operation failed");
            metrics.record_store_error();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoopNotifier;
    use crate::store::MemoryEntryStore;
    use serde_json::json;

    fn service(defaults: DefaultConfig) -> ConfigService {
        ConfigService::new(
            Arc::new(MemoryEntryStore::new()),
            Arc::new(NoopNotifier),
            Arc::new(defaults),
        )
        .with_metrics(Arc::new(Metrics::new().unwrap()))
    }

    #[test]
    fn test_request_shapes_deserialize() {
        let one: KeySelector = serde_json::from_value(json!("a.b")).unwrap();
        assert_eq!(one, KeySelector::One("a.b".to_string()));
        let many: KeySelector = serde_json::from_value(json!(["a", "b.*"])).unwrap();
        assert!(matches!(many, KeySelector::Many(ref keys) if keys.len() == 2));

        let set: SetRequest = serde_json::from_value(json!({"key": "a", "value": {"x": 1}})).unwrap();
        assert_eq!(set, SetRequest::One(KeyValue::new("a", json!({"x": 1}))));
        let batch: SetRequest = serde_json::from_value(json!([{"key": "a"}, {"key": "b", "value": 2}])).unwrap();
        assert_eq!(
            batch,
            SetRequest::Batch(vec![KeyValue::new("a", Value::Null), KeyValue::new("b", json!(2))])
        );
    }

    #[tokio::test]
    async fn test_set_rejects_masked_key() {
        let service = service(DefaultConfig::default());
        let err = service.set_one(KeyValue::new("svc.*", json!(1))).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_batch_failures_are_independent() {
        let service = service(DefaultConfig::default());
        let result = service
            .set(SetRequest::Batch(vec![
                KeyValue::new("a", json!(1)),
                KeyValue::new("", json!(2)),
                KeyValue::new("c", json!(3)),
            ]))
            .await
            .unwrap();

        let SetResult::Batch(items) = result else {
            panic!("expected batch result");
        };
        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(items[1].as_ref().unwrap_err().is_validation());
        assert_eq!(items[2].as_ref().unwrap().key, "c");
        assert_eq!(service.all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_client_write_clears_default_flag() {
        let service = service(DefaultConfig::from_pairs([("x", json!(10))]));
        service.migrate().await.unwrap();

        let entry = service.set_one(KeyValue::new("x", json!(11))).await.unwrap();
        assert!(!entry.is_default);

        let report = service.migrate().await.unwrap();
        assert_eq!(report.overridden, 1);
        match service.get(&KeySelector::One("x".to_string())).await.unwrap() {
            GetResult::One(Some(entry)) => assert_eq!(entry.value, json!(11)),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ready_after_migrate() {
        let service = service(DefaultConfig::default());
        assert!(!service.is_ready());
        service.migrate().await.unwrap();
        assert!(service.is_ready());
    }
}
