//! Default Reconciler
//!
//! Seeds missing keys from the built-in defaults and refreshes entries that
//! are still default-sourced but have drifted. Client overrides always win.

use super::mutator::{Mutator, SetOutcome};
use super::resolver::Resolver;
use super::value::values_equal;
use crate::config::DefaultConfig;
use crate::error::{ConfigResult, ConfigStoreError};
use crate::store::ConfigEntry;
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What reconciliation did with one default key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Key was absent and has been created from the default
    Created,
    /// Default-sourced entry drifted and was reset to the default
    Refreshed,
    /// Default-sourced entry already holds the default
    Unchanged,
    /// Client override present, left untouched
    Overridden,
}

/// Summary of a reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: usize,
    pub overridden: usize,
    /// Keys whose reconciliation hit a store failure
    pub failed: Vec<String>,
    /// Entries whose stored value changed during the run
    #[serde(skip)]
    pub changes: Vec<ConfigEntry>,
    /// First failure in key order; set whenever `failed` is non-empty
    #[serde(skip)]
    pub error: Option<ConfigStoreError>,
}

impl ReconcileReport {
    pub fn changed_count(&self) -> usize {
        self.created.len() + self.updated.len()
    }

    fn record(&mut self, key: &str, action: ReconcileAction, entry: Option<ConfigEntry>) {
        match action {
            ReconcileAction::Created => self.created.push(key.to_string()),
            ReconcileAction::Refreshed => self.updated.push(key.to_string()),
            ReconcileAction::Unchanged => self.unchanged += 1,
            ReconcileAction::Overridden => self.overridden += 1,
        }
        self.changes.extend(entry);
    }

    fn record_failure(&mut self, key: &str, error: ConfigStoreError) {
        warn!(key, error = %error, "Failed to reconcile default config");
        self.failed.push(key.to_string());
        self.error.get_or_insert(error);
    }

    /// Whether every default key was reconciled
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Turn a partial run into its first failure
    pub fn into_result(mut self) -> ConfigResult<Self> {
        match self.error.take() {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }
}

/// Merges the default configuration into the store
#[derive(Clone)]
pub struct Reconciler {
    resolver: Resolver,
    mutator: Mutator,
    defaults: Arc<DefaultConfig>,
}

impl Reconciler {
    pub fn new(resolver: Resolver, mutator: Mutator, defaults: Arc<DefaultConfig>) -> Self {
        Self {
            resolver,
            mutator,
            defaults,
        }
    }

    pub fn defaults(&self) -> &DefaultConfig {
        &self.defaults
    }

    /// Reconcile every default key.
    ///
    /// Keys are independent: a store failure on one key does not stop the
    /// others, and writes that did commit are still listed in `changes`.
    pub async fn reconcile(&self) -> ReconcileReport {
        let results = join_all(
            self.defaults
                .iter()
                .map(|(key, value)| async move { (key, self.reconcile_key(key, value).await) }),
        )
        .await;

        let mut report = ReconcileReport::default();
        for (key, result) in results {
            match result {
                Ok((action, entry)) => report.record(key, action, entry),
                Err(e) => report.record_failure(key, e),
            }
        }
        report.created.sort();
        report.updated.sort();

        debug!(
            created = report.created.len(),
            updated = report.updated.len(),
            unchanged = report.unchanged,
            overridden = report.overridden,
            failed = report.failed.len(),
            "Reconciliation finished"
        );
        report
    }

    async fn reconcile_key(
        &self,
        key: &str,
        default: &Value,
    ) -> ConfigResult<(ReconcileAction, Option<ConfigEntry>)> {
        match self.resolver.get_exact(key).await? {
            None => {
                info!("Save new config: \"{}\" = {}", key, default);
                let outcome = self.mutator.set(key, default.clone(), true).await?;
                Ok(classify(outcome))
            }
            Some(entry) if !entry.is_default => Ok((ReconcileAction::Overridden, None)),
            Some(entry) if values_equal(&entry.value, default) => Ok((ReconcileAction::Unchanged, None)),
            Some(_) => {
                info!("Update default config: \"{}\" = {}", key, default);
                let outcome = self.mutator.set(key, default.clone(), true).await?;
                Ok(classify(outcome))
            }
        }
    }
}

fn classify(outcome: SetOutcome) -> (ReconcileAction, Option<ConfigEntry>) {
    match (outcome.created, outcome.changed) {
        (true, _) => (ReconcileAction::Created, Some(outcome.entry)),
        (false, true) => (ReconcileAction::Refreshed, Some(outcome.entry)),
        (false, false) => (ReconcileAction::Unchanged, None),
    }
}
