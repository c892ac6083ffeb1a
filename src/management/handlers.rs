//! Management API Handlers

use super::types::*;
use crate::config::ManagementConfig;
use crate::entries::{ConfigService, GetResult, KeySelector, ReconcileReport, SetRequest, SetResult};
use crate::events::BroadcastNotifier;
use crate::metrics::Metrics;
use crate::store::now_millis;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::Stream;
use serde_json::Value;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tokio_stream::StreamExt;
use tracing::{info, warn};

/// Probed by the health check's store round-trip
const HEALTH_PROBE_KEY: &str = "confstore.health.probe";

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ConfigService>,
    pub events: Option<BroadcastNotifier>,
    pub metrics: Option<Arc<Metrics>>,
    pub settings: ManagementConfig,
    pub start_time: SystemTime,
}

impl AppState {
    pub fn new(service: Arc<ConfigService>, settings: ManagementConfig) -> Self {
        Self {
            service,
            events: None,
            metrics: None,
            settings,
            start_time: SystemTime::now(),
        }
    }

    pub fn with_events(mut self, events: BroadcastNotifier) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn timestamps(&self, query: &RenderQuery) -> bool {
        query.timestamps.unwrap_or(self.settings.include_timestamps)
    }
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<HealthStatus>>) {
    let mut checks = HashMap::new();

    let probe_start = Instant::now();
    let store_check = match state.service.resolver().get_exact(HEALTH_PROBE_KEY).await {
        Ok(_) => CheckResult {
            status: "healthy".to_string(),
            message: None,
            duration_ms: probe_start.elapsed().as_millis() as u64,
        },
        Err(e) => CheckResult {
            status: "unhealthy".to_string(),
            message: Some(e.to_string()),
            duration_ms: probe_start.elapsed().as_millis() as u64,
        },
    };
    let store_ok = store_check.status == "healthy";
    checks.insert("store".to_string(), store_check);

    let ready = state.service.is_ready();
    checks.insert(
        "reconciliation".to_string(),
        CheckResult {
            status: if ready { "healthy" } else { "pending" }.to_string(),
            message: Some(format!("{} default keys", state.service.defaults().len())),
            duration_ms: 0,
        },
    );

    let uptime = SystemTime::now()
        .duration_since(state.start_time)
        .unwrap_or_default()
        .as_secs();
    checks.insert(
        "server".to_string(),
        CheckResult {
            status: "healthy".to_string(),
            message: Some(format!("Up {}s, version {}", uptime, env!("CARGO_PKG_VERSION"))),
            duration_ms: 0,
        },
    );

    let (status, code) = if store_ok && ready {
        ("healthy", StatusCode::OK)
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE)
    };

    let health = HealthStatus {
        status: status.to_string(),
        checks,
        timestamp: now_millis(),
    };

    (code, Json(ApiResponse::success(health)))
}

/// Get one key or mask
pub async fn get_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(render): Query<RenderQuery>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let result = state.service.get(&KeySelector::One(key)).await?;
    Ok(Json(ApiResponse::success(render_get(result, state.timestamps(&render)))))
}

/// Get a key, mask, or list of them from a JSON body
pub async fn lookup_entries(
    State(state): State<AppState>,
    Query(render): Query<RenderQuery>,
    Json(request): Json<LookupRequest>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let result = state.service.get(&request.key).await?;
    Ok(Json(ApiResponse::success(render_get(result, state.timestamps(&render)))))
}

fn render_get(result: GetResult, timestamps: bool) -> Value {
    match result {
        GetResult::One(Some(entry)) => entry_json(&entry, timestamps),
        GetResult::One(None) => Value::Null,
        GetResult::Masked(entries) | GetResult::Many(entries) => entries_json(&entries, timestamps),
    }
}

/// Write one pair or a batch of pairs
pub async fn set_entries(
    State(state): State<AppState>,
    Query(render): Query<RenderQuery>,
    Json(request): Json<SetRequest>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let timestamps = state.timestamps(&render);

    let body = match state.service.set(request).await? {
        SetResult::One(entry) => entry_json(&entry, timestamps),
        SetResult::Batch(items) => {
            let items: Vec<SetItemResponse> = items
                .into_iter()
                .map(|item| match item {
                    Ok(entry) => SetItemResponse {
                        ok: Some(entry_json(&entry, timestamps)),
                        error: None,
                    },
                    Err(e) => SetItemResponse {
                        ok: None,
                        error: Some(e.to_string()),
                    },
                })
                .collect();
            serde_json::to_value(items).unwrap_or(Value::Null)
        }
    };

    Ok(Json(ApiResponse::success(body)))
}

/// Dump every entry
pub async fn list_entries(
    State(state): State<AppState>,
    Query(render): Query<RenderQuery>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let entries = state.service.all().await?;
    Ok(Json(ApiResponse::success(entries_json(&entries, state.timestamps(&render)))))
}

/// Run default reconciliation
pub async fn migrate(State(state): State<AppState>) -> Result<Json<ApiResponse<ReconcileReport>>, ApiError> {
    info!("Default reconciliation requested via management API");
    let report = state.service.migrate().await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Server-sent stream of change events
pub async fn stream_events(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let events = state.events.ok_or(StatusCode::NOT_FOUND)?;

    let stream = events.subscribe().filter_map(|item| match item {
        Ok(change) => Event::default()
            .event(change.topic.clone())
            .json_data(&change)
            .ok()
            .map(Ok),
        Err(e) => {
            warn!("Change event subscriber lagged: {}", e);
            None
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Prometheus text exposition
pub async fn export_metrics(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .as_ref()
        .map(|metrics| metrics.export_prometheus())
        .ok_or(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DefaultConfig;
    use crate::entries::KeyValue;
    use crate::events::NoopNotifier;
    use crate::store::MemoryEntryStore;
    use serde_json::json;

    fn create_test_state() -> AppState {
        let service = ConfigService::new(
            Arc::new(MemoryEntryStore::new()),
            Arc::new(NoopNotifier),
            Arc::new(DefaultConfig::from_pairs([("site.name", json!("demo"))])),
        );
        AppState::new(Arc::new(service), ManagementConfig::default())
    }

    #[tokio::test]
    async fn test_health_degraded_until_migrated() {
        let state = create_test_state();
        let (code, response) = health_check(State(state.clone())).await;
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.0.data.unwrap().status, "degraded");

        state.service.migrate().await.unwrap();
        let (code, response) = health_check(State(state)).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(response.0.data.unwrap().status, "healthy");
    }

    #[tokio::test]
    async fn test_get_entry_absent_is_null() {
        let state = create_test_state();
        let response = get_entry(State(state), Path("nope".to_string()), Query(RenderQuery::default()))
            .await
            .unwrap();
        assert!(response.0.success);
        assert_eq!(response.0.data, Some(Value::Null));
    }

    #[tokio::test]
    async fn test_batch_set_reports_per_item() {
        let state = create_test_state();
        let request = SetRequest::Batch(vec![
            KeyValue::new("a", json!(1)),
            KeyValue::new("b.*", json!(2)),
        ]);

        let response = set_entries(State(state), Query(RenderQuery::default()), Json(request))
            .await
            .unwrap();
        let items = response.0.data.unwrap();
        assert_eq!(items[0]["ok"]["key"], json!("a"));
        assert!(items[1]["error"].as_str().unwrap().contains("wildcard"));
    }

    #[tokio::test]
    async fn test_single_set_validation_error() {
        let state = create_test_state();
        let request = SetRequest::One(KeyValue::new("", json!(1)));
        let err = set_entries(State(state), Query(RenderQuery::default()), Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
