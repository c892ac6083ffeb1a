//! Management API Routes

use super::handlers::*;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Management API router
pub struct ManagementApi;

impl ManagementApi {
    /// Create the management API router
    pub fn create_router(state: AppState) -> Router {
        let mut routes = Router::new()
            .route("/health", get(health_check))
            .route("/config", put(set_entries))
            .route("/config/:key", get(get_entry))
            .route("/lookup", post(lookup_entries));

        // Trusted-caller operations
        if state.settings.expose_internal {
            routes = routes
                .route("/config", get(list_entries))
                .route("/migrate", post(migrate));
        }

        if state.events.is_some() {
            routes = routes.route("/events", get(stream_events));
        }

        let mut app = Router::new().nest("/api/v1", routes.with_state(state.clone()));

        if state.metrics.is_some() {
            app = app.merge(
                Router::new()
                    .route("/metrics", get(export_metrics))
                    .with_state(state),
            );
        }

        app.layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DefaultConfig, ManagementConfig};
    use crate::entries::ConfigService;
    use crate::events::NoopNotifier;
    use crate::store::MemoryEntryStore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_state(expose_internal: bool) -> AppState {
        let service = ConfigService::new(
            Arc::new(MemoryEntryStore::new()),
            Arc::new(NoopNotifier),
            Arc::new(DefaultConfig::default()),
        );
        let settings = ManagementConfig {
            expose_internal,
            ..Default::default()
        };
        AppState::new(Arc::new(service), settings)
    }

    #[tokio::test]
    async fn test_internal_routes_hidden_when_disabled() {
        let app = ManagementApi::create_router(create_test_state(false));

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/migrate")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_internal_routes_mounted_when_enabled() {
        let app = ManagementApi::create_router(create_test_state(true));

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/migrate")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_route_absent_without_collector() {
        let app = ManagementApi::create_router(create_test_state(true));

        let request = Request::builder()
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
