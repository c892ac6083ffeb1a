//! Management API Types

use crate::entries::KeySelector;
use crate::error::{ConfigStoreError, StoreError};
use crate::store::{now_millis, ConfigEntry};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: now_millis(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: now_millis(),
        }
    }
}

/// Body of `POST /lookup`
#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    pub key: KeySelector,
}

/// Response shaping options
#[derive(Debug, Default, Deserialize)]
pub struct RenderQuery {
    pub timestamps: Option<bool>,
}

/// Outcome of one pair in a batch write
#[derive(Debug, Serialize)]
pub struct SetItemResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub checks: HashMap<String, CheckResult>,
    pub timestamp: u64,
}

/// Individual health check result
#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub status: String,
    pub message: Option<String>,
    pub duration_ms: u64,
}

/// Wire form of an entry, with timestamps only when asked for
pub fn entry_json(entry: &ConfigEntry, timestamps: bool) -> Value {
    let mut body = json!({
        "key": entry.key,
        "value": entry.value,
        "isDefault": entry.is_default,
    });
    if timestamps {
        body["createdAt"] = json!(entry.created_at);
        body["updatedAt"] = json!(entry.updated_at);
    }
    body
}

pub fn entries_json(entries: &[ConfigEntry], timestamps: bool) -> Value {
    Value::Array(entries.iter().map(|e| entry_json(e, timestamps)).collect())
}

/// Core error carried to an HTTP response
#[derive(Debug)]
pub struct ApiError(pub ConfigStoreError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ConfigStoreError::Validation(_) => StatusCode::BAD_REQUEST,
            ConfigStoreError::Store(StoreError::DuplicateKey(_)) => StatusCode::CONFLICT,
            ConfigStoreError::Store(StoreError::MissingEntry(_)) => StatusCode::NOT_FOUND,
            ConfigStoreError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<ConfigStoreError> for ApiError {
    fn from(err: ConfigStoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ApiResponse::<()>::error(self.0.to_string()))).into_response()
    }
}
