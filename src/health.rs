//! Liveness and readiness endpoints.
//!
//! Readiness follows the document store: when it reports not ready, the
//! endpoint answers 503 and the order endpoint would fail fast with the
//! same root cause.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: i64,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub component: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: HealthStatus,
    pub components: Vec<ComponentHealth>,
}

/// Liveness: the process is up and serving.
pub async fn liveness_handler() -> Response {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        timestamp: chrono::Utc::now().timestamp(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Readiness: whether the service can accept order traffic.
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> Response {
    let store_ready = state.store().is_ready();
    let (placed, failed) = state.order_counters();

    let store_component = if store_ready {
        ComponentHealth {
            component: "document_store".into(),
            status: HealthStatus::Healthy,
            error: None,
            details: None,
        }
    } else {
        ComponentHealth {
            component: "document_store".into(),
            status: HealthStatus::Unhealthy,
            error: Some("store is not connected".into()),
            details: None,
        }
    };

    let placement_component = ComponentHealth {
        component: "order_placement".into(),
        status: HealthStatus::Healthy,
        error: None,
        details: Some(serde_json::json!({
            "orders_placed": placed,
            "orders_failed": failed,
        })),
    };

    let status = if store_ready {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };

    let response = ReadinessResponse {
        status,
        components: vec![store_component, placement_component],
    };
    (status.status_code(), Json(response)).into_response()
}
