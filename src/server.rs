//! HTTP surface of the order service.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::debug;

use crate::error::OrderError;
use crate::health;
use crate::model::{CheckoutRequest, ErrorBody, OrderCreatedResponse};
use crate::state::AppState;

const ORDER_CONFIRMATION_MESSAGE: &str = "Order placed successfully! Admin will contact you soon.";

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/orders", post(create_order))
        .route("/health", get(health::liveness_handler))
        .route("/ready", get(health::readiness_handler))
        .with_state(state)
}

/// `POST /api/orders` — place an order.
///
/// 200 with the order number and total on success; 503 when the store is
/// down; 400 for missing or invalid fields and an empty item list; 500
/// with a `details` hint for any failure inside the transactional phase.
async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CheckoutRequest>,
) -> Response {
    match state.placement().place_order(request).await {
        Ok(placed) => {
            state.record_order_placed();
            let body = OrderCreatedResponse {
                success: true,
                order_number: placed.order_number,
                total_amount: placed.total_amount,
                message: ORDER_CONFIRMATION_MESSAGE.to_string(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            state.record_order_failed();
            debug!(status = %err.status_code(), category = err.category(), "order request rejected");
            err.into_response()
        }
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            details: self.details().map(str::to_string),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
