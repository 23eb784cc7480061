use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use ordex_core::metrics::{MetricStatus, RequestId};
use ordex_core::model::{NewOrder, Order, OrderStatus};

use crate::auth::Identity;
use crate::certificate::Certificate;
use crate::error::ApiError;
use crate::request_id::assign_request_id;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/orders", get(list_orders))
        .route("/create_order", post(create_order))
        .route("/history", get(history))
        .layer(middleware::from_fn(assign_request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    instance: String,
    service: &'static str,
    timestamp: f64,
}

/// Liveness, no auth.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        instance: state.config.instance.clone(),
        service: "ordex",
        timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
    })
}

#[derive(Serialize)]
struct OrdersResponse {
    orders: Vec<Order>,
}

/// Local orders, no auth — consumed by sibling aggregators.
async fn list_orders(State(state): State<AppState>) -> Result<Json<OrdersResponse>, ApiError> {
    let orders = state.store.list_orders().await?;
    Ok(Json(OrdersResponse { orders }))
}

#[derive(Deserialize)]
struct CreateOrderRequest {
    product_id: String,
    quantity: Option<u32>,
}

#[derive(Serialize)]
struct CreateOrderResponse {
    message: &'static str,
    order_id: String,
    certificate: Option<Certificate>,
}

async fn create_order(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    identity: Identity,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    let order = state
        .store
        .create_order(NewOrder {
            order_id: format!("{}-{}", identity.username, Utc::now().timestamp()),
            product_id: body.product_id,
            quantity_ordered: i64::from(body.quantity.unwrap_or(50)),
            status: OrderStatus::Confirmed,
        })
        .await?;

    let certificate = state
        .certificates
        .stamp(&serde_json::json!({
            "order_id": order.order_id,
            "user": identity.username,
        }))
        .await;
    record_certificate_metric(&state, &request_id, "order", &identity.username, &certificate);

    info!(order_id = %order.order_id, user = %identity.username, "order created");
    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            message: "Order created",
            order_id: order.order_id,
            certificate,
        }),
    ))
}

#[derive(Serialize)]
struct HistoryResponse {
    orders: Vec<Order>,
    certificate: Option<Certificate>,
}

async fn history(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    identity: Identity,
) -> Result<Json<HistoryResponse>, ApiError> {
    let orders = state.history.history_for(&identity.username).await;

    let certificate = state
        .certificates
        .stamp(&serde_json::json!({
            "user": identity.username,
            "action": "history",
        }))
        .await;
    record_certificate_metric(&state, &request_id, "history", &identity.username, &certificate);

    Ok(Json(HistoryResponse { orders, certificate }))
}

fn record_certificate_metric(
    state: &AppState,
    request_id: &RequestId,
    event_type: &str,
    username: &str,
    certificate: &Option<Certificate>,
) {
    let (status, details) = match certificate {
        Some(_) => (MetricStatus::Success, "cert_ok"),
        None => (MetricStatus::Failed, "cert_request_failed"),
    };
    state
        .metrics
        .record(request_id, event_type, Some(username), status, details);
}
