//! HTTP API for an order replica

use crate::common::metrics::METRICS;
use crate::common::tracing_middleware::request_tracing_middleware;
use crate::common::{parse_item_id, Error, Result};
use crate::order::ledger::OrderSync;
use crate::order::saga::{PurchaseConfirmation, PurchaseSaga};
use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared order state for HTTP handlers.
#[derive(Clone)]
pub struct OrderState {
    pub saga: Arc<PurchaseSaga>,
}

pub fn create_router(state: OrderState) -> Router {
    Router::new()
        .route("/purchase/:item_number", post(purchase))
        .route("/orders", get(orders))
        // Replication-only: appended without further propagation
        .route("/sync-order", post(sync_order))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(axum::middleware::from_fn_with_state(
            "order",
            request_tracing_middleware,
        ))
        .with_state(state)
}

async fn purchase(
    State(state): State<OrderState>,
    Path(item_number): Path<String>,
) -> Result<Json<PurchaseConfirmation>> {
    let id = parse_item_id(&item_number)?;
    tracing::info!(item_id = id, "Purchase request");

    // Detached so a client disconnect cannot cancel the saga after the
    // stock has been decremented.
    let saga = state.saga.clone();
    let confirmation = tokio::spawn(async move { saga.purchase(id).await })
        .await
        .map_err(|e| Error::Internal(format!("purchase task failed: {}", e)))??;

    Ok(Json(confirmation))
}

async fn orders(State(state): State<OrderState>) -> impl IntoResponse {
    let orders = state.saga.ledger().all();
    tracing::info!(count = orders.len(), "Retrieved orders");
    Json(orders)
}

async fn sync_order(
    State(state): State<OrderState>,
    payload: std::result::Result<Json<OrderSync>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(OrderSync { order }) = payload.map_err(|e| Error::InvalidInput(e.body_text()))?;
    tracing::info!(item_id = order.id, order_id = %order.order_id, "Received order sync");

    let appended = state.saga.ledger().append(order).await?;
    Ok(Json(json!({ "success": true, "duplicate": !appended })))
}

async fn health(State(state): State<OrderState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "order",
        "orders": state.saga.ledger().len(),
        "version": crate::VERSION,
    }))
}

async fn metrics() -> impl IntoResponse {
    (
        [("content-type", "text/plain; version=0.0.4")],
        METRICS.render_prometheus(None),
    )
}
