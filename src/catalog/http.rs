//! HTTP API for a catalog replica

use crate::catalog::inventory::{BookChanges, Inventory, UpdateRequest};
use crate::common::metrics::METRICS;
use crate::common::tracing_middleware::request_tracing_middleware;
use crate::common::{parse_item_id, Error, Result};
use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared catalog state for HTTP handlers.
#[derive(Clone)]
pub struct CatalogState {
    pub inventory: Arc<Inventory>,
}

pub fn create_router(state: CatalogState) -> Router {
    Router::new()
        .route("/search/:topic", get(search))
        .route("/info/:item_number", get(info))
        .route("/update/:item_number", put(update))
        .route("/decrement/:item_number", post(decrement))
        // Replication-only: applied without invalidation or re-propagation
        .route("/replicate/:item_number", put(replicate))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(axum::middleware::from_fn_with_state(
            "catalog",
            request_tracing_middleware,
        ))
        .with_state(state)
}

async fn search(
    State(state): State<CatalogState>,
    Path(topic): Path<String>,
) -> Result<Json<Value>> {
    tracing::info!(topic = %topic, "Search request");
    let books = state.inventory.search(&topic)?;
    Ok(Json(json!(books)))
}

async fn info(
    State(state): State<CatalogState>,
    Path(item_number): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_item_id(&item_number)?;
    tracing::info!(item_id = id, "Info request");
    let info = state.inventory.info(id)?;
    Ok(Json(json!(info)))
}

async fn update(
    State(state): State<CatalogState>,
    Path(item_number): Path<String>,
    payload: std::result::Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let id = parse_item_id(&item_number)?;
    let Json(request) = payload.map_err(|e| Error::InvalidInput(e.body_text()))?;
    let changes = request.into_changes()?;
    tracing::info!(item_id = id, "Update request");

    let book = state.inventory.update(id, changes).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Item updated",
        "quantity": book.quantity,
        "price": book.price,
    })))
}

async fn decrement(
    State(state): State<CatalogState>,
    Path(item_number): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_item_id(&item_number)?;
    tracing::info!(item_id = id, "Decrement request");

    let book = state.inventory.decrement(id).await?;
    Ok(Json(json!({ "success": true, "quantity": book.quantity })))
}

async fn replicate(
    State(state): State<CatalogState>,
    Path(item_number): Path<String>,
    payload: std::result::Result<Json<BookChanges>, JsonRejection>,
) -> Result<Json<Value>> {
    let id = parse_item_id(&item_number)?;
    let Json(changes) = payload.map_err(|e| Error::InvalidInput(e.body_text()))?;
    tracing::info!(item_id = id, "Replication request");

    let book = state.inventory.apply_replicated(id, changes).await?;
    Ok(Json(json!({ "success": true, "quantity": book.quantity, "price": book.price })))
}

async fn health(State(state): State<CatalogState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "catalog",
        "books": state.inventory.len(),
        "version": crate::VERSION,
    }))
}

async fn metrics() -> impl IntoResponse {
    (
        [("content-type", "text/plain; version=0.0.4")],
        METRICS.render_prometheus(None),
    )
}
