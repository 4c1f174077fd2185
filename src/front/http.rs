//! Public HTTP API of the front tier

use crate::common::metrics::METRICS;
use crate::common::tracing_middleware::request_tracing_middleware;
use crate::common::{parse_item_id, Error, Result, UpstreamResponse};
use crate::front::dispatcher::{Dispatcher, ReadKind, WriteKind};
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

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared front state for HTTP handlers.
#[derive(Clone)]
pub struct FrontState {
    pub dispatcher: Arc<Dispatcher>,
}

pub fn create_router(state: FrontState) -> Router {
    Router::new()
        // Cached reads
        .route("/search/:topic", get(search))
        .route("/info/:item_number", get(info))
        // Writes, never cached
        .route("/update/:item_number", put(update))
        .route("/decrement/:item_number", post(decrement))
        .route("/purchase/:item_number", post(purchase))
        // Called by catalog replicas before they change an item
        .route("/invalidate/:item_number", post(invalidate))
        .route("/orders", get(orders))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(axum::middleware::from_fn_with_state(
            "front",
            request_tracing_middleware,
        ))
        .with_state(state)
}

async fn search(
    State(state): State<FrontState>,
    Path(topic): Path<String>,
) -> Result<UpstreamResponse> {
    tracing::info!(topic = %topic, "Search request");
    state.dispatcher.read(ReadKind::Search, &topic).await
}

async fn info(
    State(state): State<FrontState>,
    Path(item_number): Path<String>,
) -> Result<UpstreamResponse> {
    let id = parse_item_id(&item_number)?;
    tracing::info!(item_id = id, "Info request");
    state.dispatcher.read(ReadKind::Info, &id.to_string()).await
}

async fn update(
    State(state): State<FrontState>,
    Path(item_number): Path<String>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<UpstreamResponse> {
    let id = parse_item_id(&item_number)?;
    let Json(body) = payload.map_err(|e| Error::InvalidInput(e.body_text()))?;
    tracing::info!(item_id = id, "Update request");
    state
        .dispatcher
        .write(WriteKind::Update, &id.to_string(), Some(&body))
        .await
}

async fn decrement(
    State(state): State<FrontState>,
    Path(item_number): Path<String>,
) -> Result<UpstreamResponse> {
    let id = parse_item_id(&item_number)?;
    tracing::info!(item_id = id, "Decrement request");
    state
        .dispatcher
        .write(WriteKind::Decrement, &id.to_string(), None)
        .await
}

async fn purchase(
    State(state): State<FrontState>,
    Path(item_number): Path<String>,
) -> Result<UpstreamResponse> {
    let id = parse_item_id(&item_number)?;
    tracing::info!(item_id = id, "Purchase request");
    state
        .dispatcher
        .write(WriteKind::Purchase, &id.to_string(), None)
        .await
}

/// Always succeeds; an unknown or malformed id has nothing cached.
async fn invalidate(
    State(state): State<FrontState>,
    Path(item_number): Path<String>,
) -> impl IntoResponse {
    if let Ok(id) = parse_item_id(&item_number) {
        state.dispatcher.invalidate(ReadKind::Info, &id.to_string());
    }
    Json(json!({ "success": true }))
}

async fn orders(State(state): State<FrontState>) -> Result<UpstreamResponse> {
    state.dispatcher.list_orders().await
}

async fn health(State(state): State<FrontState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "front",
        "catalog_replicas": state.dispatcher.catalog_replicas().endpoints(),
        "order_replicas": state.dispatcher.order_replicas().endpoints(),
        "cache_ttl_ms": u64::try_from(state.dispatcher.cache().ttl().as_millis()).unwrap_or(u64::MAX),
        "version": crate::VERSION,
    }))
}

async fn metrics(State(state): State<FrontState>) -> impl IntoResponse {
    (
        [("content-type", "text/plain; version=0.0.4")],
        METRICS.render_prometheus(Some(state.dispatcher.cache().len())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::FrontConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn router() -> (Router, Arc<Dispatcher>) {
        let dispatcher = Arc::new(Dispatcher::from_config(&FrontConfig::default()).unwrap());
        (
            create_router(FrontState {
                dispatcher: dispatcher.clone(),
            }),
            dispatcher,
        )
    }

    #[tokio::test]
    async fn test_cached_info_served_without_replicas() {
        let (app, dispatcher) = router();
        dispatcher.cache().put(
            ReadKind::Info.cache_key("7"),
            json!({"title": "Book 7", "topic": "t", "quantity": 3, "price": 1.0}),
        );

        let response = app
            .oneshot(Request::get("/info/7").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["quantity"], 3);
    }

    #[tokio::test]
    async fn test_invalidate_always_succeeds() {
        let (app, dispatcher) = router();
        dispatcher
            .cache()
            .put(ReadKind::Info.cache_key("7"), json!({"quantity": 3}));

        for path in ["/invalidate/7", "/invalidate/7", "/invalidate/not-a-number"] {
            let response = app
                .clone()
                .oneshot(Request::post(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert!(dispatcher.cache().is_empty());
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let (app, _) = router();
        let response = app
            .oneshot(
                Request::get("/health")
                    .header("X-Request-ID", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["X-Request-ID"], "abc-123");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["cache_ttl_ms"], 10_000);
    }
}
