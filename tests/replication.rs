//! Catalog replica pairs: propagation of absolute values and the
//! replication-only write path.

mod common;

use common::*;
use serde_json::{json, Value};
use std::sync::Arc;
use storefront::common::Replicator;

#[tokio::test]
async fn test_decrement_propagates_to_peer_without_invalidation() {
    let (peer_listener, peer_url) = bind().await;
    let peer_invalidator = Arc::new(CountingInvalidator::default());
    let (peer_replicator, mut peer_outbox) = Replicator::channel();
    let peer = start_catalog_on(
        peer_listener,
        peer_url.clone(),
        peer_invalidator.clone(),
        peer_replicator,
    )
    .await;

    let primary_invalidator = Arc::new(CountingInvalidator::default());
    let (replicator, _worker) = Replicator::spawn(peer_url, client());
    let (listener, url) = bind().await;
    let primary = start_catalog_on(listener, url, primary_invalidator.clone(), replicator).await;

    let response = client()
        .post(format!("{}/decrement/7", primary.url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(primary_invalidator.count(), 1);

    assert!(eventually(|| peer.inventory.get(7).map(|b| b.quantity) == Some(2)).await);

    // Replicated writes neither invalidate nor propagate further
    assert_eq!(peer_invalidator.count(), 0);
    assert!(peer_outbox.try_recv().is_err());
}

#[tokio::test]
async fn test_update_propagates_both_fields() {
    let (peer_listener, peer_url) = bind().await;
    let peer = start_catalog_on(
        peer_listener,
        peer_url.clone(),
        Arc::new(CountingInvalidator::default()),
        Replicator::disabled(),
    )
    .await;

    let (replicator, _worker) = Replicator::spawn(peer_url, client());
    let (listener, url) = bind().await;
    let primary = start_catalog_on(
        listener,
        url,
        Arc::new(CountingInvalidator::default()),
        replicator,
    )
    .await;

    let response = client()
        .put(format!("{}/update/1", primary.url))
        .json(&json!({ "quantity": 25, "price": 18.75 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    assert!(eventually(|| {
        peer.inventory
            .get(1)
            .map(|b| b.quantity == 25 && b.price == 18.75)
            .unwrap_or(false)
    })
    .await);
}

#[tokio::test]
async fn test_replicate_endpoint_is_idempotent() {
    let (listener, url) = bind().await;
    let invalidator = Arc::new(CountingInvalidator::default());
    let catalog = start_catalog_on(listener, url, invalidator.clone(), Replicator::disabled()).await;

    for _ in 0..2 {
        let response = client()
            .put(format!("{}/replicate/42", catalog.url))
            .json(&json!({ "quantity": 5 }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["quantity"], 5);
        assert_eq!(body["price"], 49.99);
    }

    assert_eq!(catalog.inventory.get(42).unwrap().quantity, 5);
    assert_eq!(invalidator.count(), 0);
}

#[tokio::test]
async fn test_replicate_unknown_item_is_not_found() {
    let (listener, url) = bind().await;
    let catalog = start_catalog_on(
        listener,
        url,
        Arc::new(CountingInvalidator::default()),
        Replicator::disabled(),
    )
    .await;

    let response = client()
        .put(format!("{}/replicate/999", catalog.url))
        .json(&json!({ "quantity": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_unreachable_peer_does_not_fail_the_write() {
    let (replicator, _worker) = Replicator::spawn(dead_endpoint(), client());
    let (listener, url) = bind().await;
    let catalog = start_catalog_on(
        listener,
        url,
        Arc::new(CountingInvalidator::default()),
        replicator,
    )
    .await;

    let response = client()
        .post(format!("{}/decrement/42", catalog.url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(catalog.inventory.get(42).unwrap().quantity, 0);

    let response = client()
        .post(format!("{}/decrement/42", catalog.url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}
