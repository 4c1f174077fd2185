//! Helpers booting in-process storefront services on loopback ports
#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storefront::catalog::http::{create_router as catalog_router, CatalogState};
use storefront::catalog::invalidator::{HttpInvalidator, Invalidator};
use storefront::catalog::{Book, Inventory, InventoryChange};
use storefront::common::{RecordFile, ReplicaSet, Replicator, UpstreamClient};
use storefront::front::http::{create_router as front_router, FrontState};
use storefront::front::{Dispatcher, ResponseCache};
use storefront::order::http::{create_router as order_router, OrderState};
use storefront::order::{Ledger, OrderSync, PurchaseSaga};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const TIMEOUT: Duration = Duration::from_millis(500);

/// Bind a loopback listener and return it with its base URL.
pub async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    (listener, url)
}

pub fn serve(listener: TcpListener, router: Router) {
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
}

/// A URL nothing listens on.
pub fn dead_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    url
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().timeout(TIMEOUT).build().unwrap()
}

pub fn books() -> Vec<Book> {
    vec![
        Book {
            id: 1,
            title: "How to get a good grade in 677 in 20 minutes a day".into(),
            topic: "distributed systems".into(),
            quantity: 10,
            price: 20.0,
        },
        Book {
            id: 7,
            title: "RPCs for Noobs".into(),
            topic: "distributed systems".into(),
            quantity: 3,
            price: 35.5,
        },
        Book {
            id: 42,
            title: "Intro to Algorithms".into(),
            topic: "algorithms".into(),
            quantity: 1,
            price: 49.99,
        },
    ]
}

/// Counts invalidation callbacks instead of sending them.
#[derive(Default)]
pub struct CountingInvalidator {
    pub calls: AtomicUsize,
}

impl CountingInvalidator {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Invalidator for CountingInvalidator {
    async fn invalidate(&self, _id: u64) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct CatalogNode {
    pub url: String,
    pub inventory: Arc<Inventory>,
    _dir: TempDir,
}

pub async fn start_catalog_on(
    listener: TcpListener,
    url: String,
    invalidator: Arc<dyn Invalidator>,
    replicator: Replicator<InventoryChange>,
) -> CatalogNode {
    let dir = TempDir::new().unwrap();
    let inventory = Arc::new(
        Inventory::new(
            books(),
            RecordFile::new(dir.path().join("catalog.json")),
            invalidator,
            replicator,
        )
        .unwrap(),
    );
    serve(
        listener,
        catalog_router(CatalogState {
            inventory: inventory.clone(),
        }),
    );
    CatalogNode {
        url,
        inventory,
        _dir: dir,
    }
}

/// Catalog replica sending invalidations to `front_url`.
pub async fn start_catalog(front_url: &str) -> CatalogNode {
    let (listener, url) = bind().await;
    let invalidator = Arc::new(HttpInvalidator::new(client(), front_url));
    start_catalog_on(listener, url, invalidator, Replicator::disabled()).await
}

pub struct FrontNode {
    pub url: String,
    pub dispatcher: Arc<Dispatcher>,
}

pub fn start_front_on(
    listener: TcpListener,
    url: String,
    catalog: Vec<String>,
    orders: Vec<String>,
    ttl: Duration,
) -> FrontNode {
    let dispatcher = Arc::new(Dispatcher::new(
        ReplicaSet::new("catalog", catalog).unwrap(),
        ReplicaSet::new("order", orders).unwrap(),
        ResponseCache::new(ttl),
        UpstreamClient::new(TIMEOUT).unwrap(),
    ));
    serve(
        listener,
        front_router(FrontState {
            dispatcher: dispatcher.clone(),
        }),
    );
    FrontNode { url, dispatcher }
}

pub struct OrderNode {
    pub url: String,
    pub ledger: Arc<Ledger>,
    _dir: TempDir,
}

pub async fn start_order_on(
    listener: TcpListener,
    url: String,
    catalog: Vec<String>,
    replicator: Replicator<OrderSync>,
) -> OrderNode {
    let dir = TempDir::new().unwrap();
    let ledger = Arc::new(Ledger::open(dir.path().join("orders.json")).await.unwrap());
    let saga = PurchaseSaga::new(
        ReplicaSet::new("catalog", catalog).unwrap(),
        UpstreamClient::new(TIMEOUT).unwrap(),
        ledger.clone(),
        replicator,
    );
    serve(
        listener,
        order_router(OrderState {
            saga: Arc::new(saga),
        }),
    );
    OrderNode {
        url,
        ledger,
        _dir: dir,
    }
}

/// Replica that answers every request with a 500, counting the requests.
pub async fn start_failing_replica() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().fallback(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(serde_json::json!({ "error": "Error updating backing store" })),
            )
        }
    });
    let (listener, url) = bind().await;
    serve(listener, router);
    (url, hits)
}

/// Poll `check` every 20ms for up to 3s.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..150 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
