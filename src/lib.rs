//! # storefront
//!
//! A replicated three-tier book store:
//! - a front tier that load-balances, fails over and caches reads
//! - catalog replicas owning the inventory, invalidating the front's cache
//!   before every write
//! - order replicas running purchases as a saga against the catalog
//! - fire-and-forget replication between paired replicas of each tier
//!
//! ## Architecture
//!
//! ```text
//!                  ┌───────────────────────────┐
//!   client ──────▶ │          Front            │
//!                  │  round-robin + failover   │
//!                  │  TTL response cache       │◀──── POST /invalidate/:id
//!                  └─────┬───────────────┬─────┘              │
//!                        │               │                    │
//!              ┌─────────▼───┐   ┌───────▼─────┐              │
//!              │  Catalog 1  │◀─▶│  Catalog 2  │──────────────┘
//!              └─────────▲───┘   └───────▲─────┘
//!                        │  purchase saga│
//!              ┌─────────┴───┐   ┌───────┴─────┐
//!              │   Order 1   │◀─▶│   Order 2   │
//!              └─────────────┘   └─────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! storefront-catalog serve --bind 0.0.0.0:3001 --data ./data/catalog.json \
//!   --front http://localhost:3000 --peer http://localhost:3003
//! storefront-order serve --bind 0.0.0.0:3002 --ledger ./data/orders.json \
//!   --catalog http://localhost:3001,http://localhost:3003 --peer http://localhost:3004
//! storefront-front serve --bind 0.0.0.0:3000 \
//!   --catalog http://localhost:3001,http://localhost:3003 \
//!   --orders http://localhost:3002,http://localhost:3004
//!
//! storefront search "distributed systems"
//! storefront purchase 42
//! ```

pub mod catalog;
pub mod common;
pub mod front;
pub mod order;

// Re-export commonly used types
pub use catalog::CatalogServer;
pub use common::{Config, Error, Result};
pub use front::FrontServer;
pub use order::OrderServer;

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolves on Ctrl-C (and SIGTERM on unix).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
