//! Front server

use crate::common::{FrontConfig, Result};
use crate::front::dispatcher::Dispatcher;
use crate::front::http::{create_router, FrontState};
use std::sync::Arc;

pub struct FrontServer {
    config: FrontConfig,
}

impl FrontServer {
    pub fn new(config: FrontConfig) -> Self {
        Self { config }
    }

    pub async fn serve(self) -> Result<()> {
        tracing::info!("Starting front");
        tracing::info!("  HTTP API: {}", self.config.bind_addr);
        tracing::info!("  Catalog replicas: {}", self.config.catalog_replicas.join(", "));
        tracing::info!("  Order replicas: {}", self.config.order_replicas.join(", "));
        tracing::info!("  Cache TTL: {}ms", self.config.cache_ttl_ms);

        let dispatcher = Arc::new(Dispatcher::from_config(&self.config)?);
        let router = create_router(FrontState { dispatcher });

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!("✓ Front ready");

        axum::serve(listener, router)
            .with_graceful_shutdown(crate::shutdown_signal())
            .await?;

        tracing::info!("Front stopped");
        Ok(())
    }
}
