//! Purchase saga.
//!
//! A purchase is a fixed sequence of calls against the catalog replica set
//! followed by a local ledger append:
//!
//! 1. fetch item info (404 ends with item-not-found)
//! 2. require stock > 0 (else out-of-stock)
//! 3. decrement stock; the catalog's answer is authoritative and any
//!    non-2xx is passed through
//! 4. append the order snapshot to the ledger
//! 5. hand the order to the replicator
//! 6. confirm
//!
//! There is no compensation: a ledger failure after step 3 leaves the stock
//! decremented with no order recorded.

use crate::catalog::BookInfo;
use crate::common::metrics::METRICS;
use crate::common::{Error, OrderConfig, ReplicaSet, Replicator, Result, UpstreamClient};
use crate::order::ledger::{Ledger, Order, OrderSync};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Returned to the client on success
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseConfirmation {
    pub item_id: u64,
    pub title: String,
    pub price: f64,
    pub message: String,
}

pub struct PurchaseSaga {
    catalog: ReplicaSet,
    upstream: UpstreamClient,
    ledger: Arc<Ledger>,
    replicator: Replicator<OrderSync>,
}

impl PurchaseSaga {
    pub fn new(
        catalog: ReplicaSet,
        upstream: UpstreamClient,
        ledger: Arc<Ledger>,
        replicator: Replicator<OrderSync>,
    ) -> Self {
        Self {
            catalog,
            upstream,
            ledger,
            replicator,
        }
    }

    pub fn from_config(
        config: &OrderConfig,
        upstream: UpstreamClient,
        ledger: Arc<Ledger>,
        replicator: Replicator<OrderSync>,
    ) -> Result<Self> {
        config.validate()?;
        let catalog = ReplicaSet::new("catalog", config.catalog_replicas.clone())?;
        Ok(Self::new(catalog, upstream, ledger, replicator))
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub async fn purchase(&self, id: u64) -> Result<PurchaseConfirmation> {
        // Step 1: item info
        let response = self
            .upstream
            .forward(&self.catalog, Method::GET, &format!("/info/{}", id), None)
            .await?;
        if response.status == StatusCode::NOT_FOUND {
            tracing::info!(item_id = id, "Item not found");
            return Err(Error::NotFound("Item not found".into()));
        }
        let info: BookInfo = serde_json::from_value(response.into_result()?)
            .map_err(|e| Error::Internal(format!("malformed item info: {}", e)))?;

        // Step 2: stock check
        if info.quantity == 0 {
            tracing::info!(item_id = id, "Item out of stock");
            return Err(Error::OutOfStock);
        }

        // Step 3: decrement
        let decremented = self
            .upstream
            .forward(&self.catalog, Method::POST, &format!("/decrement/{}", id), None)
            .await?;
        if let Err(e) = decremented.into_result() {
            tracing::info!(item_id = id, error = %e, "Failed to decrement stock");
            return Err(e);
        }

        // Step 4: ledger
        let order = Order {
            order_id: Uuid::new_v4().to_string(),
            id,
            title: info.title.clone(),
            topic: info.topic.clone(),
            quantity: info.quantity,
            price: info.price,
        };
        if let Err(e) = self.ledger.append(order.clone()).await {
            tracing::error!(
                item_id = id,
                order_id = %order.order_id,
                error = %e,
                "Stock decremented but order was not recorded"
            );
            return Err(e);
        }

        // Step 5: replicate
        self.replicator.replicate(OrderSync { order });

        METRICS.purchases.inc();
        tracing::info!(item_id = id, title = %info.title, "Purchase completed");
        Ok(PurchaseConfirmation {
            item_id: id,
            title: info.title,
            price: info.price,
            message: "Purchase successful".to_string(),
        })
    }
}
