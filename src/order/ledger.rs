//! Append-only order ledger

use crate::common::utils::recover;
use crate::common::{RecordFile, ReplicationMessage, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::RwLock;
use tokio::sync::Mutex;

/// Snapshot of an item taken when it was purchased. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique per purchase; lets a replica drop duplicate syncs
    pub order_id: String,
    /// Purchased item
    pub id: u64,
    pub title: String,
    pub topic: String,
    /// Stock level observed when the purchase was checked
    pub quantity: u64,
    pub price: f64,
}

/// Replication message for the paired order replica.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSync {
    pub order: Order,
}

impl ReplicationMessage for OrderSync {
    fn method(&self) -> Method {
        Method::POST
    }

    fn path(&self) -> String {
        "/sync-order".to_string()
    }
}

pub struct Ledger {
    orders: RwLock<Vec<Order>>,
    /// Serializes appends so each save sees every earlier order.
    append_lock: Mutex<()>,
    file: RecordFile,
}

impl Ledger {
    pub fn new(orders: Vec<Order>, file: RecordFile) -> Self {
        Self {
            orders: RwLock::new(orders),
            append_lock: Mutex::new(()),
            file,
        }
    }

    /// Load the ledger from `path`; a missing file is an empty ledger.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = RecordFile::new(path.as_ref());
        let orders: Vec<Order> = file.load().await?.unwrap_or_default();
        tracing::info!(orders = orders.len(), path = %path.as_ref().display(), "Ledger loaded");
        Ok(Self::new(orders, file))
    }

    pub fn len(&self) -> usize {
        recover(self.orders.read()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all(&self) -> Vec<Order> {
        recover(self.orders.read()).clone()
    }

    /// Append and persist. Returns `false` when an order with the same
    /// `order_id` is already recorded. The order becomes visible only once
    /// the file holds it.
    pub async fn append(&self, order: Order) -> Result<bool> {
        let _guard = self.append_lock.lock().await;

        let mut snapshot = self.all();
        if snapshot.iter().any(|o| o.order_id == order.order_id) {
            return Ok(false);
        }
        snapshot.push(order.clone());
        self.file.save_with(move || snapshot).await?;

        recover(self.orders.write()).push(order);
        Ok(true)
    }
}
