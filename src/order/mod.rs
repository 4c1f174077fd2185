//! Order (transaction) replica
//!
//! Runs purchases as a saga against the catalog replicas, records each
//! purchase in a local ledger, and syncs ledger entries to a paired replica.

pub mod http;
pub mod ledger;
pub mod saga;
pub mod server;

pub use ledger::{Ledger, Order, OrderSync};
pub use saga::{PurchaseConfirmation, PurchaseSaga};
pub use server::OrderServer;
