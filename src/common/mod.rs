//! Common utilities and types shared across storefront services

pub mod config;
pub mod error;
pub mod metrics;
pub mod replica_set;
pub mod replication;
pub mod store;
pub mod tracing_middleware;
pub mod upstream;
pub mod utils;

pub use config::{CatalogConfig, Config, FrontConfig, OrderConfig};
pub use error::{Error, ReplicaFailure, Result};
pub use replica_set::ReplicaSet;
pub use replication::{ReplicationMessage, Replicator};
pub use store::RecordFile;
pub use upstream::{UpstreamClient, UpstreamResponse};
pub use utils::{encode_segment, parse_item_id};
