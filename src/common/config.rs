//! Configuration for storefront services

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "STOREFRONT_CONFIG";

/// Config file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "storefront.toml";

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub front: FrontConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub order: OrderConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            front: FrontConfig::default(),
            catalog: CatalogConfig::default(),
            order: OrderConfig::default(),
        }
    }
}

/// Front (dispatch + cache) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontConfig {
    /// Bind address for the public HTTP API
    #[serde(default = "default_front_bind")]
    pub bind_addr: SocketAddr,

    /// Catalog replica base URLs, in failover order
    #[serde(default = "default_catalog_replicas")]
    pub catalog_replicas: Vec<String>,

    /// Order replica base URLs, in failover order
    #[serde(default = "default_order_replicas")]
    pub order_replicas: Vec<String>,

    /// Validity window of cached read responses
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_ms: u64,

    /// Per-attempt timeout for calls to replicas
    #[serde(default = "default_timeout")]
    pub upstream_timeout_ms: u64,
}

/// Catalog (inventory replica) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_bind")]
    pub bind_addr: SocketAddr,

    /// JSON file holding the full book record set
    #[serde(default = "default_catalog_path")]
    pub data_path: PathBuf,

    /// Front URL receiving invalidation callbacks (none disables them)
    #[serde(default = "default_front_url")]
    pub front_url: Option<String>,

    /// Paired catalog replica receiving replication messages
    #[serde(default)]
    pub peer_url: Option<String>,

    /// Timeout for invalidation and replication calls
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

/// Order (transaction replica) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfig {
    #[serde(default = "default_order_bind")]
    pub bind_addr: SocketAddr,

    /// JSON file holding the order ledger
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,

    /// Catalog replicas used by the purchase saga
    #[serde(default = "default_catalog_replicas")]
    pub catalog_replicas: Vec<String>,

    /// Paired order replica receiving ledger entries
    #[serde(default)]
    pub peer_url: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

fn default_front_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}
fn default_catalog_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3001))
}
fn default_order_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3002))
}
fn default_catalog_replicas() -> Vec<String> {
    vec![
        "http://localhost:3001".to_string(),
        "http://localhost:3003".to_string(),
    ]
}
fn default_order_replicas() -> Vec<String> {
    vec![
        "http://localhost:3002".to_string(),
        "http://localhost:3004".to_string(),
    ]
}
fn default_cache_ttl() -> u64 {
    10_000
}
fn default_timeout() -> u64 {
    2_000
}
fn default_catalog_path() -> PathBuf {
    PathBuf::from("./data/catalog.json")
}
fn default_ledger_path() -> PathBuf {
    PathBuf::from("./data/orders.json")
}
fn default_front_url() -> Option<String> {
    Some("http://localhost:3000".to_string())
}

impl Default for FrontConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_front_bind(),
            catalog_replicas: default_catalog_replicas(),
            order_replicas: default_order_replicas(),
            cache_ttl_ms: default_cache_ttl(),
            upstream_timeout_ms: default_timeout(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_catalog_bind(),
            data_path: default_catalog_path(),
            front_url: default_front_url(),
            peer_url: None,
            timeout_ms: default_timeout(),
        }
    }
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_order_bind(),
            ledger_path: default_ledger_path(),
            catalog_replicas: default_catalog_replicas(),
            peer_url: None,
            timeout_ms: default_timeout(),
        }
    }
}

impl FrontConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.catalog_replicas.is_empty() {
            return Err(Error::InvalidConfig("front.catalog_replicas is empty".into()));
        }
        if self.order_replicas.is_empty() {
            return Err(Error::InvalidConfig("front.order_replicas is empty".into()));
        }
        if self.cache_ttl_ms == 0 {
            return Err(Error::InvalidConfig("front.cache_ttl_ms must be > 0".into()));
        }
        Ok(())
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl OrderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.catalog_replicas.is_empty() {
            return Err(Error::InvalidConfig("order.catalog_replicas is empty".into()));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from `$STOREFRONT_CONFIG` (or `./storefront.toml`)
    /// layered under `STOREFRONT__SECTION__KEY` environment variables.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("STOREFRONT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("front.catalog_replicas")
                    .with_list_parse_key("front.order_replicas")
                    .with_list_parse_key("order.catalog_replicas"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.front.cache_ttl(), Duration::from_secs(10));
        assert_eq!(config.front.catalog_replicas.len(), 2);
        assert_eq!(config.catalog.bind_addr.port(), 3001);
        assert!(config.catalog.peer_url.is_none());
        assert!(config.front.validate().is_ok());
    }

    #[test]
    fn test_from_toml_overrides() {
        let config = Config::from_toml(
            r#"
            log_level = "debug"

            [front]
            cache_ttl_ms = 500
            catalog_replicas = ["http://10.0.0.1:3001"]

            [catalog]
            peer_url = "http://10.0.0.2:3001"
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.front.cache_ttl_ms, 500);
        assert_eq!(config.front.catalog_replicas, vec!["http://10.0.0.1:3001"]);
        assert_eq!(config.front.order_replicas.len(), 2);
        assert_eq!(
            config.catalog.peer_url.as_deref(),
            Some("http://10.0.0.2:3001")
        );
        assert_eq!(config.order.ledger_path, PathBuf::from("./data/orders.json"));
    }

    #[test]
    fn test_validate_rejects_empty_replica_set() {
        let front = FrontConfig {
            catalog_replicas: vec![],
            ..Default::default()
        };
        assert!(matches!(front.validate(), Err(Error::InvalidConfig(_))));

        let front = FrontConfig {
            cache_ttl_ms: 0,
            ..Default::default()
        };
        assert!(front.validate().is_err());
    }
}
