//! Front binary

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use storefront::{Config, FrontServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "storefront-front")]
#[command(about = "storefront front tier: dispatch, failover and read cache")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the front server
    Serve {
        /// Bind address for HTTP
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Catalog replicas (comma-separated base URLs)
        #[arg(long, value_delimiter = ',')]
        catalog: Vec<String>,

        /// Order replicas (comma-separated base URLs)
        #[arg(long, value_delimiter = ',')]
        orders: Vec<String>,

        /// Cache validity window in milliseconds
        #[arg(long)]
        cache_ttl_ms: Option<u64>,

        /// Per-attempt replica timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Log level (trace, debug, info, warn, error)
        #[arg(long)]
        log_level: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // Load config from file, then override with CLI arguments
    let config = Config::load()?;

    match cli.command {
        Commands::Serve {
            bind,
            catalog,
            orders,
            cache_ttl_ms,
            timeout_ms,
            log_level,
        } => {
            let level = log_level.unwrap_or(config.log_level);
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| level.into()),
                )
                .with(tracing_subscriber::fmt::layer())
                .init();

            let mut front = config.front;
            if let Some(bind) = bind {
                front.bind_addr = bind;
            }
            if !catalog.is_empty() {
                front.catalog_replicas = catalog;
            }
            if !orders.is_empty() {
                front.order_replicas = orders;
            }
            if let Some(ttl) = cache_ttl_ms {
                front.cache_ttl_ms = ttl;
            }
            if let Some(timeout) = timeout_ms {
                front.upstream_timeout_ms = timeout;
            }

            FrontServer::new(front).serve().await?;
        }
    }

    Ok(())
}
