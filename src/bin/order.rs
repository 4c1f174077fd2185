//! Order replica binary

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use storefront::{Config, OrderServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "storefront-order")]
#[command(about = "storefront order replica: purchase saga and ledger")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an order replica
    Serve {
        /// Bind address for HTTP
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Ledger file (JSON)
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Catalog replicas (comma-separated base URLs)
        #[arg(long, value_delimiter = ',')]
        catalog: Vec<String>,

        /// Paired order replica URL
        #[arg(long)]
        peer: Option<String>,

        /// Timeout for outbound calls in milliseconds
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
    let config = Config::load()?;

    match cli.command {
        Commands::Serve {
            bind,
            ledger,
            catalog,
            peer,
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

            let mut order = config.order;
            if let Some(bind) = bind {
                order.bind_addr = bind;
            }
            if let Some(ledger) = ledger {
                order.ledger_path = ledger;
            }
            if !catalog.is_empty() {
                order.catalog_replicas = catalog;
            }
            if peer.is_some() {
                order.peer_url = peer;
            }
            if let Some(timeout) = timeout_ms {
                order.timeout_ms = timeout;
            }

            OrderServer::new(order).serve().await?;
        }
    }

    Ok(())
}
