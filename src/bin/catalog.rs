//! Catalog replica binary

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use storefront::{CatalogServer, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "storefront-catalog")]
#[command(about = "storefront catalog replica: book inventory")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a catalog replica
    Serve {
        /// Bind address for HTTP
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Book record file (JSON)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Front URL for cache invalidation callbacks
        #[arg(long)]
        front: Option<String>,

        /// Do not send invalidation callbacks
        #[arg(long, conflicts_with = "front")]
        no_front: bool,

        /// Paired catalog replica URL
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
            data,
            front,
            no_front,
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

            let mut catalog = config.catalog;
            if let Some(bind) = bind {
                catalog.bind_addr = bind;
            }
            if let Some(data) = data {
                catalog.data_path = data;
            }
            if front.is_some() {
                catalog.front_url = front;
            }
            if no_front {
                catalog.front_url = None;
            }
            if peer.is_some() {
                catalog.peer_url = peer;
            }
            if let Some(timeout) = timeout_ms {
                catalog.timeout_ms = timeout;
            }

            CatalogServer::new(catalog).serve().await?;
        }
    }

    Ok(())
}
