//! CLI for the storefront front tier

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use storefront::common::encode_segment;

#[derive(Parser)]
#[command(name = "storefront")]
#[command(about = "storefront command-line client")]
#[command(version)]
struct Cli {
    /// Front URL
    #[arg(long, default_value = "http://localhost:3000")]
    front: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List books for a topic
    Search {
        /// Topic, e.g. "distributed systems"
        topic: String,
    },

    /// Show one book
    Info {
        /// Item number
        id: u64,
    },

    /// Buy one copy of a book
    Purchase {
        /// Item number
        id: u64,
    },

    /// Set stock and/or price of a book
    Update {
        /// Item number
        id: u64,

        #[arg(long)]
        quantity: Option<u64>,

        #[arg(long)]
        price: Option<f64>,
    },

    /// List recorded orders
    Orders,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let base = cli.front.trim_end_matches('/');
    let client = reqwest::Client::new();

    let request = match cli.command {
        Commands::Search { topic } => {
            client.get(format!("{}/search/{}", base, encode_segment(&topic)))
        }
        Commands::Info { id } => client.get(format!("{}/info/{}", base, id)),
        Commands::Purchase { id } => client.post(format!("{}/purchase/{}", base, id)),
        Commands::Update {
            id,
            quantity,
            price,
        } => {
            if quantity.is_none() && price.is_none() {
                anyhow::bail!("update needs --quantity and/or --price");
            }
            let mut body = json!({});
            if let Some(quantity) = quantity {
                body["quantity"] = json!(quantity);
            }
            if let Some(price) = price {
                body["price"] = json!(price);
            }
            client.put(format!("{}/update/{}", base, id)).json(&body)
        }
        Commands::Orders => client.get(format!("{}/orders", base)),
    };

    let response = request
        .send()
        .await
        .with_context(|| format!("failed to reach front at {}", base))?;
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if !status.is_success() {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("request failed");
        anyhow::bail!("{} ({})", message, status);
    }

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
