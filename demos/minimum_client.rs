//! Minimum client - one call against `minimum_server`.

use evoke_rpc::{Client, ClientConfig};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "evoke_rpc=info".into()),
        ))
        .init();

    let client = Client::new(ClientConfig::default());
    let response = client.evoke("getMessage", json!({"cake": "isGood"})).await?;

    println!("response: {response:?}");
    Ok(())
}
