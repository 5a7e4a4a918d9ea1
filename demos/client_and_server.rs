//! Client and server in one process.
//!
//! The handler answers from a spawned task after a delay, so the response
//! timestamps show the time spent in the handler:
//!
//! ```text
//! results: {
//!   "timestamp_fn_start": 1522804238670,
//!   "timestamp_fn_end": 1522804239174,
//!   "err": null,
//!   "results": "Helloez! Your args: {\"cake\":\"is good\"}"
//! }
//! ```

use std::time::Duration;

use evoke_rpc::{Client, ClientConfig, Reply, Server, ServerConfig};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

const PORT: u16 = 7777;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "evoke_rpc=info".into()),
        ))
        .init();

    let mut server = Server::builder(ServerConfig::default().with_port(PORT))
        .handle("getMessage", |args: Value, reply: Reply| async move {
            let message = format!("Helloez! Your args: {args}");
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                reply.ok(message);
            });
        })
        .build();
    server.listen().await?;

    let client = Client::new(ClientConfig::default().with_port(PORT));
    let response = client.evoke("getMessage", json!({"cake": "is good"})).await?;

    println!("results: {}", serde_json::to_string_pretty(&response)?);

    server.close().await?;
    Ok(())
}
