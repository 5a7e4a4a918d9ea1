//! Minimum server - one handler on the default port.
//!
//! Run it next to `minimum_client`:
//!
//! ```text
//! cargo run --example minimum_server
//! cargo run --example minimum_client
//! ```
//!
//! Per-call events are logged at debug level unless `RUST_LOG` says otherwise.

use evoke_rpc::{Reply, Server, ServerConfig};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "evoke_rpc=debug".into()),
        ))
        .init();

    let mut server = Server::builder(ServerConfig::default().with_debug(true))
        .handle("getMessage", |args: Value, reply: Reply| async move {
            reply.ok(format!("Hi. Args: {args}"))
        })
        .build();

    let addr = server.listen().await?;
    println!("listening on {addr}...");

    tokio::signal::ctrl_c().await?;
    server.close().await?;

    Ok(())
}
