//! # evoke-rpc
//!
//! Minimal remote procedure calls over raw TCP.
//!
//! A [`Client`] sends a function name and a JSON argument value; a [`Server`]
//! routes the call to the handler registered under that name and answers
//! with a response envelope carrying the handler's timing and its result or
//! error.
//!
//! ## Protocol
//!
//! - One TCP connection per call, carrying one request and one response
//! - Each envelope is compact JSON followed by a fixed delimiter
//!   ([`protocol::DELIMITER`]); there is no length prefix
//! - Frames are reassembled from arbitrary TCP fragmentation by a
//!   per-connection [`protocol::FrameBuffer`]
//!
//! ## Example
//!
//! ```ignore
//! use evoke_rpc::{Client, ClientConfig, Reply, Server, ServerConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::builder(ServerConfig::default())
//!         .handle("add", |args: serde_json::Value, reply: Reply| async move {
//!             reply.ok(args["a"].as_i64().unwrap_or(0) + args["b"].as_i64().unwrap_or(0))
//!         })
//!         .build();
//!     server.listen().await?;
//!
//!     let client = Client::new(ClientConfig::default());
//!     let response = client.evoke("add", json!({"a": 2, "b": 7})).await?;
//!     assert_eq!(response.results, Some(json!(9)));
//!
//!     server.close().await?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod transport;

mod client;
mod server;

pub use client::Client;
pub use config::{ClientConfig, ServerConfig};
pub use error::{Result, RpcError};
pub use handler::Reply;
pub use protocol::{Request, Response};
pub use server::{Server, ServerBuilder};
