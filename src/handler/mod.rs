//! Handler module - handler registration and dispatch.
//!
//! Provides:
//! - [`HandlerRegistry`] - maps function names to handlers
//! - [`Reply`] - one-shot completion callback handed to each handler
//! - [`Dispatcher`] - runs the matching handler and builds the response
//!
//! # Example
//!
//! ```ignore
//! use evoke_rpc::handler::{Dispatcher, HandlerRegistry, Reply};
//! use evoke_rpc::protocol::Request;
//!
//! let mut registry = HandlerRegistry::new();
//!
//! registry.register("echo", |args: serde_json::Value, reply: Reply| async move {
//!     reply.ok(args)
//! });
//!
//! let dispatcher = Dispatcher::new(std::sync::Arc::new(registry));
//! let response = dispatcher.dispatch(Request::new("echo", serde_json::json!(1))).await;
//! ```

mod dispatcher;
mod registry;
mod reply;

pub use dispatcher::Dispatcher;
pub use registry::{BoxFuture, Handler, HandlerRegistry, TypedHandler};
pub use reply::{HandlerOutcome, Reply};
