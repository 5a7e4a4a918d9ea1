//! Handler registry mapping function names to handlers.
//!
//! The registry is filled while the server is being built and is shared
//! read-only (behind an `Arc`) once the server runs. Lookup is by exact
//! name; registering a name twice replaces the earlier handler.
//!
//! # Example
//!
//! ```ignore
//! use evoke_rpc::handler::{HandlerRegistry, Reply};
//!
//! let mut registry = HandlerRegistry::new();
//!
//! registry.register("echo", |args: serde_json::Value, reply: Reply| async move {
//!     reply.ok(args)
//! });
//!
//! registry.register_fn("add", |(a, b): (i64, i64)| async move { Ok::<_, String>(a + b) });
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Reply;
use crate::codec::JsonCodec;

/// Boxed future returned by handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for handler functions.
pub trait Handler: Send + Sync + 'static {
    /// Handle a call. The handler must eventually complete `reply`.
    fn call(&self, args: Value, reply: Reply) -> BoxFuture<'static, ()>;
}

/// Wrapper that deserializes the argument value before calling the handler.
pub struct TypedHandler<F, T, Fut>
where
    F: Fn(T, Reply) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    handler: F,
    _phantom: PhantomData<fn(T) -> Fut>,
}

impl<F, T, Fut> TypedHandler<F, T, Fut>
where
    F: Fn(T, Reply) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    /// Create a new typed handler.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<F, T, Fut> Handler for TypedHandler<F, T, Fut>
where
    F: Fn(T, Reply) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn call(&self, args: Value, reply: Reply) -> BoxFuture<'static, ()> {
        let parsed: T = match JsonCodec::from_value(args) {
            Ok(v) => v,
            Err(e) => {
                let message = format!("invalid arguments for {}: {e}", reply.function_name());
                reply.err(message);
                return Box::pin(async {});
            }
        };

        Box::pin((self.handler)(parsed, reply))
    }
}

/// Registry mapping function names to handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback-style handler.
    ///
    /// The handler receives the deserialized arguments and a [`Reply`] it
    /// must complete exactly once. Use `serde_json::Value` as `T` to receive
    /// the arguments untouched.
    pub fn register<F, T, Fut>(&mut self, name: &str, handler: F)
    where
        F: Fn(T, Reply) -> Fut + Send + Sync + 'static,
        T: DeserializeOwned + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.register_handler(name, Arc::new(TypedHandler::new(handler)));
    }

    /// Register an async function returning `Result<R, String>`.
    pub fn register_fn<F, T, R, Fut>(&mut self, name: &str, handler: F)
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        T: DeserializeOwned + Send + 'static,
        R: serde::Serialize + Send + 'static,
        Fut: Future<Output = std::result::Result<R, String>> + Send + 'static,
    {
        self.register(name, move |args: T, reply: Reply| {
            let fut = handler(args);
            async move {
                match fut.await {
                    Ok(results) => reply.ok(results),
                    Err(message) => reply.err(message),
                }
            }
        });
    }

    /// Register an already boxed handler.
    pub fn register_handler(&mut self, name: &str, handler: Arc<dyn Handler>) {
        self.handlers.insert(name.to_string(), handler);
    }

    /// Get a handler by function name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).cloned()
    }

    /// Check whether a function is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check whether no function is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered function names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("functions", &self.names())
            .finish()
    }
}
