//! Dispatcher: routes a request to its handler and builds the response.
//!
//! Each handler runs in its own tokio task. A handler that panics, or drops
//! its [`Reply`] without answering, yields an error response instead of
//! taking down the connection. An optional deadline bounds how long the
//! dispatcher waits for the reply.

use std::sync::Arc;
use std::time::Duration;

use super::{HandlerRegistry, Reply};
use crate::protocol::{now_millis, Request, Response};

/// Shared, cheaply cloneable dispatcher.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    handler_timeout: Option<Duration>,
    debug: bool,
}

impl Dispatcher {
    /// Create a dispatcher over a frozen registry.
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self {
            registry,
            handler_timeout: None,
            debug: false,
        }
    }

    /// Bound how long a handler may take to reply.
    pub fn with_handler_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handler_timeout = timeout;
        self
    }

    /// Emit per-call debug events.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The registry this dispatcher routes into.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Dispatch a request and build its response envelope.
    ///
    /// Never fails: routing, argument, and handler failures all become a
    /// response with `err` set.
    pub async fn dispatch(&self, request: Request) -> Response {
        let Request {
            function_name,
            args,
        } = request;

        let Some(handler) = self.registry.get(&function_name) else {
            if self.debug {
                tracing::debug!(function = %function_name, "function not found");
            }
            return Response::not_found(&function_name);
        };

        let (reply, rx) = Reply::channel(&function_name);
        let timestamp_fn_start = now_millis();

        let task = tokio::spawn(async move { handler.call(args, reply).await });

        let outcome = match self.handler_timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    task.abort();
                    tracing::warn!(
                        function = %function_name,
                        timeout_ms = limit.as_millis() as u64,
                        "handler timed out"
                    );
                    return Response::failure(
                        timestamp_fn_start,
                        now_millis(),
                        format!(
                            "function {function_name} timed out after {}ms",
                            limit.as_millis()
                        ),
                    );
                }
            },
            None => rx.await,
        };

        let timestamp_fn_end = now_millis();

        let response = match outcome {
            Ok(Ok(results)) => Response::success(timestamp_fn_start, timestamp_fn_end, results),
            Ok(Err(err)) => Response::failure(timestamp_fn_start, timestamp_fn_end, err),
            Err(_) => {
                // Reply dropped unanswered: either the handler panicked or it
                // returned without completing the reply.
                let reason = if task.is_finished() {
                    match task.await {
                        Err(e) if e.is_panic() => "panicked",
                        _ => "finished without replying",
                    }
                } else {
                    "dropped its reply"
                };
                tracing::warn!(function = %function_name, reason, "handler produced no reply");
                Response::failure(
                    timestamp_fn_start,
                    timestamp_fn_end,
                    format!("function {function_name} {reason}"),
                )
            }
        };

        if self.debug {
            tracing::debug!(
                function = %function_name,
                elapsed_ms = timestamp_fn_end.saturating_sub(timestamp_fn_start),
                ok = response.is_ok(),
                "handler completed"
            );
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::{json, Value};

    #[derive(Deserialize)]
    struct Sum {
        a: i64,
        b: i64,
    }

    fn dispatcher() -> Dispatcher {
        let mut registry = HandlerRegistry::new();
        registry.register("add", |args: Sum, reply: Reply| async move {
            reply.ok(args.a + args.b)
        });
        registry.register("fail", |_: Value, reply: Reply| async move {
            reply.err("handler failure")
        });
        registry.register("silent", |_: Value, _reply: Reply| async move {});
        registry.register("panics", |_: Value, _reply: Reply| async move {
            panic!("handler blew up");
        });
        registry.register("never", |_: Value, reply: Reply| async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            reply.ok(());
        });
        registry.register("delayed", |_: Value, reply: Reply| async move {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                reply.ok("late");
            });
        });
        Dispatcher::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let response = dispatcher()
            .dispatch(Request::new("add", json!({"a": 2, "b": 7})))
            .await;

        assert_eq!(response.results, Some(json!(9)));
        assert!(response.err.is_none());
        let start = response.timestamp_fn_start.unwrap();
        let end = response.timestamp_fn_end.unwrap();
        assert!(end >= start);
    }

    #[tokio::test]
    async fn test_dispatch_not_found() {
        let response = dispatcher().dispatch(Request::new("nope", Value::Null)).await;

        assert_eq!(response.err.as_deref(), Some("function nope not found"));
        assert!(response.results.is_none());
        assert!(response.timestamp_fn_start.is_none());
        assert!(response.timestamp_fn_end.is_none());
    }

    #[tokio::test]
    async fn test_dispatch_handler_error() {
        let response = dispatcher().dispatch(Request::new("fail", Value::Null)).await;

        assert_eq!(response.err.as_deref(), Some("handler failure"));
        assert!(response.results.is_none());
        assert!(response.timestamp_fn_start.is_some());
    }

    #[tokio::test]
    async fn test_dispatch_reply_from_spawned_task() {
        let response = dispatcher().dispatch(Request::new("delayed", Value::Null)).await;
        assert_eq!(response.results, Some(json!("late")));
    }

    #[tokio::test]
    async fn test_dispatch_handler_without_reply() {
        let response = dispatcher().dispatch(Request::new("silent", Value::Null)).await;

        let err = response.err.unwrap();
        assert!(err.starts_with("function silent"), "{err}");
    }

    #[tokio::test]
    async fn test_dispatch_panicking_handler() {
        let response = dispatcher().dispatch(Request::new("panics", Value::Null)).await;

        let err = response.err.unwrap();
        assert!(err.starts_with("function panics"), "{err}");
        assert!(response.results.is_none());
    }

    #[tokio::test]
    async fn test_dispatch_handler_timeout() {
        let dispatcher = dispatcher().with_handler_timeout(Some(Duration::from_millis(50)));
        let response = dispatcher.dispatch(Request::new("never", Value::Null)).await;

        assert_eq!(
            response.err.as_deref(),
            Some("function never timed out after 50ms")
        );
    }

    #[tokio::test]
    async fn test_dispatch_invalid_args() {
        let response = dispatcher()
            .dispatch(Request::new("add", json!({"a": 1})))
            .await;

        let err = response.err.unwrap();
        assert!(err.starts_with("invalid arguments for add"), "{err}");
    }
}
