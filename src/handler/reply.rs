//! Completion callback handed to handlers.
//!
//! A [`Reply`] is the Rust form of the `(err, results)` callback: every
//! completion method consumes it, so a handler can answer at most once.
//! Dropping it without answering is detected by the dispatcher.
//!
//! # Example
//!
//! ```ignore
//! registry.register("add", |args: Sum, reply: Reply| async move {
//!     reply.ok(args.a + args.b)
//! });
//!
//! registry.register("later", |_: serde_json::Value, reply: Reply| async move {
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_millis(500)).await;
//!         reply.err("gave up");
//!     });
//! });
//! ```

use serde_json::Value;
use tokio::sync::oneshot;

/// What a handler produced: results or an error message.
pub type HandlerOutcome = std::result::Result<Value, String>;

/// One-shot completion callback for a single call.
///
/// `Reply` is `Send`, so it may be moved into another task and completed
/// there.
pub struct Reply {
    /// Function this reply belongs to.
    function_name: String,
    /// Channel back to the dispatcher.
    tx: oneshot::Sender<HandlerOutcome>,
}

impl Reply {
    /// Create a reply wired to a receiver.
    pub fn channel(function_name: &str) -> (Self, oneshot::Receiver<HandlerOutcome>) {
        let (tx, rx) = oneshot::channel();
        let reply = Self {
            function_name: function_name.to_string(),
            tx,
        };
        (reply, rx)
    }

    /// Name of the function being answered.
    #[inline]
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Complete the call with a serializable result.
    ///
    /// A result that cannot be represented as JSON completes the call with an
    /// error instead.
    pub fn ok<T: serde::Serialize>(self, results: T) {
        match serde_json::to_value(results) {
            Ok(value) => self.send(Ok(value)),
            Err(e) => {
                let message = format!("failed to serialize results: {e}");
                self.send(Err(message))
            }
        }
    }

    /// Complete the call with an error message.
    pub fn err(self, message: impl Into<String>) {
        self.send(Err(message.into()))
    }

    /// Complete the call with an outcome.
    pub fn send(self, outcome: HandlerOutcome) {
        if self.tx.send(outcome).is_err() {
            // Dispatcher stopped waiting (deadline elapsed).
            tracing::debug!(
                function = %self.function_name,
                "reply arrived after the caller stopped waiting"
            );
        }
    }
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reply")
            .field("function_name", &self.function_name)
            .field("receiver_closed", &self.tx.is_closed())
            .finish()
    }
}
