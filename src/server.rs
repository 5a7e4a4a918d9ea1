//! Server builder and accept loop.
//!
//! The [`ServerBuilder`] collects handlers; [`Server`] manages the lifecycle:
//! 1. Bind the listening socket (`listen`)
//! 2. Accept connections, one task per connection
//! 3. Per connection: read one request frame, dispatch, write one response frame
//! 4. Stop accepting (`close`, or dropping the server)
//!
//! # Example
//!
//! ```ignore
//! use evoke_rpc::{Reply, Server, ServerConfig};
//!
//! #[derive(serde::Deserialize)]
//! struct Sum { a: i64, b: i64 }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::builder(ServerConfig::default().with_port(9999))
//!         .handle("add", |args: Sum, reply: Reply| async move {
//!             reply.ok(args.a + args.b)
//!         })
//!         .build();
//!
//!     server.listen().await?;
//!     tokio::signal::ctrl_c().await?;
//!     server.close().await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::client::Client;
use crate::codec::{decode_request, encode_response};
use crate::config::{ClientConfig, ServerConfig};
use crate::error::{Result, RpcError};
use crate::handler::{Dispatcher, HandlerRegistry, Reply};
use crate::protocol::{FrameBuffer, Response, SELF_TEST_FUNCTION};
use crate::transport::{bind, drain, read_frame, write_frame};

/// Pause after a failed accept, so a persistent failure (e.g. out of file
/// descriptors) does not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// How long a rejected connection may keep sending before it is dropped.
const REJECT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for the startup self-test round trip.
const SELF_TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Builder for configuring and creating a server.
///
/// Register handlers with the fluent API, then call `build()`. The registry
/// is frozen from then on.
pub struct ServerBuilder {
    config: ServerConfig,
    registry: HandlerRegistry,
}

impl ServerBuilder {
    /// Create a new server builder.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            registry: HandlerRegistry::new(),
        }
    }

    /// Register a callback-style handler.
    ///
    /// The handler receives deserialized arguments and a [`Reply`] that it
    /// must complete exactly once, now or later from another task.
    pub fn handle<F, T, Fut>(mut self, function_name: &str, handler: F) -> Self
    where
        F: Fn(T, Reply) -> Fut + Send + Sync + 'static,
        T: DeserializeOwned + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.registry.register(function_name, handler);
        self
    }

    /// Register an async function returning `Result<R, String>`.
    pub fn handle_fn<F, T, R, Fut>(mut self, function_name: &str, handler: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        T: DeserializeOwned + Send + 'static,
        R: serde::Serialize + Send + 'static,
        Fut: Future<Output = std::result::Result<R, String>> + Send + 'static,
    {
        self.registry.register_fn(function_name, handler);
        self
    }

    /// Build the server. Nothing is bound until [`Server::listen`].
    pub fn build(mut self) -> Server {
        if self.config.self_test {
            self.registry
                .register(SELF_TEST_FUNCTION, |args: Value, reply: Reply| async move {
                    if args == self_test_args() {
                        reply.ok("ok")
                    } else {
                        reply.err(format!("invalid test message args {args}"))
                    }
                });
        }

        let dispatcher = Dispatcher::new(Arc::new(self.registry))
            .with_handler_timeout(self.config.handler_timeout)
            .with_debug(self.config.debug);

        Server {
            config: self.config,
            dispatcher,
            running: None,
        }
    }
}

/// Accept loop state while listening.
struct Running {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    accept_task: JoinHandle<()>,
}

/// An RPC server.
///
/// Dropping a listening server stops its accept loop.
pub struct Server {
    config: ServerConfig,
    dispatcher: Dispatcher,
    running: Option<Running>,
}

impl Server {
    /// Create a new server builder.
    pub fn builder(config: ServerConfig) -> ServerBuilder {
        ServerBuilder::new(config)
    }

    /// Bind the listening socket and start accepting connections.
    ///
    /// Returns the bound address; with port 0 this carries the port the OS
    /// picked.
    ///
    /// # Errors
    ///
    /// - [`RpcError::AlreadyListening`] if called twice without `close`
    /// - [`RpcError::Io`] if the socket cannot be bound
    /// - [`RpcError::SelfTest`] if the self-test is enabled and fails; the
    ///   listener is closed again in that case
    pub async fn listen(&mut self) -> Result<SocketAddr> {
        if self.running.is_some() {
            return Err(RpcError::AlreadyListening);
        }

        let listener = bind(&self.config.host, self.config.port).await?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let accept_task = tokio::spawn(accept_loop(
            listener,
            self.dispatcher.clone(),
            self.config.max_frame_size,
            self.config.debug,
            shutdown_rx,
        ));

        self.running = Some(Running {
            local_addr,
            shutdown_tx,
            accept_task,
        });
        tracing::info!(%local_addr, "listening");

        if self.config.self_test {
            if let Err(e) = Self::self_test(local_addr).await {
                self.close().await?;
                return Err(e);
            }
            if self.config.debug {
                tracing::debug!(%local_addr, "self-test passed");
            }
        }

        Ok(local_addr)
    }

    /// Stop accepting connections and release the listening socket.
    ///
    /// Connections already accepted finish their exchange. A no-op if the
    /// server is not listening.
    pub async fn close(&mut self) -> Result<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        // The accept loop may already be gone; either way it is stopping.
        let _ = running.shutdown_tx.send(());
        if let Err(e) = running.accept_task.await {
            tracing::error!("accept loop ended abnormally: {}", e);
        }

        if self.config.debug {
            tracing::debug!(local_addr = %running.local_addr, "server closed");
        }
        Ok(())
    }

    /// Address the server is bound to, while listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    /// Check whether the server is listening.
    pub fn is_listening(&self) -> bool {
        self.running.is_some()
    }

    /// The configuration this server was built with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Round trip against the reserved test function.
    async fn self_test(local_addr: SocketAddr) -> Result<()> {
        let host = match local_addr.ip() {
            IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
            ip => ip,
        };
        let client = Client::new(
            ClientConfig::default()
                .with_host(host.to_string())
                .with_port(local_addr.port())
                .with_call_timeout(SELF_TEST_TIMEOUT),
        );

        let response = client
            .evoke(SELF_TEST_FUNCTION, self_test_args())
            .await
            .map_err(|e| RpcError::SelfTest(e.to_string()))?;

        match response.results {
            Some(Value::String(ref s)) if s == "ok" => Ok(()),
            _ => Err(RpcError::SelfTest(format!(
                "initial test connection failed, response: {response:?}"
            ))),
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("local_addr", &self.local_addr())
            .finish()
    }
}

fn self_test_args() -> Value {
    json!({"a": 2, "b": 7})
}

/// Accept connections until shutdown is signalled or the sender is dropped.
async fn accept_loop(
    listener: TcpListener,
    dispatcher: Dispatcher,
    max_frame_size: usize,
    debug: bool,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    if debug {
                        tracing::debug!(%peer, "accepted connection");
                    }
                    let dispatcher = dispatcher.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, dispatcher, max_frame_size, debug).await {
                            tracing::debug!(%peer, "connection ended with error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!("accept failed: {}", e);
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            },
        }
    }
}

/// Serve the single exchange carried by one connection.
async fn handle_connection(
    mut stream: TcpStream,
    dispatcher: Dispatcher,
    max_frame_size: usize,
    debug: bool,
) -> Result<()> {
    let mut frame_buffer = FrameBuffer::with_max_frame_size(max_frame_size);

    let response = match read_frame(&mut stream, &mut frame_buffer).await {
        Ok(Some(frame)) => match decode_request(frame.body()) {
            Ok(request) => {
                if debug {
                    tracing::debug!(function = %request.function_name, "dispatching request");
                }
                dispatcher.dispatch(request).await
            }
            Err(e) => Response::error(e.to_string()),
        },
        Ok(None) => {
            if debug {
                tracing::debug!("connection closed before a request arrived");
            }
            return Ok(());
        }
        Err(e @ RpcError::FrameTooLarge { .. }) => {
            let bytes = encode_response(&Response::error(e.to_string()))?;
            write_frame(&mut stream, &bytes).await?;
            stream.shutdown().await?;
            // Closing with unread bytes would reset the connection and
            // destroy the error frame before the peer reads it.
            match tokio::time::timeout(REJECT_DRAIN_TIMEOUT, drain(&mut stream)).await {
                Ok(Ok(discarded)) => {
                    if debug {
                        tracing::debug!(discarded, "drained rejected request");
                    }
                }
                Ok(Err(drain_err)) => tracing::debug!("drain after rejection failed: {}", drain_err),
                Err(_) => tracing::warn!("peer kept sending after an oversized request"),
            }
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    let bytes = match encode_response(&response) {
        Ok(bytes) => bytes,
        Err(e) => encode_response(&Response::error(format!("failed to encode response: {e}")))?,
    };

    if let Err(e) = write_frame(&mut stream, &bytes).await {
        tracing::error!("failed to write response: {}", e);
        return Err(e);
    }

    // The client closes the connection once it has the response.
    let discarded = drain(&mut stream).await?;
    if discarded > 0 {
        tracing::warn!(discarded, "ignored bytes after the request frame");
    }
    Ok(())
}
