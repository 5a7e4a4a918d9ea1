//! Client and server configuration.
//!
//! Each client or server owns one immutable configuration value; there are
//! no process-wide defaults to mutate.
//!
//! # Example
//!
//! ```
//! use evoke_rpc::config::{ClientConfig, ServerConfig};
//! use std::time::Duration;
//!
//! let server = ServerConfig::default()
//!     .with_port(9999)
//!     .with_handler_timeout(Duration::from_secs(5));
//! let client = ClientConfig::default().with_port(9999).with_debug(true);
//!
//! assert_eq!(client.addr(), "localhost:9999");
//! assert_eq!(server.port, 9999);
//! ```

use std::time::Duration;

use crate::protocol::{DEFAULT_HOST, DEFAULT_MAX_FRAME_SIZE, DEFAULT_PORT};

/// Configuration for a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server host name or IP address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Emit per-call debug events.
    pub debug: bool,
    /// Deadline for a whole call (connect, send, await response). None = wait forever.
    pub call_timeout: Option<Duration>,
    /// Maximum response frame size.
    pub max_frame_size: usize,
}

impl ClientConfig {
    /// Set the server host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the server port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enable or disable debug events.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the whole-call deadline.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Set the maximum response frame size.
    pub fn with_max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = max;
        self
    }

    /// `host:port` as used for connecting.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            debug: false,
            call_timeout: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Configuration for a [`Server`](crate::Server).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host name or IP address to bind.
    pub host: String,
    /// Port to bind; 0 picks an ephemeral port.
    pub port: u16,
    /// Emit per-call debug events.
    pub debug: bool,
    /// Deadline for a handler to reply. None = wait forever.
    pub handler_timeout: Option<Duration>,
    /// Maximum request frame size.
    pub max_frame_size: usize,
    /// Run a round trip against the reserved test function before `listen` returns.
    pub self_test: bool,
}

impl ServerConfig {
    /// Set the host to bind.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port to bind.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enable or disable debug events.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the handler deadline.
    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = Some(timeout);
        self
    }

    /// Set the maximum request frame size.
    pub fn with_max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = max;
        self
    }

    /// Enable or disable the startup self-test.
    pub fn with_self_test(mut self, enabled: bool) -> Self {
        self.self_test = enabled;
        self
    }

    /// `host:port` as used for binding.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            debug: false,
            handler_timeout: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            self_test: false,
        }
    }
}
