//! Client: one connection per call.
//!
//! Every [`Client::evoke`] walks the same path:
//! 1. Connect to the server
//! 2. Write the request frame
//! 3. Read until one response frame is complete
//! 4. Close the connection (on every exit path)
//!
//! Concurrent calls share nothing but the immutable configuration.
//!
//! # Example
//!
//! ```ignore
//! use evoke_rpc::{Client, ClientConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(ClientConfig::default().with_port(9999));
//!
//!     let response = client.evoke("add", json!({"a": 2, "b": 7})).await?;
//!     assert_eq!(response.results, Some(json!(9)));
//!
//!     let sum: i64 = client.call("add", &json!({"a": 5, "b": 5})).await?;
//!     assert_eq!(sum, 10);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::codec::{decode_response, encode_request, JsonCodec};
use crate::config::ClientConfig;
use crate::error::{Result, RpcError};
use crate::protocol::{FrameBuffer, Response};
use crate::transport::{connect, read_frame, write_frame};

/// RPC client.
///
/// Cheap to clone; clones share the configuration only.
#[derive(Debug, Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
}

impl Client {
    /// Create a client for the configured server.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Call `function_name` with `args` and return the response envelope.
    ///
    /// A handler failure is not an error here: it arrives as a response with
    /// `err` set. Use [`Client::call`] to turn it into one.
    ///
    /// # Errors
    ///
    /// - [`RpcError::EmptyFunctionName`] before any connection is made
    /// - [`RpcError::Connect`] if the server is unreachable
    /// - [`RpcError::Io`] / [`RpcError::ConnectionClosed`] if the connection
    ///   fails or closes before a response frame arrives
    /// - [`RpcError::MalformedEnvelope`] / [`RpcError::FrameTooLarge`] for a
    ///   bad response frame
    /// - [`RpcError::Timeout`] if the configured call deadline elapses
    pub async fn evoke(&self, function_name: &str, args: Value) -> Result<Response> {
        if function_name.is_empty() {
            return Err(RpcError::EmptyFunctionName);
        }

        let frame = encode_request(function_name, &args)?;
        if self.config.debug {
            tracing::debug!(
                function = function_name,
                addr = %self.config.addr(),
                frame_bytes = frame.len(),
                "sending request"
            );
        }

        let started = Instant::now();
        let exchange = self.exchange(&frame);
        let response = match self.config.call_timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| RpcError::Timeout(limit))??,
            None => exchange.await?,
        };

        if self.config.debug {
            tracing::debug!(
                function = function_name,
                handler_ms = response.handler_duration().map(|d| d.as_millis() as u64),
                round_trip_ms = started.elapsed().as_millis() as u64,
                ok = response.is_ok(),
                "request resolved"
            );
        }

        Ok(response)
    }

    /// Typed call: serialize `args`, deserialize the results.
    ///
    /// # Errors
    ///
    /// Everything [`Client::evoke`] returns, plus [`RpcError::Remote`] when
    /// the handler reported an error and [`RpcError::MalformedEnvelope`] when
    /// the results do not deserialize into `R`.
    pub async fn call<A, R>(&self, function_name: &str, args: &A) -> Result<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let args = JsonCodec::to_value(args)?;
        let results = self.evoke(function_name, args).await?.into_result()?;
        JsonCodec::from_value(results)
    }

    /// Connect, run the round trip, and close the connection.
    async fn exchange(&self, frame: &[u8]) -> Result<Response> {
        let mut stream = connect(&self.config.host, self.config.port).await?;

        let result = Self::round_trip(&mut stream, frame, self.config.max_frame_size).await;

        // Outcome is already decided; a failed shutdown changes nothing.
        let _ = stream.shutdown().await;
        result
    }

    async fn round_trip(
        stream: &mut TcpStream,
        frame: &[u8],
        max_frame_size: usize,
    ) -> Result<Response> {
        write_frame(stream, frame).await?;

        let mut frame_buffer = FrameBuffer::with_max_frame_size(max_frame_size);
        let response = read_frame(stream, &mut frame_buffer)
            .await?
            .ok_or(RpcError::ConnectionClosed)?;

        decode_response(response.body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_request, encode_response};
    use crate::transport::bind;
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    /// Spawn a one-shot fake server that answers the first connection with
    /// `reply` bytes, and return its port.
    async fn fake_server(reply: Vec<u8>) -> u16 {
        let listener = bind("127.0.0.1", 0).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buffer = FrameBuffer::new();
            let frame = read_frame(&mut stream, &mut buffer).await.unwrap().unwrap();
            decode_request(frame.body()).unwrap();
            stream.write_all(&reply).await.unwrap();
            // Hold the socket until the client closes it.
            let mut rest = Vec::new();
            let _ = stream.read_to_end(&mut rest).await;
        });

        port
    }

    fn client(port: u16) -> Client {
        Client::new(
            ClientConfig::default()
                .with_host("127.0.0.1")
                .with_port(port)
                .with_call_timeout(Duration::from_secs(5)),
        )
    }

    #[tokio::test]
    async fn test_evoke_resolves_with_response() {
        let reply = encode_response(&Response::success(1, 2, json!(9))).unwrap();
        let port = fake_server(reply).await;

        let response = client(port).evoke("add", json!({"a": 2, "b": 7})).await.unwrap();
        assert_eq!(response.results, Some(json!(9)));
    }

    #[tokio::test]
    async fn test_response_split_across_writes() {
        let listener = bind("127.0.0.1", 0).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buffer = FrameBuffer::new();
            read_frame(&mut stream, &mut buffer).await.unwrap();

            let reply = encode_response(&Response::success(1, 2, json!("pieces"))).unwrap();
            for chunk in reply.chunks(3) {
                stream.write_all(chunk).await.unwrap();
                stream.flush().await.unwrap();
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            let mut rest = Vec::new();
            let _ = stream.read_to_end(&mut rest).await;
        });

        let response = client(port).evoke("f", Value::Null).await.unwrap();
        assert_eq!(response.results, Some(json!("pieces")));
    }

    #[tokio::test]
    async fn test_malformed_response_rejects() {
        let port = fake_server(b"{not json\x1e\n".to_vec()).await;

        let result = client(port).evoke("add", Value::Null).await;
        assert!(matches!(result, Err(RpcError::MalformedEnvelope(_))));
    }

    #[tokio::test]
    async fn test_server_closing_without_frame_rejects() {
        let listener = bind("127.0.0.1", 0).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buffer = FrameBuffer::new();
            read_frame(&mut stream, &mut buffer).await.unwrap();
            stream.write_all(b"{\"err\":").await.unwrap();
            // Dropping the stream closes it mid-frame.
        });

        let result = client(port).evoke("add", Value::Null).await;
        assert!(matches!(result, Err(RpcError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_call_timeout() {
        let listener = bind("127.0.0.1", 0).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
            drop(stream);
        });

        let client = Client::new(
            ClientConfig::default()
                .with_host("127.0.0.1")
                .with_port(port)
                .with_call_timeout(Duration::from_millis(100)),
        );

        let result = client.evoke("hang", Value::Null).await;
        assert!(matches!(result, Err(RpcError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_empty_function_name_rejected_locally() {
        // Port 1 is never contacted.
        let result = client(1).evoke("", Value::Null).await;
        assert!(matches!(result, Err(RpcError::EmptyFunctionName)));
    }

    #[tokio::test]
    async fn test_call_maps_remote_error() {
        let reply = encode_response(&Response::failure(1, 2, "nope")).unwrap();
        let port = fake_server(reply).await;

        let result: Result<i64> = client(port).call("add", &json!({})).await;
        match result {
            Err(RpcError::Remote(msg)) => assert_eq!(msg, "nope"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_call_deserializes_results() {
        let reply = encode_response(&Response::success(1, 2, json!([1, 2, 3]))).unwrap();
        let port = fake_server(reply).await;

        let values: Vec<u8> = client(port).call("list", &()).await.unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }
}
