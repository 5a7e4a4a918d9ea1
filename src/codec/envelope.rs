//! Envelope encoding: envelope ⇄ delimited frame bytes.
//!
//! Encoding produces a complete frame (JSON body plus delimiter), ready to be
//! written to a socket. Decoding accepts a frame body as produced by
//! [`FrameBuffer`](crate::protocol::FrameBuffer); a trailing delimiter, if
//! still attached, is ignored.

use serde_json::Value;

use super::JsonCodec;
use crate::error::Result;
use crate::protocol::{build_frame, Request, Response, DELIMITER};

/// Encode a request envelope as a complete frame.
pub fn encode_request(function_name: &str, args: &Value) -> Result<Vec<u8>> {
    #[derive(serde::Serialize)]
    struct RequestRef<'a> {
        #[serde(rename = "functionName")]
        function_name: &'a str,
        args: &'a Value,
    }

    let body = JsonCodec::encode(&RequestRef {
        function_name,
        args,
    })?;
    build_frame(&body)
}

/// Encode a response envelope as a complete frame.
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    let body = JsonCodec::encode(response)?;
    build_frame(&body)
}

/// Decode a request envelope.
///
/// # Errors
///
/// Returns [`crate::RpcError::MalformedEnvelope`] if the body is not a request
/// envelope, or [`crate::RpcError::EmptyFunctionName`] if the function name
/// is empty.
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    let request: Request = JsonCodec::decode(strip_delimiter(bytes))?;
    request.validate()?;
    Ok(request)
}

/// Decode a response envelope.
///
/// # Errors
///
/// Returns [`crate::RpcError::MalformedEnvelope`] if the body is not a
/// response envelope.
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    JsonCodec::decode(strip_delimiter(bytes))
}

fn strip_delimiter(bytes: &[u8]) -> &[u8] {
    bytes.strip_suffix(DELIMITER).unwrap_or(bytes)
}
