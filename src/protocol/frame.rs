//! Frame struct and frame building.
//!
//! A [`Frame`] is the body of one delimited frame, with the delimiter
//! stripped. Uses `bytes::Bytes` so the body can be handed to the codec
//! without copying out of the accumulation buffer.
//!
//! # Example
//!
//! ```
//! use evoke_rpc::protocol::{build_frame, Frame, DELIMITER};
//! use bytes::Bytes;
//!
//! let bytes = build_frame(b"{}").unwrap();
//! assert!(bytes.ends_with(DELIMITER));
//!
//! let frame = Frame::new(Bytes::from_static(b"{}"));
//! assert_eq!(frame.body(), b"{}");
//! ```

use bytes::Bytes;

use super::wire_format::{contains_delimiter, DELIMITER, DELIMITER_LEN};
use crate::error::{Result, RpcError};

/// A complete frame body, delimiter excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    body: Bytes,
}

impl Frame {
    /// Create a frame from an already extracted body.
    pub fn new(body: Bytes) -> Self {
        Self { body }
    }

    /// Get a reference to the body bytes.
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body length, delimiter excluded.
    #[inline]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Check whether the body is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Build a complete frame: `body` followed by the delimiter.
///
/// # Errors
///
/// Returns [`RpcError::DelimiterInPayload`] if the body contains the
/// delimiter, since the receiving side would split the frame there.
pub fn build_frame(body: &[u8]) -> Result<Vec<u8>> {
    if contains_delimiter(body) {
        return Err(RpcError::DelimiterInPayload);
    }
    let mut buf = Vec::with_capacity(body.len() + DELIMITER_LEN);
    buf.extend_from_slice(body);
    buf.extend_from_slice(DELIMITER);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_frame_appends_delimiter() {
        let bytes = build_frame(b"hello").unwrap();
        assert_eq!(bytes.len(), 5 + DELIMITER_LEN);
        assert_eq!(&bytes[..5], b"hello");
        assert_eq!(&bytes[5..], DELIMITER);
    }

    #[test]
    fn test_build_frame_empty_body() {
        let bytes = build_frame(b"").unwrap();
        assert_eq!(bytes, DELIMITER);
    }

    #[test]
    fn test_build_frame_rejects_embedded_delimiter() {
        let result = build_frame(b"abc\x1e\ndef");
        assert!(matches!(result, Err(RpcError::DelimiterInPayload)));
    }

    #[test]
    fn test_frame_accessors() {
        let frame = Frame::new(Bytes::from_static(b"payload"));
        assert_eq!(frame.len(), 7);
        assert!(!frame.is_empty());
        assert_eq!(frame.body(), b"payload");
    }
}
