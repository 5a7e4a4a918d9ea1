//! Frame buffer for accumulating partial reads.
//!
//! TCP delivers a byte stream with no message boundaries: one read may carry
//! a fraction of a frame, exactly one frame, or several frames. The buffer
//! appends every chunk and splits at each delimiter it finds.
//!
//! Scanning resumes where the previous push stopped (minus the delimiter
//! length, in case the delimiter itself straddles two chunks), so a large
//! frame arriving in many small reads is scanned once.
//!
//! # Example
//!
//! ```
//! use evoke_rpc::protocol::FrameBuffer;
//!
//! let mut buffer = FrameBuffer::new();
//!
//! assert!(buffer.push(b"{\"functionName\":\"add\",").unwrap().is_empty());
//! let frames = buffer.push(b"\"args\":{}}\x1e\n").unwrap();
//!
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].body(), b"{\"functionName\":\"add\",\"args\":{}}");
//! ```

use bytes::{Buf, BytesMut};

use super::wire_format::{find_delimiter, DEFAULT_MAX_FRAME_SIZE, DELIMITER_LEN};
use super::Frame;
use crate::error::{Result, RpcError};

/// Initial buffer capacity (64KB).
const INITIAL_CAPACITY: usize = 64 * 1024;

/// Buffer for accumulating incoming bytes and extracting complete frames.
///
/// One buffer belongs to exactly one connection.
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Bytes of `buffer` already searched without finding a delimiter.
    scanned: usize,
    /// Maximum allowed frame body size.
    max_frame_size: usize,
}

impl FrameBuffer {
    /// Create a new frame buffer with the default maximum frame size.
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a new frame buffer with a custom maximum frame size.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_CAPACITY.min(max_frame_size.saturating_add(DELIMITER_LEN))),
            scanned: 0,
            max_frame_size,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Returns the frames completed by this chunk, in arrival order. Bytes
    /// after the last delimiter stay buffered for the next push.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::FrameTooLarge`] once the pending frame is known to
    /// exceed the maximum frame size.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one()? {
            frames.push(frame);
        }

        Ok(frames)
    }

    /// Try to extract a single frame from the front of the buffer.
    fn try_extract_one(&mut self) -> Result<Option<Frame>> {
        let from = self.scanned.saturating_sub(DELIMITER_LEN - 1);

        match find_delimiter(&self.buffer, from) {
            Some(pos) => {
                if pos > self.max_frame_size {
                    return Err(RpcError::FrameTooLarge {
                        size: pos,
                        max: self.max_frame_size,
                    });
                }

                let body = self.buffer.split_to(pos).freeze();
                self.buffer.advance(DELIMITER_LEN);
                self.scanned = 0;

                Ok(Some(Frame::new(body)))
            }
            None => {
                self.scanned = self.buffer.len();

                // A body of exactly max bytes may still be followed by a
                // partial delimiter.
                if self.buffer.len() > self.max_frame_size.saturating_add(DELIMITER_LEN - 1) {
                    return Err(RpcError::FrameTooLarge {
                        size: self.buffer.len(),
                        max: self.max_frame_size,
                    });
                }

                Ok(None)
            }
        }
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Discard buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::build_frame;

    #[test]
    fn test_single_complete_frame() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(&build_frame(b"hello").unwrap()).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].body(), b"hello");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut buffer = FrameBuffer::new();

        let mut combined = build_frame(b"first").unwrap();
        combined.extend(build_frame(b"second").unwrap());
        combined.extend(build_frame(b"third").unwrap());

        let frames = buffer.push(&combined).unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].body(), b"first");
        assert_eq!(frames[1].body(), b"second");
        assert_eq!(frames[2].body(), b"third");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fragmented_body() {
        let mut buffer = FrameBuffer::new();
        let bytes = build_frame(b"this body arrives in two reads").unwrap();

        let frames = buffer.push(&bytes[..10]).unwrap();
        assert!(frames.is_empty());
        assert_eq!(buffer.len(), 10);

        let frames = buffer.push(&bytes[10..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].body(), b"this body arrives in two reads");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_delimiter_split_across_pushes() {
        let mut buffer = FrameBuffer::new();

        assert!(buffer.push(b"abc\x1e").unwrap().is_empty());
        let frames = buffer.push(b"\n").unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].body(), b"abc");
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = FrameBuffer::new();
        let bytes = build_frame(b"{\"k\":[1,2,3]}").unwrap();

        let mut all_frames = Vec::new();
        for byte in &bytes {
            all_frames.extend(buffer.push(&[*byte]).unwrap());
        }

        assert_eq!(all_frames.len(), 1);
        assert_eq!(all_frames[0].body(), b"{\"k\":[1,2,3]}");
    }

    #[test]
    fn test_mixed_complete_and_partial() {
        let mut buffer = FrameBuffer::new();

        let mut data = build_frame(b"first").unwrap();
        data.extend_from_slice(b"sec");

        let frames = buffer.push(&data).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].body(), b"first");
        assert_eq!(buffer.len(), 3);

        let frames = buffer.push(b"ond\x1e\n").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].body(), b"second");
    }

    #[test]
    fn test_empty_body() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(b"\x1e\n").unwrap();

        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_empty());
    }

    #[test]
    fn test_large_frame_in_small_chunks() {
        let mut buffer = FrameBuffer::new();
        let body = vec![b'x'; 3 * 1024 * 1024];
        let bytes = build_frame(&body).unwrap();

        let mut frames = Vec::new();
        for chunk in bytes.chunks(16 * 1024) {
            frames.extend(buffer.push(chunk).unwrap());
        }

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), body.len());
        assert_eq!(frames[0].body(), &body[..]);
    }

    #[test]
    fn test_max_frame_size_without_delimiter() {
        let mut buffer = FrameBuffer::with_max_frame_size(100);

        assert!(buffer.push(&[b'a'; 100]).unwrap().is_empty());
        assert!(buffer.push(b"\x1e").unwrap().is_empty());

        let result = buffer.push(b"b");
        assert!(matches!(
            result,
            Err(RpcError::FrameTooLarge { size: 102, max: 100 })
        ));
    }

    #[test]
    fn test_frame_at_exact_max_size_is_accepted() {
        let mut buffer = FrameBuffer::with_max_frame_size(100);
        let bytes = build_frame(&[b'a'; 100]).unwrap();

        let frames = buffer.push(&bytes).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 100);
    }

    #[test]
    fn test_oversized_frame_in_single_push() {
        let mut buffer = FrameBuffer::with_max_frame_size(4);
        let result = buffer.push(&build_frame(b"too long").unwrap());

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_clear_resets_state() {
        let mut buffer = FrameBuffer::new();
        buffer.push(b"partial").unwrap();
        assert_eq!(buffer.len(), 7);

        buffer.clear();
        assert!(buffer.is_empty());

        let frames = buffer.push(b"next\x1e\n").unwrap();
        assert_eq!(frames[0].body(), b"next");
    }
}
