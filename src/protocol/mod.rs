//! Protocol module - envelopes, wire format, and framing.
//!
//! This module implements the data plane of a call:
//! - request and response envelopes
//! - the delimiter that terminates every frame
//! - frame buffer for reassembling frames from partial reads

mod envelope;
mod frame;
mod frame_buffer;
mod wire_format;

pub use envelope::{now_millis, Request, Response};
pub use frame::{build_frame, Frame};
pub use frame_buffer::FrameBuffer;
pub use wire_format::{
    contains_delimiter, find_delimiter, DEFAULT_HOST, DEFAULT_MAX_FRAME_SIZE, DEFAULT_PORT,
    DELIMITER, DELIMITER_LEN, SELF_TEST_FUNCTION,
};
