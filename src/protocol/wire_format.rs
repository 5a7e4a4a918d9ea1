//! Wire format constants and delimiter scanning.
//!
//! Every frame is a compact JSON envelope followed by a two-byte delimiter:
//! ```text
//! ┌──────────────────────────────┬──────┬──────┐
//! │ JSON envelope (UTF-8)        │ 0x1E │ 0x0A │
//! │ variable length              │  RS  │  LF  │
//! └──────────────────────────────┴──────┴──────┘
//! ```
//!
//! There is no length prefix. Compact `serde_json` output escapes every
//! control character inside strings and emits no whitespace between tokens,
//! so neither delimiter byte can appear inside an encoded envelope.

/// Frame delimiter: ASCII record separator followed by a line feed.
pub const DELIMITER: &[u8] = b"\x1e\n";

/// Delimiter length in bytes.
pub const DELIMITER_LEN: usize = DELIMITER.len();

/// Default maximum frame body size (64 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Default TCP port for both client and server.
pub const DEFAULT_PORT: u16 = 7889;

/// Default host for both client and server.
pub const DEFAULT_HOST: &str = "localhost";

/// Reserved function name used by the startup self-test.
pub const SELF_TEST_FUNCTION: &str = "___test";

/// Find the first delimiter in `haystack` at or after `from`.
///
/// Returns the offset of the delimiter's first byte.
#[inline]
pub fn find_delimiter(haystack: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(DELIMITER_LEN)
        .position(|w| w == DELIMITER)
        .map(|pos| pos + from)
}

/// Check whether `data` contains the delimiter anywhere.
#[inline]
pub fn contains_delimiter(data: &[u8]) -> bool {
    find_delimiter(data, 0).is_some()
}
