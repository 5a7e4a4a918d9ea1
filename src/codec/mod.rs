//! Codec module - serialization of envelopes and argument values.
//!
//! - [`JsonCodec`] - compact JSON using `serde_json`
//! - [`encode_request`], [`encode_response`], [`decode_request`],
//!   [`decode_response`] - envelope ⇄ frame bytes
//!
//! # Design
//!
//! Codecs are marker structs with static methods rather than trait objects;
//! the protocol has exactly one payload format.
//!
//! # Example
//!
//! ```
//! use evoke_rpc::codec::{decode_request, encode_request};
//! use serde_json::json;
//!
//! let frame = encode_request("add", &json!({"a": 2, "b": 7})).unwrap();
//! let request = decode_request(&frame).unwrap();
//! assert_eq!(request.function_name, "add");
//! ```

mod envelope;
mod json;

pub use envelope::{decode_request, decode_response, encode_request, encode_response};
pub use json::JsonCodec;
