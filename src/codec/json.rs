//! JSON codec using `serde_json`.
//!
//! **Always compact.** `to_vec` emits no whitespace between tokens and
//! escapes control characters inside strings, which is what keeps the frame
//! delimiter out of encoded envelopes. Never switch to `to_vec_pretty`.
//!
//! # Example
//!
//! ```
//! use evoke_rpc::codec::JsonCodec;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Sum {
//!     a: i64,
//!     b: i64,
//! }
//!
//! let encoded = JsonCodec::encode(&Sum { a: 2, b: 7 }).unwrap();
//! let decoded: Sum = JsonCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, Sum { a: 2, b: 7 });
//! ```

use serde_json::Value;

use crate::error::Result;

/// JSON codec for envelopes and argument values.
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a value to compact JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized (e.g. a map with
    /// non-string keys).
    #[inline]
    pub fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    /// Decode JSON bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RpcError::MalformedEnvelope`] if the bytes are not
    /// valid JSON for type T.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Convert a dynamic value into a typed one.
    #[inline]
    pub fn from_value<T: serde::de::DeserializeOwned>(value: Value) -> Result<T> {
        Ok(serde_json::from_value(value)?)
    }

    /// Convert a typed value into a dynamic one.
    #[inline]
    pub fn to_value<T: serde::Serialize + ?Sized>(value: &T) -> Result<Value> {
        Ok(serde_json::to_value(value)?)
    }
}
