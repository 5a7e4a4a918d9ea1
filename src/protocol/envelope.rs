//! Request and response envelopes.
//!
//! Field names on the wire are fixed by the protocol, hence the explicit
//! serde renames.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, RpcError};

/// A call: function name plus an opaque argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Name the handler is registered under.
    #[serde(rename = "functionName")]
    pub function_name: String,
    /// Arguments, passed to the handler unmodified.
    #[serde(default)]
    pub args: Value,
}

impl Request {
    /// Create a new request.
    pub fn new(function_name: impl Into<String>, args: Value) -> Self {
        Self {
            function_name: function_name.into(),
            args,
        }
    }

    /// Reject requests that cannot be routed.
    pub fn validate(&self) -> Result<()> {
        if self.function_name.is_empty() {
            return Err(RpcError::EmptyFunctionName);
        }
        Ok(())
    }
}

/// Outcome of a call.
///
/// Timestamps are milliseconds since the Unix epoch and are only present
/// once a handler actually ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// When the handler was invoked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_fn_start: Option<u64>,
    /// When the handler replied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_fn_end: Option<u64>,
    /// Handler or dispatch failure.
    #[serde(default)]
    pub err: Option<String>,
    /// Handler result; absent whenever `err` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
}

impl Response {
    /// Successful response for a handler that ran between `start` and `end`.
    pub fn success(start: u64, end: u64, results: Value) -> Self {
        Self {
            timestamp_fn_start: Some(start),
            timestamp_fn_end: Some(end.max(start)),
            err: None,
            results: Some(results),
        }
    }

    /// Failed response for a handler that ran between `start` and `end`.
    pub fn failure(start: u64, end: u64, err: impl Into<String>) -> Self {
        Self {
            timestamp_fn_start: Some(start),
            timestamp_fn_end: Some(end.max(start)),
            err: Some(err.into()),
            results: None,
        }
    }

    /// Error response produced before any handler ran.
    pub fn error(err: impl Into<String>) -> Self {
        Self {
            timestamp_fn_start: None,
            timestamp_fn_end: None,
            err: Some(err.into()),
            results: None,
        }
    }

    /// Routing failure for an unregistered function.
    pub fn not_found(function_name: &str) -> Self {
        Self::error(format!("function {function_name} not found"))
    }

    /// Check whether the call succeeded.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }

    /// Time the handler took, if it ran.
    pub fn handler_duration(&self) -> Option<Duration> {
        match (self.timestamp_fn_start, self.timestamp_fn_end) {
            (Some(start), Some(end)) => Some(Duration::from_millis(end.saturating_sub(start))),
            _ => None,
        }
    }

    /// Convert into the handler's result, mapping `err` to [`RpcError::Remote`].
    ///
    /// A successful call whose handler returned `null` yields `Value::Null`.
    pub fn into_result(self) -> Result<Value> {
        match self.err {
            Some(err) => Err(RpcError::Remote(err)),
            None => Ok(self.results.unwrap_or(Value::Null)),
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_field_names() {
        let request = Request::new("add", json!({"a": 2, "b": 7}));
        let text = serde_json::to_string(&request).unwrap();
        assert_eq!(text, r#"{"functionName":"add","args":{"a":2,"b":7}}"#);
    }

    #[test]
    fn test_request_missing_args_defaults_to_null() {
        let request: Request = serde_json::from_str(r#"{"functionName":"ping"}"#).unwrap();
        assert_eq!(request.args, Value::Null);
    }

    #[test]
    fn test_request_validate_rejects_empty_name() {
        let request = Request::new("", Value::Null);
        assert!(matches!(request.validate(), Err(RpcError::EmptyFunctionName)));
    }

    #[test]
    fn test_success_response_wire_shape() {
        let response = Response::success(10, 15, json!(9));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({"timestamp_fn_start": 10, "timestamp_fn_end": 15, "err": null, "results": 9})
        );
    }

    #[test]
    fn test_not_found_has_no_timestamps_or_results() {
        let response = Response::not_found("missing");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({"err": "function missing not found"}));
        assert!(!response.is_ok());
        assert!(response.handler_duration().is_none());
    }

    #[test]
    fn test_end_timestamp_clamped_to_start() {
        let response = Response::success(100, 90, Value::Null);
        assert_eq!(response.timestamp_fn_end, Some(100));
        assert_eq!(response.handler_duration(), Some(Duration::ZERO));
    }

    #[test]
    fn test_null_results_decode_as_absent() {
        let response: Response =
            serde_json::from_str(r#"{"timestamp_fn_start":1,"timestamp_fn_end":2,"err":null,"results":null}"#)
                .unwrap();
        assert!(response.results.is_none());
        assert_eq!(response.into_result().unwrap(), Value::Null);
    }

    #[test]
    fn test_into_result_maps_err_to_remote() {
        let response = Response::failure(1, 2, "boom");
        match response.into_result() {
            Err(RpcError::Remote(msg)) => assert_eq!(msg, "boom"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
