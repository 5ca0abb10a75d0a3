//! JSON-RPC 2.0 message types.
//!
//! Based on the MCP specification: https://modelcontextprotocol.io/

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// An incoming request, decoded permissively.
///
/// Every field is optional at the serde layer so envelope violations can be
/// reported as `-32600` instead of failing the parse; the dispatcher
/// enforces the actual envelope rules.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version field, must be "2.0"
    #[serde(default)]
    pub jsonrpc: Option<String>,

    /// Request ID; numeric for requests, absent for notifications
    #[serde(default)]
    pub id: Option<Value>,

    /// Method name
    #[serde(default)]
    pub method: Option<String>,

    /// Method parameters, an object when present
    #[serde(default)]
    pub params: Option<Value>,
}

/// An outgoing response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,

    /// Result (if successful)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,

    /// Request ID being answered; null when the request had no usable id
    pub id: Value,
}

impl JsonRpcResponse {
    /// Build a success response.
    pub fn success(id: Value, result: Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION.to_string(), result: Some(result), error: None, id }
    }

    /// Build an error response.
    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self { jsonrpc: JSONRPC_VERSION.to_string(), result: None, error: Some(error), id }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,

    /// Human-readable message
    pub message: String,

    /// Additional data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Input line did not parse as JSON.
    pub const PARSE_ERROR: i32 = -32700;
    /// Envelope violated JSON-RPC 2.0.
    pub const INVALID_REQUEST: i32 = -32600;
    /// Unknown method or unknown tool.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Malformed method parameters.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Any internal condition: listing errors, duplicates, child failures.
    pub const INTERNAL_ERROR: i32 = -32603;

    /// Create an error with the given code and message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    pub fn parse_error() -> Self {
        Self::new(Self::PARSE_ERROR, "Parse error")
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_REQUEST, message)
    }

    pub fn method_not_found(message: impl Into<String>) -> Self {
        Self::new(Self::METHOD_NOT_FOUND, message)
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_PARAMS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Self::INTERNAL_ERROR, message)
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcError {}

/// Parameters of a `tools/call` request.
#[derive(Debug, Clone, Deserialize)]
pub struct CallToolParams {
    /// Tool name
    pub name: String,

    /// Tool arguments; defaults to `{}` when absent
    #[serde(default)]
    pub arguments: Option<Value>,
}

impl CallToolParams {
    /// The argument value to hand to the tool.
    pub fn arguments_or_default(&self) -> Value {
        self.arguments.clone().unwrap_or_else(|| serde_json::json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_field_order() {
        let response = JsonRpcResponse::success(json!(2), json!({"ok": true}));
        let serialized = serde_json::to_string(&response).unwrap();
        assert_eq!(serialized, r#"{"jsonrpc":"2.0","result":{"ok":true},"id":2}"#);
    }

    #[test]
    fn test_error_response_omits_result() {
        let response =
            JsonRpcResponse::failure(Value::Null, JsonRpcError::method_not_found("Method not found"));
        let serialized = serde_json::to_string(&response).unwrap();
        assert!(serialized.contains(r#""error":{"code":-32601,"message":"Method not found"}"#));
        assert!(!serialized.contains("result"));
        assert!(serialized.ends_with(r#""id":null}"#));
    }

    #[test]
    fn test_permissive_request_decoding() {
        let request: JsonRpcRequest = serde_json::from_str(r#"{"method":"x"}"#).unwrap();
        assert_eq!(request.method.as_deref(), Some("x"));
        assert!(request.jsonrpc.is_none());
        assert!(request.id.is_none());
    }

    #[test]
    fn test_call_params_default_arguments() {
        let params: CallToolParams = serde_json::from_value(json!({"name": "t"})).unwrap();
        assert_eq!(params.arguments_or_default(), json!({}));

        let params: CallToolParams =
            serde_json::from_value(json!({"name": "t", "arguments": {"a": 1}})).unwrap();
        assert_eq!(params.arguments_or_default(), json!({"a": 1}));
    }

    #[test]
    fn test_call_params_require_string_name() {
        assert!(serde_json::from_value::<CallToolParams>(json!({"name": 7})).is_err());
        assert!(serde_json::from_value::<CallToolParams>(json!({})).is_err());
    }
}
