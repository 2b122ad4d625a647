//! JSON-RPC style message envelopes for the MCP wire protocol.
//!
//! Inbound messages are lenient: the `jsonrpc` marker and `params` are
//! optional, and a missing `id` marks a notification. Outbound envelopes
//! are strict: the version marker is always present and exactly one of
//! `result` or `error` is set.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version marker stamped on every outbound envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// The request body is not valid JSON.
pub const PARSE_ERROR: i64 = -32700;
/// The request is structurally not a valid envelope.
pub const INVALID_REQUEST: i64 = -32600;
/// The method is not part of the protocol surface.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// The parameters are missing or of the wrong shape.
pub const INVALID_PARAMS: i64 = -32602;
/// The server failed while producing a response.
pub const INTERNAL_ERROR: i64 = -32603;

/// Correlation id echoed verbatim from request to response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Integer id.
    Number(i64),
    /// String id.
    Text(String),
}

impl RequestId {
    /// Best-effort extraction of an `id` field from a raw JSON value.
    ///
    /// Used to echo the id on envelopes that fail structural validation.
    /// Ids that are neither strings nor integers are treated as absent.
    #[must_use]
    pub fn from_value(raw: &Value) -> Option<Self> {
        match raw.get("id") {
            Some(Value::Number(n)) => n.as_i64().map(Self::Number),
            Some(Value::String(s)) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Inbound request or notification.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestEnvelope {
    /// Protocol version marker; clients may omit it.
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Correlation id; absent for notifications.
    #[serde(default)]
    pub id: Option<RequestId>,
    /// Protocol method name.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Option<Value>,
}

impl RequestEnvelope {
    /// Whether this message is a notification (no id, no response due).
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Outbound response carrying exactly one of `result` or `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Protocol version marker, always [`JSONRPC_VERSION`].
    pub jsonrpc: String,
    /// Correlation id echoed from the request; null when the request id
    /// could not be recovered.
    pub id: Option<RequestId>,
    /// Success payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl ResponseEnvelope {
    /// Build a success envelope echoing `id`.
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// Build a protocol-error envelope.
    #[must_use]
    pub fn error(id: Option<RequestId>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Protocol-level error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    /// Numeric JSON-RPC error code.
    pub code: i64,
    /// Human-readable failure description.
    pub message: String,
}

/// One content block inside a tool result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    /// Plain text block.
    #[serde(rename = "text")]
    Text {
        /// The text payload.
        text: String,
    },
}

/// Uniform result shape for `call_tool` responses.
///
/// Every tool outcome, including unknown tool names and handler failures,
/// is reported as a success envelope wrapping this shape; only malformed
/// envelopes and unknown methods produce protocol-level errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Ordered content blocks.
    pub content: Vec<ToolContent>,
    /// True when the call failed at the tool level.
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolResult {
    /// Build a successful result with one text block.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Build a failed result with one text block.
    #[must_use]
    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: true,
        }
    }

    /// Serialize into the `result` value of a response envelope.
    #[must_use]
    pub fn into_value(self) -> Value {
        serde_json::to_value(&self).unwrap_or_else(|_| {
            serde_json::json!({
                "content": [{ "type": "text", "text": "result serialization failed" }],
                "isError": true,
            })
        })
    }
}
