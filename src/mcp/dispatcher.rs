//! Transport-independent request routing.
//!
//! The dispatcher owns the tool catalogue and turns raw inbound lines into
//! response envelopes. Transports feed it text and deliver whatever comes
//! back; they never inspect methods or params themselves.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info_span, warn, Instrument};

use crate::mcp::envelope::{
    RequestEnvelope, RequestId, ResponseEnvelope, ToolResult, INTERNAL_ERROR, INVALID_PARAMS,
    INVALID_REQUEST, JSONRPC_VERSION, METHOD_NOT_FOUND, PARSE_ERROR,
};
use crate::mcp::registry::ToolRegistry;

/// Routes parsed request envelopes to protocol methods and tool handlers.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    /// Create a dispatcher over a fixed tool catalogue.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// The catalogue this dispatcher serves.
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Handle one raw line from a transport.
    ///
    /// Returns `None` for notifications (messages without an id), which by
    /// contract never receive a response. Every other input, including
    /// unparseable garbage, produces exactly one response envelope.
    pub async fn handle_line(&self, raw: &str) -> Option<ResponseEnvelope> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(%err, "inbound message is not valid JSON");
                return Some(ResponseEnvelope::error(
                    None,
                    PARSE_ERROR,
                    format!("parse error: {err}"),
                ));
            }
        };

        let envelope: RequestEnvelope = match serde_json::from_value(value.clone()) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(%err, "inbound message is not a valid request envelope");
                return Some(ResponseEnvelope::error(
                    RequestId::from_value(&value),
                    INVALID_REQUEST,
                    format!("invalid request: {err}"),
                ));
            }
        };

        if let Some(version) = &envelope.jsonrpc {
            if version != JSONRPC_VERSION {
                return Some(ResponseEnvelope::error(
                    envelope.id,
                    INVALID_REQUEST,
                    format!("unsupported protocol version: {version}"),
                ));
            }
        }

        let Some(id) = envelope.id else {
            debug!(method = %envelope.method, "dropping notification");
            return None;
        };

        let span = info_span!("dispatch", id = %id, method = %envelope.method);
        Some(
            self.dispatch(id, envelope.method, envelope.params)
                .instrument(span)
                .await,
        )
    }

    /// Dispatch a validated request to its method implementation.
    async fn dispatch(
        &self,
        id: RequestId,
        method: String,
        params: Option<Value>,
    ) -> ResponseEnvelope {
        match method.as_str() {
            "list_tools" => self.list_tools(id),
            "call_tool" => self.call_tool(id, params).await,
            other => ResponseEnvelope::error(
                Some(id),
                METHOD_NOT_FOUND,
                format!("method not found: {other}"),
            ),
        }
    }

    /// The `list_tools` method: descriptors in registration order.
    fn list_tools(&self, id: RequestId) -> ResponseEnvelope {
        match serde_json::to_value(self.registry.list()) {
            Ok(tools) => ResponseEnvelope::success(id, serde_json::json!({ "tools": tools })),
            Err(err) => ResponseEnvelope::error(
                Some(id),
                INTERNAL_ERROR,
                format!("failed to serialize tool catalogue: {err}"),
            ),
        }
    }

    /// The `call_tool` method.
    ///
    /// Malformed params are protocol errors; everything downstream of a
    /// well-formed call (unknown name, missing required argument, handler
    /// failure) is reported as an error result so callers always consume
    /// one uniform shape.
    async fn call_tool(&self, id: RequestId, params: Option<Value>) -> ResponseEnvelope {
        let Some(Value::Object(params)) = params else {
            return ResponseEnvelope::error(
                Some(id),
                INVALID_PARAMS,
                "call_tool params must be an object",
            );
        };

        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return ResponseEnvelope::error(
                Some(id),
                INVALID_PARAMS,
                "call_tool params require a string `name`",
            );
        };

        let args = match params.get("arguments") {
            None | Some(Value::Null) => serde_json::Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => {
                return ResponseEnvelope::error(
                    Some(id),
                    INVALID_PARAMS,
                    "call_tool `arguments` must be an object",
                );
            }
        };

        let Some(entry) = self.registry.resolve(name) else {
            warn!(tool = name, "unknown tool requested");
            return ResponseEnvelope::success(
                id,
                ToolResult::failure(format!("Unknown tool: {name}")).into_value(),
            );
        };

        for field in entry.descriptor.required_fields() {
            if !args.contains_key(field) {
                return ResponseEnvelope::success(
                    id,
                    ToolResult::failure(format!(
                        "missing required argument `{field}` for tool {name}"
                    ))
                    .into_value(),
                );
            }
        }

        match entry.handler.call(args).await {
            Ok(output) => ResponseEnvelope::success(
                id,
                ToolResult::success(output.to_string()).into_value(),
            ),
            Err(err) => {
                warn!(tool = name, %err, "tool handler failed");
                ResponseEnvelope::success(id, ToolResult::failure(err.to_string()).into_value())
            }
        }
    }
}
