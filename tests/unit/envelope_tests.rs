//! Wire envelope shapes: lenient parsing in, strict serialization out.

use gitvitae::mcp::envelope::{
    RequestEnvelope, RequestId, ResponseEnvelope, ToolResult, INTERNAL_ERROR, PARSE_ERROR,
};
use serde_json::json;

#[test]
fn request_parses_with_numeric_id() {
    let envelope: RequestEnvelope =
        serde_json::from_str(r#"{"jsonrpc":"2.0","id":7,"method":"list_tools"}"#).unwrap();
    assert_eq!(envelope.jsonrpc.as_deref(), Some("2.0"));
    assert_eq!(envelope.id, Some(RequestId::Number(7)));
    assert_eq!(envelope.method, "list_tools");
    assert!(envelope.params.is_none());
    assert!(!envelope.is_notification());
}

#[test]
fn request_parses_with_string_id() {
    let envelope: RequestEnvelope =
        serde_json::from_str(r#"{"id":"req-1","method":"call_tool","params":{}}"#).unwrap();
    assert_eq!(envelope.id, Some(RequestId::Text("req-1".to_owned())));
}

#[test]
fn jsonrpc_marker_is_optional() {
    let envelope: RequestEnvelope =
        serde_json::from_str(r#"{"id":1,"method":"list_tools"}"#).unwrap();
    assert!(envelope.jsonrpc.is_none());
    assert_eq!(envelope.id, Some(RequestId::Number(1)));
}

#[test]
fn missing_id_marks_a_notification() {
    let envelope: RequestEnvelope = serde_json::from_str(r#"{"method":"list_tools"}"#).unwrap();
    assert!(envelope.is_notification());
}

#[test]
fn missing_method_is_a_parse_failure() {
    let result: Result<RequestEnvelope, _> = serde_json::from_str(r#"{"id":1}"#);
    assert!(result.is_err());
}

#[test]
fn non_string_method_is_a_parse_failure() {
    let result: Result<RequestEnvelope, _> = serde_json::from_str(r#"{"id":1,"method":17}"#);
    assert!(result.is_err());
}

#[test]
fn success_envelope_carries_version_id_and_result_only() {
    let envelope = ResponseEnvelope::success(RequestId::Number(4), json!({"ok": true}));
    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["jsonrpc"], "2.0");
    assert_eq!(value["id"], 4);
    assert_eq!(value["result"]["ok"], true);
    assert!(value.get("error").is_none());
}

#[test]
fn error_envelope_serializes_null_id_when_unrecoverable() {
    let envelope = ResponseEnvelope::error(None, PARSE_ERROR, "parse error");
    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["jsonrpc"], "2.0");
    assert!(value["id"].is_null());
    assert_eq!(value["error"]["code"], -32700);
    assert_eq!(value["error"]["message"], "parse error");
    assert!(value.get("result").is_none());
}

#[test]
fn error_envelope_echoes_string_id() {
    let envelope = ResponseEnvelope::error(
        Some(RequestId::Text("abc".to_owned())),
        INTERNAL_ERROR,
        "broken",
    );
    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["id"], "abc");
    assert_eq!(value["error"]["code"], -32603);
}

#[test]
fn id_recovery_accepts_scalars_and_rejects_the_rest() {
    assert_eq!(
        RequestId::from_value(&json!({"id": 9})),
        Some(RequestId::Number(9))
    );
    assert_eq!(
        RequestId::from_value(&json!({"id": "x"})),
        Some(RequestId::Text("x".to_owned()))
    );
    assert_eq!(RequestId::from_value(&json!({"id": {"nested": 1}})), None);
    assert_eq!(RequestId::from_value(&json!({"id": [1]})), None);
    assert_eq!(RequestId::from_value(&json!({"id": null})), None);
    assert_eq!(RequestId::from_value(&json!({"method": "x"})), None);
}

#[test]
fn tool_result_success_shape() {
    let value = ToolResult::success("all good").into_value();
    assert_eq!(value["content"][0]["type"], "text");
    assert_eq!(value["content"][0]["text"], "all good");
    assert_eq!(value["isError"], false);
}

#[test]
fn tool_result_failure_sets_is_error() {
    let value = ToolResult::failure("it broke").into_value();
    assert_eq!(value["content"][0]["text"], "it broke");
    assert_eq!(value["isError"], true);
}
