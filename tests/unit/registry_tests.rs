//! Registry ordering, lookup, and duplicate rejection.

use std::sync::Arc;

use gitvitae::mcp::registry::ToolRegistry;
use serde_json::json;

use super::test_helpers::{descriptor, EchoTool};

#[test]
fn list_preserves_registration_order() {
    let mut registry = ToolRegistry::new();
    registry
        .register(descriptor("zeta", &[]), Arc::new(EchoTool))
        .unwrap();
    registry
        .register(descriptor("alpha", &[]), Arc::new(EchoTool))
        .unwrap();
    registry
        .register(descriptor("mid", &[]), Arc::new(EchoTool))
        .unwrap();

    let names: Vec<&str> = registry
        .list()
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(names, ["zeta", "alpha", "mid"]);
    assert_eq!(registry.len(), 3);
    assert!(!registry.is_empty());
}

#[test]
fn resolve_finds_registered_tools_only() {
    let mut registry = ToolRegistry::new();
    registry
        .register(descriptor("present", &[]), Arc::new(EchoTool))
        .unwrap();

    assert!(registry.resolve("present").is_some());
    assert!(registry.resolve("absent").is_none());
    assert!(registry.resolve("Present").is_none());
}

#[test]
fn duplicate_names_are_rejected() {
    let mut registry = ToolRegistry::new();
    registry
        .register(descriptor("twice", &[]), Arc::new(EchoTool))
        .unwrap();

    let err = registry
        .register(descriptor("twice", &[]), Arc::new(EchoTool))
        .unwrap_err();
    assert!(err.to_string().contains("duplicate tool name: twice"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn required_fields_reads_the_schema() {
    let with_required = descriptor("strict", &["directory", "name"]);
    assert_eq!(with_required.required_fields(), ["directory", "name"]);

    let without_required = descriptor("loose", &[]);
    assert!(without_required.required_fields().is_empty());
}

#[test]
fn required_fields_tolerates_schemas_without_the_key() {
    let mut bare = descriptor("bare", &[]);
    bare.input_schema = json!({"type": "object"});
    assert!(bare.required_fields().is_empty());

    bare.input_schema = json!({"type": "object", "required": "directory"});
    assert!(bare.required_fields().is_empty());
}

#[test]
fn empty_registry_reports_empty() {
    let registry = ToolRegistry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
    assert!(registry.list().is_empty());
}
