//! Tool catalogue: descriptors plus handler lookup.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{AppError, Result};

/// Discovery metadata for one callable tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique, stable tool identifier.
    pub name: String,
    /// Human-readable description shown by discovery.
    pub description: String,
    /// JSON-schema-shaped contract for the arguments object.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Property names listed in the schema's `required` array.
    #[must_use]
    pub fn required_fields(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Handler invoked when a registered tool is called.
pub trait ToolHandler: Send + Sync {
    /// Invoke the tool with the caller-supplied arguments object.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] when the tool cannot produce a result; the
    /// dispatcher converts the failure into an error result for the
    /// caller rather than a protocol error.
    fn call(
        &self,
        args: serde_json::Map<String, Value>,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>>;
}

/// One registry entry: a descriptor and its handler.
pub struct ToolEntry {
    /// Discovery metadata.
    pub descriptor: ToolDescriptor,
    /// Invocation target.
    pub handler: Arc<dyn ToolHandler>,
}

/// Ordered catalogue of callable tools.
///
/// Registration order is preserved and used verbatim as the discovery
/// response order. The catalogue is built once at startup and shared
/// immutably across transports.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<ToolEntry>,
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool at the end of the catalogue.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Tool`] if a tool with the same name is already
    /// registered.
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<()> {
        if self
            .entries
            .iter()
            .any(|entry| entry.descriptor.name == descriptor.name)
        {
            return Err(AppError::Tool(format!(
                "duplicate tool name: {}",
                descriptor.name
            )));
        }
        self.entries.push(ToolEntry {
            descriptor,
            handler,
        });
        Ok(())
    }

    /// Descriptors in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<&ToolDescriptor> {
        self.entries.iter().map(|entry| &entry.descriptor).collect()
    }

    /// Look up a tool by name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&ToolEntry> {
        self.entries
            .iter()
            .find(|entry| entry.descriptor.name == name)
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no tools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
