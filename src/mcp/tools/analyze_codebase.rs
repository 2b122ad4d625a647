//! `github_analyze_codebase` tool handler.
//!
//! Scans a local directory and reports detected languages, declared
//! dependencies, and recent commit activity.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use serde_json::Value;

use crate::analyzer;
use crate::errors::{AppError, Result};
use crate::mcp::registry::{ToolDescriptor, ToolHandler};

/// Descriptor advertised through tool discovery.
#[must_use]
pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "github_analyze_codebase".to_owned(),
        description: "Analyze a codebase directory: detected languages, declared dependencies, \
                      and recent commits"
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "Directory to analyze. Defaults to the current working directory.",
                },
            },
            "required": [],
        }),
    }
}

/// Handler for `github_analyze_codebase`.
pub struct AnalyzeCodebase;

impl ToolHandler for AnalyzeCodebase {
    fn call(
        &self,
        args: serde_json::Map<String, Value>,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>> {
        Box::pin(async move {
            let directory = directory_argument(&args);
            let report = analyzer::scan_codebase(&directory).await?;
            serde_json::to_value(&report)
                .map_err(|err| AppError::Tool(format!("report serialization failed: {err}")))
        })
    }
}

/// Resolve the optional `directory` argument, defaulting to the current
/// working directory.
pub(crate) fn directory_argument(args: &serde_json::Map<String, Value>) -> PathBuf {
    args.get("directory")
        .and_then(Value::as_str)
        .filter(|raw| !raw.trim().is_empty())
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
}
