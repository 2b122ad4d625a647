//! `github_check_resume` tool handler.
//!
//! Reports whether a `resume.json` gist exists for the configured user.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::Result;
use crate::mcp::registry::{ToolDescriptor, ToolHandler};
use crate::mcp::tools::ToolContext;

/// Descriptor advertised through tool discovery.
#[must_use]
pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "github_check_resume".to_owned(),
        description: "Check whether a resume gist already exists for the configured GitHub user"
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {},
            "required": [],
        }),
    }
}

/// Handler for `github_check_resume`.
pub struct CheckResume {
    /// Shared collaborators.
    pub context: Arc<ToolContext>,
}

impl ToolHandler for CheckResume {
    fn call(
        &self,
        _args: serde_json::Map<String, Value>,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>> {
        Box::pin(async move {
            let found = self.context.store.find().await?;
            Ok(match found {
                Some(record) => serde_json::json!({
                    "message": "Resume found",
                    "exists": true,
                    "resumeUrl": record.url,
                }),
                None => serde_json::json!({
                    "message": "No resume found",
                    "exists": false,
                    "resumeUrl": null,
                }),
            })
        })
    }
}
