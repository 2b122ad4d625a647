//! `github_enhance_resume_with_project` tool handler.
//!
//! Full pipeline: analyze a codebase, have the enhancer turn the report
//! into a polished project entry, merge that entry into the hosted
//! resume's `projects` array, and publish the update.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::analyzer;
use crate::enhance::EnhancedProject;
use crate::errors::{AppError, Result};
use crate::mcp::registry::{ToolDescriptor, ToolHandler};
use crate::mcp::tools::{analyze_codebase, ToolContext};

/// Descriptor advertised through tool discovery.
#[must_use]
pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "github_enhance_resume_with_project".to_owned(),
        description: "Analyze a codebase and add it as an enhanced project entry to the hosted \
                      resume"
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

/// Handler for `github_enhance_resume_with_project`.
pub struct EnhanceResume {
    /// Shared collaborators.
    pub context: Arc<ToolContext>,
}

impl ToolHandler for EnhanceResume {
    fn call(
        &self,
        args: serde_json::Map<String, Value>,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>> {
        Box::pin(async move {
            let directory = analyze_codebase::directory_argument(&args);
            let report = analyzer::scan_codebase(&directory).await?;
            let project = self.context.enhancer.enhance(&report).await?;

            let Some(record) = self.context.store.find().await? else {
                return Err(AppError::Tool(
                    "no resume found; create a resume gist before adding projects".to_owned(),
                ));
            };

            let mut document = record.document;
            merge_project(&mut document, &project)?;
            let resume_url = self.context.store.save(&record.gist_id, &document).await?;

            Ok(serde_json::json!({
                "message": "Resume updated with project",
                "project": project,
                "resumeUrl": resume_url,
            }))
        })
    }
}

/// Insert `project` into the document's `projects` array, replacing any
/// existing entry with the same name so repeated runs stay idempotent.
fn merge_project(document: &mut Value, project: &EnhancedProject) -> Result<()> {
    let entry = serde_json::to_value(project)
        .map_err(|err| AppError::Tool(format!("project serialization failed: {err}")))?;

    let Some(root) = document.as_object_mut() else {
        return Err(AppError::Tool("resume document is not a JSON object".to_owned()));
    };

    let projects = root
        .entry("projects")
        .or_insert_with(|| Value::Array(Vec::new()));
    let Some(items) = projects.as_array_mut() else {
        return Err(AppError::Tool(
            "resume `projects` field is not an array".to_owned(),
        ));
    };

    let existing = items
        .iter_mut()
        .find(|item| item.get("name").and_then(Value::as_str) == Some(project.name.as_str()));
    match existing {
        Some(slot) => *slot = entry,
        None => items.push(entry),
    }

    Ok(())
}
