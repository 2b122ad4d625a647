//! MCP tool handlers and the published catalogue.

pub mod analyze_codebase;
pub mod check_resume;
pub mod enhance_resume;

use std::sync::Arc;

use crate::enhance::ProjectEnhancer;
use crate::errors::Result;
use crate::github::ResumeStore;
use crate::mcp::registry::ToolRegistry;

/// Collaborators shared by every tool handler.
pub struct ToolContext {
    /// Resume storage backed by GitHub gists.
    pub store: Arc<dyn ResumeStore>,
    /// LLM-backed project entry enhancer.
    pub enhancer: Arc<dyn ProjectEnhancer>,
}

/// Build the registry with the three resume tools in their published
/// order.
///
/// # Errors
///
/// Returns [`AppError::Tool`](crate::AppError::Tool) if a tool name
/// collides, which would indicate a wiring bug.
pub fn catalogue(context: &Arc<ToolContext>) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(
        analyze_codebase::descriptor(),
        Arc::new(analyze_codebase::AnalyzeCodebase),
    )?;
    registry.register(
        check_resume::descriptor(),
        Arc::new(check_resume::CheckResume {
            context: Arc::clone(context),
        }),
    )?;
    registry.register(
        enhance_resume::descriptor(),
        Arc::new(enhance_resume::EnhanceResume {
            context: Arc::clone(context),
        }),
    )?;
    Ok(registry)
}
