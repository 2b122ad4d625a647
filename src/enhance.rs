//! LLM-backed enhancement of codebase reports into resume entries.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::analyzer::CodebaseReport;
use crate::errors::{AppError, Result};

/// Default chat-completions endpoint.
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default model used for resume-entry generation.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// System prompt constraining the model to strict JSON output.
const SYSTEM_PROMPT: &str = "You write concise resume project entries. Respond with a single JSON \
object with fields \"name\" (string), \"description\" (string, at most 60 words), and \
\"highlights\" (array of at most 3 short strings). No markdown, no prose outside the JSON.";

/// A polished resume project entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedProject {
    /// Project display name.
    pub name: String,
    /// One-paragraph description.
    pub description: String,
    /// Bullet-point highlights.
    #[serde(default)]
    pub highlights: Vec<String>,
}

/// Seam for turning a codebase report into a resume entry.
pub trait ProjectEnhancer: Send + Sync {
    /// Produce an enhanced project entry from `report`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Enhance`] when the upstream model call fails.
    fn enhance(
        &self,
        report: &CodebaseReport,
    ) -> Pin<Box<dyn Future<Output = Result<EnhancedProject>> + Send + '_>>;
}

/// Production enhancer calling the `OpenAI` chat-completions API.
pub struct OpenAiEnhancer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    username: String,
}

impl OpenAiEnhancer {
    /// Create an enhancer writing entries for `username`.
    #[must_use]
    pub fn new(api_key: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            username: username.into(),
        }
    }

    /// Point the enhancer at a different API base (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn enhance_impl(&self, report: CodebaseReport) -> Result<EnhancedProject> {
        let prompt = build_prompt(&self.username, &report);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": prompt },
                ],
                "temperature": 0.3,
            }))
            .send()
            .await
            .map_err(|err| AppError::Enhance(format!("completion request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Enhance(format!(
                "completion failed with status {status}"
            )));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|err| AppError::Enhance(format!("completion response malformed: {err}")))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::Enhance("completion returned no choices".to_owned()))?;

        Ok(parse_project(&content, &report))
    }
}

impl ProjectEnhancer for OpenAiEnhancer {
    fn enhance(
        &self,
        report: &CodebaseReport,
    ) -> Pin<Box<dyn Future<Output = Result<EnhancedProject>> + Send + '_>> {
        let report = report.clone();
        Box::pin(self.enhance_impl(report))
    }
}

/// Render the user prompt from a codebase report.
fn build_prompt(username: &str, report: &CodebaseReport) -> String {
    let languages: Vec<&str> = report
        .languages
        .iter()
        .map(|stat| stat.language.as_str())
        .collect();
    let commits: Vec<&str> = report
        .recent_commits
        .iter()
        .map(|commit| commit.subject.as_str())
        .collect();
    format!(
        "Write a resume project entry for GitHub user {username}.\n\
         Project: {name}\n\
         Languages: {languages}\n\
         Dependencies: {dependencies}\n\
         Recent work: {commits}",
        name = report.project_name,
        languages = languages.join(", "),
        dependencies = report.dependencies.join(", "),
        commits = commits.join("; "),
    )
}

/// Parse the model reply, degrading to plain text when the model ignores
/// the strict-JSON instruction.
fn parse_project(content: &str, report: &CodebaseReport) -> EnhancedProject {
    let stripped = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    match serde_json::from_str::<EnhancedProject>(stripped) {
        Ok(project) => project,
        Err(_) => EnhancedProject {
            name: report.project_name.clone(),
            description: content.trim().to_owned(),
            highlights: Vec::new(),
        },
    }
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}
