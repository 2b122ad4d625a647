//! Resume storage backed by the GitHub gist API.
//!
//! The resume is a single `resume.json` file inside one of the user's
//! gists. Lookup scans the gist listing for that file name; updates PATCH
//! the owning gist in place.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::{AppError, Result};

/// File name that marks a gist as the hosted resume.
pub const RESUME_FILENAME: &str = "resume.json";

/// User agent sent with every GitHub API request (the API requires one).
const USER_AGENT: &str = concat!("gitvitae/", env!("CARGO_PKG_VERSION"));

/// Default GitHub REST endpoint.
const DEFAULT_API_BASE: &str = "https://api.github.com";

/// A located resume gist.
#[derive(Debug, Clone)]
pub struct ResumeRecord {
    /// Gist identifier used for updates.
    pub gist_id: String,
    /// Public HTML URL of the gist.
    pub url: String,
    /// Parsed `resume.json` content.
    pub document: Value,
}

/// Storage seam for the hosted resume.
///
/// Tool handlers depend on this trait rather than on [`GistStore`] so
/// tests can substitute an in-memory implementation.
pub trait ResumeStore: Send + Sync {
    /// Locate the resume gist, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Github`] on API failures or when the gist
    /// content is not valid JSON. A user with no resume gist is `Ok(None)`,
    /// not an error.
    fn find(&self) -> Pin<Box<dyn Future<Output = Result<Option<ResumeRecord>>> + Send + '_>>;

    /// Replace the resume document in the gist identified by `gist_id`.
    ///
    /// Returns the gist's public HTML URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Github`] on API failures.
    fn save(
        &self,
        gist_id: &str,
        document: &Value,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;
}

/// Production store talking to the GitHub REST API.
pub struct GistStore {
    client: reqwest::Client,
    token: String,
    username: String,
    base_url: String,
}

impl GistStore {
    /// Create a store operating on `username`'s gists, authenticated with
    /// `token`.
    #[must_use]
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            username: username.into(),
            base_url: DEFAULT_API_BASE.to_owned(),
        }
    }

    /// Point the store at a different API base (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
    }

    async fn find_impl(&self) -> Result<Option<ResumeRecord>> {
        let path = format!("/users/{}/gists", self.username);
        let response = self
            .request(reqwest::Method::GET, &path)
            .send()
            .await
            .map_err(|err| AppError::Github(format!("gist list request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Github(format!(
                "gist list failed with status {status}"
            )));
        }

        let gists: Vec<GistSummary> = response
            .json()
            .await
            .map_err(|err| AppError::Github(format!("gist list response malformed: {err}")))?;

        let Some(summary) = gists
            .into_iter()
            .find(|gist| gist.files.contains_key(RESUME_FILENAME))
        else {
            debug!(username = %self.username, "no gist containing {RESUME_FILENAME}");
            return Ok(None);
        };

        // The listing truncates file contents; fetch the full gist.
        let response = self
            .request(reqwest::Method::GET, &format!("/gists/{}", summary.id))
            .send()
            .await
            .map_err(|err| AppError::Github(format!("gist fetch request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Github(format!(
                "gist fetch failed with status {status}"
            )));
        }

        let detail: GistDetail = response
            .json()
            .await
            .map_err(|err| AppError::Github(format!("gist fetch response malformed: {err}")))?;

        let Some(file) = detail.files.get(RESUME_FILENAME) else {
            return Err(AppError::Github(format!(
                "gist {} no longer contains {RESUME_FILENAME}",
                summary.id
            )));
        };

        let document: Value = serde_json::from_str(&file.content)
            .map_err(|err| AppError::Github(format!("{RESUME_FILENAME} is not valid JSON: {err}")))?;

        Ok(Some(ResumeRecord {
            gist_id: summary.id,
            url: detail.html_url,
            document,
        }))
    }

    async fn save_impl(&self, gist_id: String, document: Value) -> Result<String> {
        let content = serde_json::to_string_pretty(&document)
            .map_err(|err| AppError::Github(format!("resume serialization failed: {err}")))?;

        let mut files = serde_json::Map::new();
        files.insert(
            RESUME_FILENAME.to_owned(),
            serde_json::json!({ "content": content }),
        );

        let response = self
            .request(reqwest::Method::PATCH, &format!("/gists/{gist_id}"))
            .json(&serde_json::json!({ "files": files }))
            .send()
            .await
            .map_err(|err| AppError::Github(format!("gist update request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Github(format!(
                "gist update failed with status {status}"
            )));
        }

        let detail: GistDetail = response
            .json()
            .await
            .map_err(|err| AppError::Github(format!("gist update response malformed: {err}")))?;

        Ok(detail.html_url)
    }
}

impl ResumeStore for GistStore {
    fn find(&self) -> Pin<Box<dyn Future<Output = Result<Option<ResumeRecord>>> + Send + '_>> {
        Box::pin(self.find_impl())
    }

    fn save(
        &self,
        gist_id: &str,
        document: &Value,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        let gist_id = gist_id.to_owned();
        let document = document.clone();
        Box::pin(self.save_impl(gist_id, document))
    }
}

// ── Wire types ────────────────────────────────────────────────────────────────

/// One entry in the gist listing; file contents are truncated here.
#[derive(Debug, Deserialize)]
struct GistSummary {
    id: String,
    #[serde(default)]
    files: HashMap<String, Value>,
}

/// A fully fetched gist.
#[derive(Debug, Deserialize)]
struct GistDetail {
    html_url: String,
    #[serde(default)]
    files: HashMap<String, GistFile>,
}

/// One file inside a fetched gist.
#[derive(Debug, Deserialize)]
struct GistFile {
    content: String,
}
