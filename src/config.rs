//! Runtime configuration loaded from the process environment.
//!
//! Startup is fail-fast: every credential the tool handlers need is read
//! and validated before any transport is started, so a misconfigured
//! server never accepts a connection it cannot serve.

use std::env;
use std::time::Duration;

use crate::errors::{AppError, Result};

/// Environment variable holding the GitHub API token.
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
/// Environment variable holding the `OpenAI` API key.
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable holding the GitHub account name to operate on.
pub const ENV_GITHUB_USERNAME: &str = "GITHUB_USERNAME";
/// Environment variable overriding the HTTP listen port.
pub const ENV_PORT: &str = "PORT";

/// Default HTTP listen port when neither the CLI nor `PORT` overrides it.
pub const DEFAULT_HTTP_PORT: u16 = 3000;

/// Cadence of keep-alive pings on idle streaming connections.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// GitHub API token used for gist reads and writes.
    pub github_token: String,
    /// `OpenAI` API key used for project enhancement.
    pub openai_api_key: String,
    /// GitHub account whose gists hold the resume.
    pub github_username: String,
    /// HTTP listen port for the SSE transport.
    pub http_port: u16,
    /// Keep-alive ping interval for streaming sessions.
    pub keep_alive: Duration,
}

impl Config {
    /// Load and validate configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] naming the first missing required
    /// variable, or describing an unparseable `PORT` value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// The production path is [`Config::from_env`]; tests inject a map
    /// lookup here to avoid mutating process-global state.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] naming the first missing required
    /// variable, or describing an unparseable `PORT` value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let github_token = required(&lookup, ENV_GITHUB_TOKEN)?;
        let openai_api_key = required(&lookup, ENV_OPENAI_API_KEY)?;
        let github_username = required(&lookup, ENV_GITHUB_USERNAME)?;

        let http_port = match lookup(ENV_PORT) {
            None => DEFAULT_HTTP_PORT,
            Some(raw) if raw.trim().is_empty() => DEFAULT_HTTP_PORT,
            Some(raw) => raw.trim().parse().map_err(|err| {
                AppError::Config(format!("invalid {ENV_PORT} value '{raw}': {err}"))
            })?,
        };

        Ok(Self {
            github_token,
            openai_api_key,
            github_username,
            http_port,
            keep_alive: DEFAULT_KEEP_ALIVE,
        })
    }
}

/// Read a required variable, treating empty values as absent.
fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("required environment variable {key} is not set")))
}
