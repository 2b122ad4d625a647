//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration loading or validation failure.
    Config(String),
    /// Protocol envelope or dispatch failure.
    Protocol(String),
    /// Tool execution failure surfaced to the caller as an error result.
    Tool(String),
    /// Streaming session lifecycle failure.
    Session(String),
    /// Transport framing or delivery failure.
    Transport(String),
    /// GitHub gist API failure.
    Github(String),
    /// Upstream model call failure during project enhancement.
    Enhance(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol: {msg}"),
            Self::Tool(msg) => write!(f, "tool: {msg}"),
            Self::Session(msg) => write!(f, "session: {msg}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::Github(msg) => write!(f, "github: {msg}"),
            Self::Enhance(msg) => write!(f, "enhance: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
