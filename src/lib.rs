#![forbid(unsafe_code)]

pub mod analyzer;
pub mod config;
pub mod enhance;
pub mod errors;
pub mod github;
pub mod mcp;

pub use config::Config;
pub use errors::{AppError, Result};
