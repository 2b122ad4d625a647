#![forbid(unsafe_code)]

//! `gitvitae` — MCP resume server binary.
//!
//! Bootstraps configuration from the environment, builds the tool
//! catalogue, and serves the protocol over stdio (the default) or
//! HTTP/SSE (`gitvitae sse [PORT]`).

use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use gitvitae::config::Config;
use gitvitae::enhance::OpenAiEnhancer;
use gitvitae::github::GistStore;
use gitvitae::mcp::dispatcher::Dispatcher;
use gitvitae::mcp::session::SessionManager;
use gitvitae::mcp::sse::{self, HttpState};
use gitvitae::mcp::tools::{self, ToolContext};
use gitvitae::mcp::transport;
use gitvitae::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "gitvitae", about = "MCP server for GitHub resume tools", version, long_about = None)]
struct Cli {
    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Transport to serve; stdio when omitted.
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Serve over HTTP with Server-Sent Events streaming.
    Sse {
        /// TCP port to listen on; overrides the `PORT` environment
        /// variable and the built-in default.
        port: Option<u16>,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("gitvitae server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    // Fail-fast: no transport starts (and no port is bound) unless every
    // required credential is present.
    let mut config = Config::from_env().map_err(|err| {
        error!(%err, "configuration error");
        err
    })?;
    info!("configuration loaded");

    // ── Build the tool catalogue ────────────────────────
    let store = GistStore::new(config.github_token.clone(), config.github_username.clone());
    let enhancer = OpenAiEnhancer::new(
        config.openai_api_key.clone(),
        config.github_username.clone(),
    );
    let context = Arc::new(ToolContext {
        store: Arc::new(store),
        enhancer: Arc::new(enhancer),
    });
    let registry = Arc::new(tools::catalogue(&context)?);
    let dispatcher = Arc::new(Dispatcher::new(registry));

    let ct = CancellationToken::new();

    // ── Serve the selected transport ────────────────────
    match args.mode {
        None => {
            info!("starting stdio transport");
            let stdio_ct = ct.clone();
            let mut transport =
                tokio::spawn(async move { transport::serve_stdio(dispatcher, stdio_ct).await });

            tokio::select! {
                result = &mut transport => {
                    result
                        .map_err(|err| AppError::Transport(format!("stdio task failed: {err}")))??;
                }
                () = shutdown_signal() => {
                    info!("shutdown signal received");
                    ct.cancel();
                    let _ = transport.await;
                }
            }
        }
        Some(Mode::Sse { port }) => {
            if let Some(port) = port {
                config.http_port = port;
            }

            let sessions = Arc::new(SessionManager::new(config.keep_alive));
            let state = Arc::new(HttpState {
                dispatcher,
                sessions,
            });

            let http_ct = ct.clone();
            let http_port = config.http_port;
            let mut server =
                tokio::spawn(async move { sse::serve_http(http_port, state, http_ct).await });

            tokio::select! {
                result = &mut server => {
                    result
                        .map_err(|err| AppError::Transport(format!("http task failed: {err}")))??;
                }
                () = shutdown_signal() => {
                    info!("shutdown signal received");
                    ct.cancel();
                    let _ = server.await;
                }
            }
        }
    }

    info!("gitvitae shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr: in stdio mode, stdout carries protocol envelopes
    // exclusively.
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
