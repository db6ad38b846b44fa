#![forbid(unsafe_code)]

//! `lsp-connection` — transport host binary.
//!
//! Loads connection settings, selects the language-server transport and
//! echoes every byte received on it back to the peer. Useful for checking
//! that an editor can reach the process over stdio or TCP.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use clap::{Parser, ValueEnum};
use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use lsp_connection::config::{ConfigOverrides, ConnectionConfig};
use lsp_connection::{AppError, ConnectionSelector, ConnectionStreams, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "lsp-connection", about = "Language server transport host", version, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults to environment variables.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host to dial in client mode.
    #[arg(long)]
    client_host: Option<String>,

    /// Port to dial in client mode.
    #[arg(long)]
    client_port: Option<u16>,

    /// Port to accept one connection on in server mode.
    #[arg(long)]
    server_port: Option<u16>,

    /// Interface to bind in server mode.
    #[arg(long)]
    bind_host: Option<String>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("lsp-connection bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match &args.config {
        Some(path) => ConnectionConfig::load_from_path(path)?,
        None => ConnectionConfig::from_env()?,
    };
    config.apply_overrides(ConfigOverrides {
        client_host: args.client_host,
        client_port: args.client_port,
        server_port: args.server_port,
        bind_host: args.bind_host,
    });
    info!("configuration loaded");

    let streams = ConnectionStreams::new(Arc::new(ConnectionSelector::new(config)));
    info!(transport = %streams.transport(), "transport selected");

    // ── Echo on a plain thread; connect/accept and reads block ──
    let (done_tx, done_rx) = oneshot::channel();
    thread::Builder::new()
        .name("echo".into())
        .spawn(move || {
            report_echo(done_tx, echo(&streams));
        })
        .map_err(|err| AppError::Io(format!("failed to spawn echo thread: {err}")))?;

    tokio::select! {
        result = done_rx => match result {
            Ok(Ok(bytes)) => info!(bytes, "peer closed the stream"),
            Ok(Err(err)) => {
                error!(%err, "echo failed");
                return Err(err);
            }
            Err(_) => error!("echo thread exited without reporting"),
        },
        () = shutdown_signal() => info!("shutdown signal received"),
    }

    info!("lsp-connection shut down");
    Ok(())
}

/// Copy input to output until EOF, returning the number of bytes echoed.
fn echo(streams: &ConnectionStreams) -> Result<u64> {
    let mut input = streams.input_stream()?;
    let mut output = streams.output_stream()?;

    let mut buf = [0u8; 8192];
    let mut total = 0u64;
    loop {
        let read = match input.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        output.write_all(&buf[..read])?;
        output.flush()?;
        total += read as u64;
    }
}

/// Hand the echo result to the main task, logging failures nobody waits for.
///
/// Returns whether the result was delivered. The receiver is gone once a
/// shutdown signal won the race.
fn report_echo(done_tx: oneshot::Sender<Result<u64>>, result: Result<u64>) -> bool {
    match done_tx.send(result) {
        Ok(()) => true,
        Err(Err(err)) => {
            error!(%err, "echo failed after shutdown");
            false
        }
        Err(Ok(bytes)) => {
            info!(bytes, "echo finished after shutdown");
            false
        }
    }
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
    // Stdout may be the transport itself, so logs always go to stderr.
    let subscriber = fmt().with_env_filter(env_filter).with_writer(io::stderr);

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
