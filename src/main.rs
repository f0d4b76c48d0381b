use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{ArgAction, Parser};
use chesshook_core::SharedSecret;
use chesshook_engine::{parse_init_lines, EngineConfig, EngineProcess};
use chesshook_server::{AuthPolicy, ServerConfig};
use chesshook_telemetry::{init_telemetry, parse_module_level, TelemetryConfig};

/// Bridge a UCI chess engine to Chesshook clients over WebSocket.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// HTTP service address.
    #[arg(long, default_value = "localhost:8080")]
    addr: String,

    /// Engine binary, optionally followed by space-separated arguments.
    #[arg(long, default_value = "./stockfish")]
    engine: String,

    /// Lines sent to the engine on startup, separated by ";".
    #[arg(long, default_value = "")]
    uciargs: String,

    /// Require authentication for writing to the engine.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    authwrite: bool,

    /// Require authentication for reading from the engine.
    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    authread: bool,

    /// Bypass authentication for localhost connections.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    localhost: bool,

    /// Default log level. RUST_LOG takes precedence.
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    /// Per-module level override as MODULE=LEVEL. Repeatable.
    #[arg(long = "log-module", value_parser = parse_module_level)]
    log_modules: Vec<(String, tracing::Level)>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match init_telemetry(TelemetryConfig {
        log_level: cli.log_level,
        module_levels: cli.log_modules.clone(),
        json: cli.log_json,
    }) {
        Ok(guard) => tracing::debug!(filter = guard.filter(), "Logging initialized"),
        Err(e) => eprintln!("chesshook-intermediary: {e}"),
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Fatal error, shutting down");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let secret = SharedSecret::generate();
    let auth = AuthPolicy {
        read: cli.authread,
        write: cli.authwrite,
        localhost_bypass: cli.localhost,
    };

    let engine_config = EngineConfig::new(cli.engine, parse_init_lines(&cli.uciargs));
    let (engine, output) =
        EngineProcess::spawn(&engine_config).context("failed to start engine")?;

    let config = ServerConfig {
        addr: cli.addr,
        auth,
        ..ServerConfig::default()
    };
    let mut server = chesshook_server::start(config, secret.clone(), engine.handle(), output)
        .await
        .context("failed to start server")?;

    tracing::info!(passkey = secret.expose(), "Server started");
    tracing::info!(enabled = auth.read, "Server is requesting authentication for read operations");
    tracing::info!(enabled = auth.write, "Server is requesting authentication for write operations");
    tracing::info!(enabled = auth.localhost_bypass, "Server is bypassing authentication for localhost connections");

    tokio::select! {
        result = engine.wait() => {
            result.context("engine I/O failed")?;
            bail!("engine input closed");
        }
        result = server.wait() => {
            result.context("server stopped")?;
            bail!("server stopped unexpectedly");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl+c")?;
            tracing::info!("Shutting down");
            server.abort();
        }
    }

    Ok(())
}
