//! CLI entry point for the media transfer tool.

use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use media_transfer::transfer::{AuthToken, EngineConfig, TransferEngine};
use tracing::{debug, info};

mod app;
mod cli;

use app::AppContext;
use app::config::load_default_file_config;
use app::endpoints::Backend;
use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(command = ?args.command, "CLI arguments parsed");

    let loaded = load_default_file_config()?;
    let file_config = loaded.config.unwrap_or_default();
    if let Some(path) = &loaded.path {
        debug!(path = %path.display(), "config path resolved");
    }

    let backend_url = args
        .backend_url
        .clone()
        .or_else(|| file_config.backend_url.clone())
        .context(
            "No backend URL configured: pass --backend-url, set MEDIA_BACKEND_URL, \
             or add backend_url to the config file",
        )?;
    let backend = Backend::parse(&backend_url)?;

    let mut engine_config = EngineConfig::default();
    file_config.apply_to(&mut engine_config);
    if let Some(secs) = args.connect_timeout {
        engine_config.connect_timeout = Duration::from_secs(secs);
    }
    let engine = TransferEngine::new(engine_config)?;

    let ctx = AppContext {
        engine,
        backend,
        token: args.token.clone().map(AuthToken::new),
        show_progress: !args.quiet && io::stderr().is_terminal(),
    };
    info!(backend = %backend_url, "Media transfer starting");

    match &args.command {
        Command::Download {
            media_path,
            output_dir,
            name,
        } => app::run_download(&ctx, media_path, output_dir, name.as_deref()).await,
        Command::Upload { files, dest } => app::run_upload(&ctx, files, dest).await,
    }
}
