//! Cadence Player - service entry point
//!
//! Loads configuration, starts one playback session on the headless clock
//! engine and serves the HTTP/SSE control API until shutdown.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cadence_common::config::{resolve_config_path, TomlConfig, CONFIG_ENV_VAR};
use cadence_player::api::{self, AppState};
use cadence_player::bridge::StateBridge;
use cadence_player::collaborators::{Collaborators, InMemoryPlayHistory, RootFolderResolver};
use cadence_player::playback::ClockEngine;
use cadence_player::{PlaybackSession, SessionConfig};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for cadence-player
#[derive(Parser, Debug)]
#[command(name = "cadence-player")]
#[command(about = "Headless music playback service")]
#[command(version)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "CADENCE_PORT")]
    port: Option<u16>,

    /// Root folder for relative track locators (overrides the config file)
    #[arg(short, long, env = "CADENCE_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is loaded before tracing so the file can choose the log level;
    // a load failure is reported once tracing is up
    let config_path = resolve_config_path(args.config.as_deref(), CONFIG_ENV_VAR);
    let (mut config, load_error) = match &config_path {
        Some(path) => match TomlConfig::load(path) {
            Ok(config) => (config, None),
            Err(e) => (TomlConfig::default(), Some(e)),
        },
        None => (TomlConfig::default(), None),
    };

    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(root) = args.root_folder {
        config.root_folder = Some(root);
    }

    let default_filter = format!(
        "cadence_player={level},cadence_common={level},tower_http=info",
        level = config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match (&config_path, load_error) {
        (Some(path), Some(e)) => warn!(
            "Failed to load config {}: {} (using defaults)",
            path.display(),
            e
        ),
        (Some(path), None) => info!("Loaded config from {}", path.display()),
        (None, _) => info!("No config file found, using defaults"),
    }

    let root_folder = config.root_folder_or_default();
    info!("Starting cadence-player v{}", env!("CARGO_PKG_VERSION"));
    info!("Root folder: {}", root_folder.display());

    let bridge = Arc::new(StateBridge::new());
    let collaborators = Collaborators::new(
        Arc::new(RootFolderResolver::new(root_folder)),
        Arc::new(InMemoryPlayHistory::new()),
    );
    let session = PlaybackSession::spawn(
        ClockEngine::new,
        collaborators,
        Arc::clone(&bridge),
        SessionConfig::from_defaults(config.playback.clone()),
    );

    let app = api::create_router(AppState {
        session: session.clone(),
        bridge,
    });

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.host))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    session
        .release()
        .await
        .context("Failed to release playback session")?;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
