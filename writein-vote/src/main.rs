//! writein-vote - Write-in voting service
//!
//! Serves login, vote casting, candidate listing and results over HTTP,
//! backed by a single SQLite database.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use writein_common::config::{CliOverrides, ServiceConfig, ENV_CONFIG_FILE, ENV_DATA_FOLDER, ENV_PORT};
use writein_common::db::init_database;

use writein_vote::db::candidates::seed_candidates;
use writein_vote::AppState;

/// Command-line arguments for writein-vote
#[derive(Parser, Debug)]
#[command(name = "writein-vote")]
#[command(about = "Write-in voting service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = ENV_PORT)]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Folder holding the SQLite database
    #[arg(short, long, env = ENV_DATA_FOLDER)]
    data_folder: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, env = ENV_CONFIG_FILE)]
    config: Option<PathBuf>,

    /// How long a vote keeps retrying while the database is locked (ms)
    #[arg(long)]
    lock_wait_ms: Option<u64>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl From<&Args> for CliOverrides {
    fn from(args: &Args) -> Self {
        Self {
            data_folder: args.data_folder.clone(),
            host: args.host.clone(),
            port: args.port,
            lock_wait_ms: args.lock_wait_ms,
            config_file: args.config.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting writein-vote v{}", env!("CARGO_PKG_VERSION"));

    let config = ServiceConfig::resolve(CliOverrides::from(&args));
    info!("Data folder: {}", config.data_folder.display());

    let db_path = config.database_path();
    info!("Database: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    if !config.seed_candidates.is_empty() {
        seed_candidates(&pool, &config.seed_candidates)
            .await
            .context("Failed to seed candidates")?;
    }

    let state = AppState::new(pool, config.lock_wait_ms);
    let app = writein_vote::build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

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
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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
