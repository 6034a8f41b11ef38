//! `engram-server`: process bootstrap for the REST transport of
//! `engram-core`. Wires a `SqliteStore` + `HashEmbedder` +
//! `NativeCompletionProvider` engine by default, loads configuration from
//! CLI flags, `ENGRAM_*` environment variables, and an optional TOML file,
//! then serves the axum router with graceful shutdown.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use engram_core::completion::NativeCompletionProvider;
use engram_core::config::EngineConfig;
use engram_core::embed::HashEmbedder;
use engram_core::store::memory::MemoryStore;
#[cfg(feature = "sqlite-store")]
use engram_core::store::sqlite::SqliteStore;
use engram_core::store::Store;
use engram_core::Engine;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use engram_server::api;
use engram_server::api::state::AppState;
use engram_server::config::ServerConfig;

/// Self-hosted, multi-tenant memory engine — REST transport.
#[derive(Parser)]
#[command(name = "engram-server")]
#[command(author = "samvallad33")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "REST server for the engram memory engine")]
struct Cli {
    /// Host interface to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind.
    #[arg(long)]
    port: Option<u16>,

    /// Directory holding `engram.sqlite3`. Defaults to the platform data
    /// directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Optional TOML config file, layered under CLI/env overrides.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run entirely in-memory; data does not survive a restart.
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_target(false)
        .init();

    info!("engram-server v{} starting...", env!("CARGO_PKG_VERSION"));

    let server_config = ServerConfig::load(cli.config.as_deref(), cli.host, cli.port, cli.data_dir);

    let store: Arc<dyn Store> = if cli.in_memory {
        info!("using in-memory store (no data will be persisted)");
        Arc::new(MemoryStore::new())
    } else {
        match build_sqlite_store(&server_config) {
            Ok(store) => store,
            Err(err) => {
                error!("failed to open sqlite store: {}", err);
                std::process::exit(1);
            }
        }
    };

    let engine_config = EngineConfig::new(server_config.dimensions);
    let embedder = Arc::new(HashEmbedder::new(server_config.dimensions));
    let completion = Arc::new(NativeCompletionProvider);
    let engine = Arc::new(Engine::new(store, embedder, completion, engine_config));

    if let Err(err) = engine.health_check().await {
        error!("store health check failed: {}", err);
        std::process::exit(1);
    }
    info!("store health check passed");

    let state = Arc::new(AppState { engine: engine.clone() });
    let app = api::build_router(state);

    let addr = format!("{}:{}", server_config.host, server_config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {}: {}", addr, err);
            std::process::exit(1);
        }
    };

    info!("engram-server listening on http://{}", addr);

    if let Err(err) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        error!("server error: {}", err);
    }

    info!("draining in-flight background tasks...");
    engine.drain_background_tasks().await;
    info!("engram-server shut down cleanly");
}

#[cfg(feature = "sqlite-store")]
fn build_sqlite_store(config: &ServerConfig) -> Result<Arc<dyn Store>, engram_core::error::StoreError> {
    let path = config.database_path();
    info!(path = %path.display(), "opening sqlite store");
    Ok(Arc::new(SqliteStore::open(&path)?))
}

#[cfg(not(feature = "sqlite-store"))]
fn build_sqlite_store(_config: &ServerConfig) -> Result<Arc<dyn Store>, engram_core::error::StoreError> {
    tracing::warn!("sqlite-store feature disabled at compile time, falling back to in-memory store");
    Ok(Arc::new(MemoryStore::new()))
}

/// Graceful shutdown on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
