//! Payment reconciliation server
//!
//! Receives payment provider webhooks, keeps invoice records in step with
//! them and issues one outbound transfer per paid invoice.

mod api;
mod config;
mod server;
mod shutdown;
mod state;
#[cfg(test)]
mod testing;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use payrecon_core::events::archive_channel;
use payrecon_core::framework::DatabaseProcessor;
use payrecon_core::processors::ArchiveWriter;
use payrecon_core::provider::{PaymentProvider, client_from_config};
use payrecon_core::store::{MemoryRecordStore, PgRecordStore, RecordStore};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Payrecon - webhook-driven invoice and transfer reconciliation
#[derive(Parser, Debug)]
#[command(name = "payrecon-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./payrecon-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,

    /// Keep records in process memory instead of PostgreSQL
    #[arg(long, default_value = "false")]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting payrecon-server v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let (store, db_pool): (Arc<dyn RecordStore>, Option<PgPool>) = if args.in_memory {
        tracing::warn!("Using in-memory record store, records are lost on exit");
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        (store, None)
    } else {
        let database_url = get_database_url().map_err(|e| {
            tracing::error!("DATABASE_URL environment variable not set");
            e
        })?;

        tracing::info!("Connecting to database...");
        let db_pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&database_url)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to database: {}", e);
                e
            })?;
        tracing::info!("Database connection established");

        if args.migrate {
            tracing::info!("Running database migrations...");
            sqlx::migrate!("../migrations")
                .run(&db_pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to run migrations: {}", e);
                    e
                })?;
            tracing::info!("Migrations completed successfully");
        }

        let store: Arc<dyn RecordStore> =
            Arc::new(PgRecordStore::new(DatabaseProcessor::new(db_pool.clone())));
        (store, Some(db_pool))
    };

    let provider: Arc<dyn PaymentProvider> =
        Arc::new(client_from_config(&loaded_config.provider).map_err(|e| {
            tracing::error!("Failed to build provider client: {}", e);
            e
        })?);
    let shared_config = loaded_config.shared();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let (archive_tx, archive_rx) = archive_channel();
    let archive_handle = tokio::spawn(
        ArchiveWriter::new(&loaded_config.archive.path, archive_rx, shutdown_rx.clone()).run(),
    );

    let state = AppState::new(
        store,
        provider,
        shared_config.clone(),
        loaded_config.provider.timeout,
        archive_tx,
    );

    let generator_handle = tokio::spawn(
        state
            .generator
            .clone()
            .run(loaded_config.generator.clone(), shutdown_rx.clone()),
    );

    let reload_handle =
        spawn_config_reload_handler(shared_config, config_loader, shutdown_rx.clone());

    let router = build_router(state);

    let listen_addr = loaded_config.server.listen;
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Stop background tasks; the archive writer drains its queue first.
    let _ = shutdown_tx.send(true);
    for (name, handle) in [
        ("archive writer", archive_handle),
        ("invoice generator", generator_handle),
        ("config reload handler", reload_handle),
    ] {
        if let Err(e) = handle.await {
            tracing::error!(task = name, error = %e, "Background task panicked");
        }
    }

    if let Some(db_pool) = db_pool {
        tracing::info!("Closing database connections...");
        db_pool.close().await;
    }
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
