//! ordersync server
//!
//! Reconciles confirmed blockchain transactions against tracked wallets and
//! order records: a watcher pool consumes transaction events and confirms or
//! creates orders idempotently, while a thin HTTP surface handles wallet and
//! order CRUD plus event ingest.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{get_database_url, load_config};
use ordersync_core::events::ChannelEventSource;
use ordersync_core::processors::TxWatcher;
use ordersync_core::reconciler::Reconciler;
use ordersync_core::store::PgStore;
use server::{build_router, run_server};
use shutdown::shutdown_signal;
use sqlx::postgres::PgPoolOptions;
use state::{AppState, IngestHandle};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// ordersync - blockchain transaction to order reconciliation service
#[derive(Parser, Debug)]
#[command(name = "ordersync-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./ordersync.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting ordersync-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config(&args.config, args.listen).map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    let listen_addr = config.server.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Get database URL from environment
    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    // Create database connection pool
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

    // Run migrations if requested
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

    // Shared shutdown flag for the watcher pool and the HTTP server
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Wire the watcher pool to its event stream
    let (event_source, source_handle) = ChannelEventSource::new(config.watcher.ingest_buffer);
    let reconciler = Reconciler::new(PgStore::new(db_pool.clone()));
    let watcher = TxWatcher::new(reconciler, event_source, config.watcher.handlers);
    let watcher_task = tokio::spawn(watcher.run(shutdown_rx.clone()));

    // Flip the shutdown flag on SIGTERM/SIGINT
    let signal_shutdown_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = signal_shutdown_tx.send(true);
    });

    // Create application state
    let state = AppState::new(db_pool.clone(), IngestHandle::new(source_handle.sender()));

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr, shutdown_rx).await;

    // Stop the watcher pool and let in-flight workers drain
    let _ = shutdown_tx.send(true);
    if let Err(e) = watcher_task.await {
        tracing::error!("Watcher pool task failed: {}", e);
    }

    // Close database connections gracefully
    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
