//! # Tabkeeper API Server
//!
//! This is the main API server for Tabkeeper, a small service that keeps tabs: users
//! open tickets, place orders against them, and settle them with payments.
//!
//! ## Architecture
//!
//! The API server is built with Axum and provides:
//! - CRUD endpoints for users, tickets, orders and payments
//! - Date and time window lookups, and a records join across all four tables
//! - Authentication (signup, login, JWT on every data route)
//! - One log line per request with the client origin
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p tabkeeper-api
//! ```

use std::net::SocketAddr;
use tabkeeper_api::{
    app::{build_router, AppState},
    config::Config,
};
use tabkeeper_shared::{
    db::{
        migrations::{ensure_database_exists, run_migrations},
        pool::{close_pool, create_pool, PoolConfig},
    },
    store::postgres::PgStore,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabkeeper_api=debug,tabkeeper_shared=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Tabkeeper API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    ensure_database_exists(&config.database.url).await?;

    let pool = create_pool(PoolConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool).await?;

    let bind_address = config.bind_address();
    let state = AppState::new(PgStore::new(pool.clone()), config);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Shutdown signal received, closing database pool...");
    close_pool(pool).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
