use std::sync::Arc;

use creditos_api::app::build_router;
use creditos_api::audit::{spawn_audit_logger, AuditPublisher};
use creditos_api::config::Config;
use creditos_api::db::{Database, PoolSettings};
use creditos_api::db_storage::PgCreditoStore;
use creditos_api::handlers::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, connects to PostgreSQL (running
/// migrations when asked to), starts the audit logger and serves the router
/// until Ctrl-C.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "creditos_api=debug,tower_http=debug,audit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database connection pool
    let pool_settings = PoolSettings {
        max_connections: config.db_max_connections,
        acquire_timeout: config.db_acquire_timeout(),
        statement_timeout: config.store_timeout(),
    };
    let db = Database::new(&config.database_url, &pool_settings).await?;
    tracing::info!("Database connection pool established");

    if config.run_migrations {
        db.migrate().await?;
        tracing::info!("Database migrations applied");
    }

    // Audit events are drained off the request path
    let (audit, audit_rx) = AuditPublisher::channel(config.audit_channel_capacity);
    let audit_task = spawn_audit_logger(audit_rx);
    tracing::info!(
        "Audit logger started (capacity {})",
        config.audit_channel_capacity
    );

    let store = Arc::new(PgCreditoStore::new(db.pool.clone()));
    let app_state = Arc::new(AppState::with_store_timeout(
        store,
        audit,
        config.store_timeout(),
    ));
    let app = build_router(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Router (and its publisher) is gone: let the logger flush what is queued
    if let Err(e) = audit_task.await {
        tracing::warn!("Audit logger ended abnormally: {}", e);
    }
    db.pool.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
