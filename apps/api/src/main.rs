use std::net::SocketAddr;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use analytics_cell::{AnalyticsRefresher, AnalyticsService};
use shared_config::AppConfig;
use shared_database::{seed::seed_sample_doctors, Database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting NirogGyan API server");

    // Load configuration
    let config = AppConfig::from_env();
    info!("Environment: {}", config.environment);

    let db = Database::from_config(&config).context("failed to open database")?;
    seed_sample_doctors(&db, config.seed_base_date)
        .await
        .context("failed to seed sample doctors")?;

    let analytics = AnalyticsService::new(db.clone());
    if let Err(e) = analytics.recompute().await {
        warn!("Initial analytics computation failed: {}", e);
    }
    let refresher = AnalyticsRefresher::start(analytics);

    // Build the application router
    let app = router::create_router(&config, db.clone(), refresher.clone())?;

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;

    info!("Server stopped, draining background work");
    refresher.shutdown().await;
    db.close().await.context("failed to close database")?;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
