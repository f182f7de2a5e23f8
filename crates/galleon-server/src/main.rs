//! Binary entrypoint for the galleon gallery server.
//!
//! Builds the application state from environment configuration, runs a
//! full reconciliation pass so the index is warm before serving, then
//! listens until a shutdown signal arrives.

use galleon_server::config::GalleryConfig;
use galleon_server::router::build_router;
use galleon_server::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = GalleryConfig::from_env();
    let port = config.port;

    let state = AppState::new(config).expect("failed to initialize application state");

    // Startup reconciliation: bring the index in line with disk before the
    // first query lands.
    match state.service() {
        Ok(service) => match service.engine.run_full_sync().await {
            Ok(summary) => tracing::info!(
                added = summary.added,
                updated = summary.updated,
                deleted = summary.deleted,
                failed = summary.failed,
                "startup sync complete"
            ),
            Err(e) => tracing::error!(error = %e, "startup sync failed"),
        },
        Err(_) => unreachable!("state was just initialized"),
    }

    let app = build_router(state);
    let addr = format!("0.0.0.0:{port}");
    tracing::info!("galleon server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    tracing::info!("shutdown signal received");
}
