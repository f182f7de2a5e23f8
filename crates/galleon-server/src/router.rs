//! Router assembly for the galleon HTTP API.
//!
//! [`build_router`] wires all handler functions to their routes with CORS
//! and tracing middleware layers.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the complete axum router with all API routes.
///
/// Routes use axum 0.8 `/{param}` path syntax. CORS is permissive (the
/// desktop shell and browser views call from different origins).
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Query surface
        .route("/gallery/files", get(handlers::queries::list_files))
        .route("/gallery/files/count", get(handlers::queries::count_files))
        .route("/gallery/files/{id}", get(handlers::queries::get_file))
        .route(
            "/gallery/files/{id}/samplers",
            get(handlers::queries::file_samplers),
        )
        .route(
            "/gallery/filter-options",
            get(handlers::queries::filter_options),
        )
        .route("/gallery/stats", get(handlers::queries::stats))
        .route("/health", get(handlers::queries::health))
        // Sync triggers
        .route("/gallery/sync", post(handlers::sync::run_full_sync))
        .route(
            "/gallery/sync/folder",
            get(handlers::sync::folder_sync_events),
        )
        // Mutations
        .route(
            "/gallery/files/favorite",
            post(handlers::mutations::favorite_batch),
        )
        .route(
            "/gallery/files/{id}/favorite",
            post(handlers::mutations::toggle_favorite),
        )
        .route(
            "/gallery/files/{id}/rename",
            post(handlers::mutations::rename_file),
        )
        .route("/gallery/files/move", post(handlers::mutations::move_batch))
        .route(
            "/gallery/files/delete",
            post(handlers::mutations::delete_batch),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
