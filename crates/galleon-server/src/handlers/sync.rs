//! Sync trigger handlers.
//!
//! The full sync blocks until the pass completes and returns its summary.
//! The per-folder sync streams progress as server-sent events: the engine
//! runs in a spawned task feeding a channel, and the response body drains
//! it, one event per completed file.

use std::convert::Infallible;
use std::path::PathBuf;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tracing::error;

use galleon_sync::SyncSummary;

use crate::error::ApiError;
use crate::state::AppState;

/// Runs a full reconciliation pass.
///
/// `POST /gallery/sync`
pub async fn run_full_sync(
    State(state): State<AppState>,
) -> Result<Json<SyncSummary>, ApiError> {
    let service = state.service()?;
    let summary = service.engine.run_full_sync().await?;
    Ok(Json(summary))
}

/// Folder-sync query parameter.
#[derive(Debug, Deserialize)]
pub struct FolderSyncQuery {
    /// Absolute folder path under the indexed tree.
    pub path: String,
}

/// Streams per-file progress for an on-demand folder sync.
///
/// `GET /gallery/sync/folder?path=...`
pub async fn folder_sync_events(
    State(state): State<AppState>,
    Query(params): Query<FolderSyncQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let service = state.service()?.clone();
    let folder = PathBuf::from(&params.path);
    if !folder.starts_with(&service.config.base_path) || !folder.is_dir() {
        return Err(ApiError::BadRequest(format!(
            "not a folder under the indexed tree: {}",
            params.path
        )));
    }

    let (tx, rx) = tokio::sync::mpsc::channel(32);
    tokio::spawn(async move {
        if let Err(e) = service.engine.run_folder_sync(&folder, tx).await {
            error!(error = %e, "folder sync failed");
        }
    });

    let stream = ReceiverStream::new(rx).map(|progress| {
        Ok(Event::default()
            .json_data(&progress)
            .unwrap_or_else(|_| Event::default().data("progress serialization failed")))
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
