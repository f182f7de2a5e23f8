//! Mutation handlers: favorite, rename, move, delete.
//!
//! Every mutation performs its filesystem operation before touching the
//! index, never the reverse -- a failed filesystem operation must not
//! leave the index referencing a non-existent path. File ids are
//! path-derived, so rename/move rewrite id and path together atomically
//! through the store.

use std::path::{Path as FsPath, PathBuf};

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Batch favorite request.
#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub file_ids: Vec<String>,
    pub favorite: bool,
}

/// Sets the favorite flag on a batch of files.
///
/// `POST /gallery/files/favorite`
pub async fn favorite_batch(
    State(state): State<AppState>,
    Json(req): Json<FavoriteRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.file_ids.is_empty() {
        return Err(ApiError::BadRequest("no files selected".to_string()));
    }
    let service = state.service()?;
    let mut store = service.store.lock().await;
    let updated = store.set_favorite(&req.file_ids, req.favorite)?;
    Ok(Json(json!({ "status": "success", "updated": updated })))
}

/// Flips the favorite flag on one file.
///
/// `POST /gallery/files/{id}/favorite`
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let service = state.service()?;
    let mut store = service.store.lock().await;
    let is_favorite = store.toggle_favorite(&id)?;
    Ok(Json(json!({ "status": "success", "is_favorite": is_favorite })))
}

/// Rename request body.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub new_name: String,
}

/// Rename response with the recomputed id.
#[derive(Debug, Serialize)]
pub struct RenameResponse {
    pub status: &'static str,
    pub new_id: String,
    pub new_name: String,
}

/// Renames a file in place, recomputing its path-derived id.
///
/// `POST /gallery/files/{id}/rename`
pub async fn rename_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<RenameResponse>, ApiError> {
    let new_name = req.new_name.trim();
    validate_file_name(new_name)?;

    let service = state.service()?;
    let mut store = service.store.lock().await;

    let record = store
        .get_file(&id)?
        .ok_or_else(|| ApiError::NotFound(format!("file {id}")))?;
    let old_path = PathBuf::from(&record.path);

    // Keep the original extension when the caller omitted one.
    let final_name = if FsPath::new(new_name).extension().is_some() {
        new_name.to_string()
    } else {
        match FsPath::new(&record.name).extension() {
            Some(ext) => format!("{new_name}.{}", ext.to_string_lossy()),
            None => new_name.to_string(),
        }
    };
    if final_name == record.name {
        return Err(ApiError::BadRequest(
            "the new name is the same as the old one".to_string(),
        ));
    }

    let parent = old_path
        .parent()
        .ok_or_else(|| ApiError::InternalError("file has no parent directory".to_string()))?;
    let new_path = parent.join(&final_name);
    if !new_path.starts_with(&service.config.base_path) {
        return Err(ApiError::BadRequest("invalid file location".to_string()));
    }
    if new_path.exists() {
        return Err(ApiError::Conflict(format!(
            "a file named \"{final_name}\" already exists in this folder"
        )));
    }

    // Filesystem first; only a successful rename reaches the index.
    std::fs::rename(&old_path, &new_path).map_err(|e| {
        error!(error = %e, path = %old_path.display(), "rename failed");
        ApiError::InternalError(format!("could not rename file: {e}"))
    })?;

    let new_id = store.update_path(&id, &new_path.to_string_lossy(), &final_name)?;
    Ok(Json(RenameResponse {
        status: "success",
        new_id,
        new_name: final_name,
    }))
}

/// Batch move request body. `destination` is an absolute folder path under
/// the indexed tree.
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub file_ids: Vec<String>,
    pub destination: String,
}

/// Moves a batch of files into another folder, renaming on collision.
///
/// `POST /gallery/files/move`
pub async fn move_batch(
    State(state): State<AppState>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<Value>, ApiError> {
    let service = state.service()?;
    let destination = PathBuf::from(&req.destination);
    if req.file_ids.is_empty() {
        return Err(ApiError::BadRequest("no files selected".to_string()));
    }
    if !destination.starts_with(&service.config.base_path) || !destination.is_dir() {
        return Err(ApiError::BadRequest("invalid destination folder".to_string()));
    }

    let mut moved = 0usize;
    let mut renamed = 0usize;
    let mut failed: Vec<String> = Vec::new();

    let mut store = service.store.lock().await;
    for file_id in &req.file_ids {
        let Some(record) = store.get_file(file_id)? else {
            failed.push(format!("id {file_id} not found"));
            continue;
        };
        let source = PathBuf::from(&record.path);
        if !source.exists() {
            // Already gone from disk; drop the stale index row.
            store.delete_by_ids(std::slice::from_ref(file_id))?;
            failed.push(format!("{} (not found on disk)", record.name));
            continue;
        }

        let target = unique_destination(&destination, &record.name);
        let target_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| record.name.clone());
        if target_name != record.name {
            renamed += 1;
        }

        // Filesystem first.
        if let Err(e) = std::fs::rename(&source, &target) {
            warn!(error = %e, path = %source.display(), "move failed");
            failed.push(record.name.clone());
            continue;
        }
        store.update_path(file_id, &target.to_string_lossy(), &target_name)?;
        moved += 1;
    }

    Ok(Json(json!({
        "status": if failed.is_empty() { "success" } else { "partial_success" },
        "moved": moved,
        "renamed": renamed,
        "failed": failed,
    })))
}

/// Batch delete request body.
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub file_ids: Vec<String>,
}

/// Deletes files from disk and then from the index.
///
/// `POST /gallery/files/delete`
pub async fn delete_batch(
    State(state): State<AppState>,
    Json(req): Json<DeleteRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.file_ids.is_empty() {
        return Err(ApiError::BadRequest("no files selected".to_string()));
    }
    let service = state.service()?;
    let mut store = service.store.lock().await;

    let mut removable: Vec<String> = Vec::new();
    let mut failed: Vec<String> = Vec::new();
    for file_id in &req.file_ids {
        let Some(record) = store.get_file(file_id)? else {
            // Already absent: the desired state.
            continue;
        };
        let path = PathBuf::from(&record.path);
        match std::fs::remove_file(&path) {
            Ok(()) => removable.push(file_id.clone()),
            // A path already missing from disk still gets its row cleaned up.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                removable.push(file_id.clone())
            }
            Err(e) => {
                error!(error = %e, path = %path.display(), "delete failed");
                failed.push(record.name.clone());
            }
        }
    }

    let deleted = store.delete_by_ids(&removable)?;
    Ok(Json(json!({
        "status": if failed.is_empty() { "success" } else { "partial_success" },
        "deleted": deleted,
        "failed": failed,
    })))
}

/// Rejects empty, oversized, traversing, or separator-carrying names.
fn validate_file_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.len() > 250 {
        return Err(ApiError::BadRequest(
            "the provided filename is invalid or too long".to_string(),
        ));
    }
    if name.contains("..") || name.chars().any(|c| "\\/:\"*?<>|".contains(c)) {
        return Err(ApiError::BadRequest(
            "filename contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// First collision-free destination path: `name.ext`, `name(1).ext`, ...
fn unique_destination(folder: &FsPath, name: &str) -> PathBuf {
    let candidate = folder.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{ext}")),
        _ => (name.to_string(), String::new()),
    };
    let mut counter = 1;
    loop {
        let candidate = folder.join(format!("{stem}({counter}){ext}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_validation_rejects_bad_shapes() {
        assert!(validate_file_name("fine.png").is_ok());
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("a/b.png").is_err());
        assert!(validate_file_name("..\\escape").is_err());
        assert!(validate_file_name("x".repeat(251).as_str()).is_err());
    }

    #[test]
    fn unique_destination_counts_up_past_collisions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"x").unwrap();
        std::fs::write(dir.path().join("a(1).png"), b"x").unwrap();

        let fresh = unique_destination(dir.path(), "b.png");
        assert_eq!(fresh, dir.path().join("b.png"));

        let bumped = unique_destination(dir.path(), "a.png");
        assert_eq!(bumped, dir.path().join("a(2).png"));
    }
}
