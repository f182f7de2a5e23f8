//! End-to-end integration tests for the galleon HTTP API.
//!
//! Tests exercise the full stack: HTTP request -> axum router -> handler ->
//! store/sync engine -> HTTP response. Each test creates a fresh AppState
//! over an in-memory index and a temp media directory, and uses
//! `tower::ServiceExt::oneshot` to send requests directly to the router
//! without starting a network server.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

use galleon_server::config::GalleryConfig;
use galleon_server::router::build_router;
use galleon_server::state::AppState;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// A media file whose bytes carry an embedded inline workflow.
fn workflow_bytes(sampler: &str, cfg: f64) -> Vec<u8> {
    json!({
        "3": {"class_type": "KSampler", "inputs": {
            "steps": 20, "cfg": cfg,
            "sampler_name": sampler, "scheduler": "normal",
            "positive": ["6", 0], "latent_image": ["5", 0]
        }},
        "5": {"class_type": "EmptyLatentImage",
              "inputs": {"width": 1024, "height": 768}},
        "6": {"class_type": "CLIPTextEncode",
              "inputs": {"text": "a quiet harbor"}}
    })
    .to_string()
    .into_bytes()
}

/// Creates a temp media tree and a router over an in-memory index.
fn test_app() -> (TempDir, Router) {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("euler.png"), workflow_bytes("euler", 7.5)).unwrap();
    std::fs::write(dir.path().join("dpmpp.png"), workflow_bytes("dpmpp_2m", 3.0)).unwrap();
    std::fs::write(dir.path().join("plain.png"), b"no payload").unwrap();

    let state = AppState::in_memory(GalleryConfig::for_base(dir.path().to_path_buf()))
        .expect("failed to create in-memory AppState");
    (dir, build_router(state))
}

async fn request(
    app: &Router,
    method: &str,
    path: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(path);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&value).unwrap())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap_or(json!(null));
    (status, value)
}

async fn get_json(app: &Router, path: &str) -> (StatusCode, serde_json::Value) {
    request(app, "GET", path, None).await
}

async fn post_json(
    app: &Router,
    path: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    request(app, "POST", path, Some(body)).await
}

/// Runs the full sync and returns its summary.
async fn sync(app: &Router) -> serde_json::Value {
    let (status, body) = post_json(app, "/gallery/sync", json!({})).await;
    assert_eq!(status, StatusCode::OK, "sync failed: {body:?}");
    body
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sync_then_list_returns_indexed_files() {
    let (_dir, app) = test_app();
    let summary = sync(&app).await;
    assert_eq!(summary["added"], 3);
    assert_eq!(summary["with_workflow"], 2);

    let (status, body) = get_json(&app, "/gallery/files").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["files"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn metadata_filters_narrow_without_duplicating() {
    let (_dir, app) = test_app();
    sync(&app).await;

    let (status, body) = get_json(&app, "/gallery/files?filter_sampler=euler").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["files"][0]["sampler_names"], "euler");

    // A cfg range matching both samplers still yields each file once.
    let (_, body) = get_json(&app, "/gallery/files?filter_cfg_min=1.0").await;
    assert_eq!(body["total"], 2);

    let (_, body) = get_json(&app, "/gallery/files?filter_cfg_min=100.0").await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn samplers_endpoint_returns_rows_in_order() {
    let (_dir, app) = test_app();
    sync(&app).await;

    let (_, listing) = get_json(&app, "/gallery/files?filter_sampler=euler").await;
    let file_id = listing["files"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = get_json(&app, &format!("/gallery/files/{file_id}/samplers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sampler_count"], 1);
    assert_eq!(body["samplers"][0]["sampler_name"], "euler");
    assert_eq!(body["samplers"][0]["width"], 1024);

    let (status, _) = get_json(&app, "/gallery/files/definitely-missing/samplers").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn filter_options_aggregate_and_cache() {
    let (_dir, app) = test_app();
    sync(&app).await;

    let (status, body) = get_json(&app, "/gallery/filter-options").await;
    assert_eq!(status, StatusCode::OK);
    let samplers: Vec<&str> = body["samplers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["value"].as_str().unwrap())
        .collect();
    assert!(samplers.contains(&"euler"));
    assert!(samplers.contains(&"dpmpp_2m"));
    assert_eq!(body["cfg_range"], json!([3.0, 7.5]));

    // Second read is served from cache; stats must show the hit.
    get_json(&app, "/gallery/filter-options").await;
    let (_, stats) = get_json(&app, "/gallery/stats").await;
    assert!(stats["cache"]["hits"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn favorite_toggle_roundtrip() {
    let (_dir, app) = test_app();
    sync(&app).await;

    let (_, listing) = get_json(&app, "/gallery/files").await;
    let file_id = listing["files"][0]["id"].as_str().unwrap().to_string();

    let (status, body) =
        post_json(&app, &format!("/gallery/files/{file_id}/favorite"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_favorite"], true);

    let (_, favorites) = get_json(&app, "/gallery/files?favorites=true").await;
    assert_eq!(favorites["total"], 1);
    assert_eq!(favorites["files"][0]["id"], file_id.as_str());
}

#[tokio::test]
async fn rename_recomputes_id_and_moves_the_disk_file() {
    let (dir, app) = test_app();
    sync(&app).await;

    let (_, listing) = get_json(&app, "/gallery/files?filter_sampler=euler").await;
    let file_id = listing["files"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = post_json(
        &app,
        &format!("/gallery/files/{file_id}/rename"),
        json!({ "new_name": "harbor" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "rename failed: {body:?}");
    assert_eq!(body["new_name"], "harbor.png");
    let new_id = body["new_id"].as_str().unwrap();
    assert_ne!(new_id, file_id);

    assert!(dir.path().join("harbor.png").is_file());
    assert!(!dir.path().join("euler.png").exists());

    // Sampler rows followed the id; the old id is gone.
    let (status, body) = get_json(&app, &format!("/gallery/files/{new_id}/samplers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sampler_count"], 1);
    let (status, _) = get_json(&app, &format!("/gallery/files/{file_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rename_rejects_invalid_names() {
    let (_dir, app) = test_app();
    sync(&app).await;
    let (_, listing) = get_json(&app, "/gallery/files").await;
    let file_id = listing["files"][0]["id"].as_str().unwrap().to_string();

    for bad in ["", "a/b", "..sneaky", "pipe|name"] {
        let (status, _) = post_json(
            &app,
            &format!("/gallery/files/{file_id}/rename"),
            json!({ "new_name": bad }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted bad name {bad:?}");
    }
}

#[tokio::test]
async fn delete_removes_disk_file_and_index_row() {
    let (dir, app) = test_app();
    sync(&app).await;

    let (_, listing) = get_json(&app, "/gallery/files?filter_sampler=euler").await;
    let file_id = listing["files"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = post_json(
        &app,
        "/gallery/files/delete",
        json!({ "file_ids": [file_id] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);

    assert!(!dir.path().join("euler.png").exists());
    let (_, remaining) = get_json(&app, "/gallery/files").await;
    assert_eq!(remaining["total"], 2);
}

#[tokio::test]
async fn move_endpoint_relocates_files_within_the_tree() {
    let (dir, app) = test_app();
    sync(&app).await;
    let sub = dir.path().join("archive");
    std::fs::create_dir(&sub).unwrap();

    let (_, listing) = get_json(&app, "/gallery/files?filter_sampler=euler").await;
    let file_id = listing["files"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = post_json(
        &app,
        "/gallery/files/move",
        json!({ "file_ids": [file_id], "destination": sub.to_string_lossy() }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "move failed: {body:?}");
    assert_eq!(body["moved"], 1);
    assert!(sub.join("euler.png").is_file());
}

#[tokio::test]
async fn uninitialized_state_refuses_queries_with_503() {
    let app = build_router(AppState::uninitialized());

    let (status, body) = get_json(&app, "/gallery/files").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "NOT_INITIALIZED");

    let (status, _) = post_json(&app, "/gallery/sync", json!({})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    // Health reports unhealthy instead of refusing.
    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unhealthy");
}

#[tokio::test]
async fn health_reports_database_counts() {
    let (_dir, app) = test_app();
    sync(&app).await;

    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["total_files"], 3);
    assert_eq!(body["database"]["files_with_workflow"], 2);
}
