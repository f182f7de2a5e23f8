//! Query handlers for the paginated file index.
//!
//! Provides the page/count query surface, per-file sampler inspection, the
//! cached filter-options aggregates, and stats/health endpoints. All
//! handlers are read-only against the store.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use galleon_core::SamplerRecord;
use galleon_storage::{FileFilter, FilePage, FileRecord, FilterOptions, MetadataFilter};
use galleon_storage::{SortDir, SortKey};

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for the file listing.
///
/// `prefix` and `extension` accept comma-separated lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilesQuery {
    pub folder: Option<String>,
    pub page: Option<u32>,
    #[serde(default)]
    pub sort_by: SortKey,
    #[serde(default)]
    pub sort_order: SortDir,
    pub search: Option<String>,
    #[serde(default)]
    pub favorites: bool,
    pub prefix: Option<String>,
    pub extension: Option<String>,
    pub filter_model: Option<String>,
    pub filter_sampler: Option<String>,
    pub filter_scheduler: Option<String>,
    pub filter_cfg_min: Option<f64>,
    pub filter_cfg_max: Option<f64>,
    pub filter_steps_min: Option<i64>,
    pub filter_steps_max: Option<i64>,
    pub filter_width_min: Option<i64>,
    pub filter_width_max: Option<i64>,
    pub filter_height_min: Option<i64>,
    pub filter_height_max: Option<i64>,
}

impl FilesQuery {
    fn filter(&self) -> FileFilter {
        let split_list = |value: &Option<String>| -> Vec<String> {
            value
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        };

        FileFilter {
            folder: self.folder.clone(),
            search: self.search.clone(),
            favorites_only: self.favorites,
            prefixes: split_list(&self.prefix),
            extensions: split_list(&self.extension),
            metadata: MetadataFilter {
                model: self.filter_model.clone(),
                sampler: self.filter_sampler.clone(),
                scheduler: self.filter_scheduler.clone(),
                cfg_min: self.filter_cfg_min,
                cfg_max: self.filter_cfg_max,
                steps_min: self.filter_steps_min,
                steps_max: self.filter_steps_max,
                width_min: self.filter_width_min,
                width_max: self.filter_width_max,
                height_min: self.filter_height_min,
                height_max: self.filter_height_max,
            },
        }
    }
}

/// Returns one page of matching files plus the total count.
///
/// `GET /gallery/files`
pub async fn list_files(
    State(state): State<AppState>,
    Query(params): Query<FilesQuery>,
) -> Result<Json<FilePage>, ApiError> {
    let service = state.service()?;
    let page = params.page.unwrap_or(1).max(1);
    let limit = service.config.page_size;
    let offset = (page - 1) * limit;

    let store = service.store.lock().await;
    let result = store.query_page(
        &params.filter(),
        params.sort_by,
        params.sort_order,
        limit,
        offset,
    )?;
    Ok(Json(result))
}

/// Returns the count of matching files without a page.
///
/// `GET /gallery/files/count`
pub async fn count_files(
    State(state): State<AppState>,
    Query(params): Query<FilesQuery>,
) -> Result<Json<Value>, ApiError> {
    let service = state.service()?;
    let store = service.store.lock().await;
    let total = store.count_matching(&params.filter())?;
    Ok(Json(json!({ "total": total })))
}

/// Returns a single file record.
///
/// `GET /gallery/files/{id}`
pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FileRecord>, ApiError> {
    let service = state.service()?;
    let store = service.store.lock().await;
    let record = store
        .get_file(&id)?
        .ok_or_else(|| ApiError::NotFound(format!("file {id}")))?;
    Ok(Json(record))
}

/// Sampler metadata rows for one file, ordered by sampler index.
#[derive(Debug, Serialize)]
pub struct SamplersResponse {
    pub file_id: String,
    pub sampler_count: usize,
    pub samplers: Vec<SamplerRecord>,
}

/// Returns all sampler metadata for a file.
///
/// `GET /gallery/files/{id}/samplers`
pub async fn file_samplers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SamplersResponse>, ApiError> {
    let service = state.service()?;
    let store = service.store.lock().await;
    if store.get_file(&id)?.is_none() {
        return Err(ApiError::NotFound(format!("file {id}")));
    }
    let samplers = store.samplers_for_file(&id)?;
    Ok(Json(SamplersResponse {
        file_id: id,
        sampler_count: samplers.len(),
        samplers,
    }))
}

/// Returns filterable metadata aggregates, cached.
///
/// `GET /gallery/filter-options`
pub async fn filter_options(
    State(state): State<AppState>,
) -> Result<Json<FilterOptions>, ApiError> {
    let service = state.service()?;
    let cache_key = "options".to_string();

    if let Some(options) = service.filter_cache.get(&cache_key) {
        return Ok(Json(options));
    }

    let options = {
        let store = service.store.lock().await;
        store.filter_options()?
    };
    service.filter_cache.set(cache_key, options.clone());
    Ok(Json(options))
}

/// Returns index statistics plus cache counters.
///
/// `GET /gallery/stats`
pub async fn stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let service = state.service()?;
    let index_stats = {
        let store = service.store.lock().await;
        store.stats()?
    };
    Ok(Json(json!({
        "status": "success",
        "files": index_stats.files,
        "workflows": index_stats.workflows,
        "cache": service.filter_cache.stats(),
    })))
}

/// Liveness/readiness check.
///
/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    match state.service() {
        Ok(service) => {
            let counts = {
                let store = service.store.lock().await;
                store
                    .file_count()
                    .and_then(|files| store.files_with_metadata().map(|meta| (files, meta)))
            };
            match counts {
                Ok((total_files, files_with_workflow)) => Json(json!({
                    "status": "healthy",
                    "database": {
                        "connected": true,
                        "total_files": total_files,
                        "files_with_workflow": files_with_workflow,
                    },
                    "cache": service.filter_cache.stats(),
                })),
                Err(e) => Json(json!({
                    "status": "unhealthy",
                    "error": e.to_string(),
                })),
            }
        }
        Err(_) => Json(json!({
            "status": "unhealthy",
            "error": "index not initialized",
        })),
    }
}
