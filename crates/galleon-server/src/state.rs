//! Application state with the shared index and sync engine.
//!
//! [`AppState`] holds the gallery service behind an `Option`: every query
//! entry point refuses with a distinct not-initialized signal instead of
//! crashing when the index was never set up. The store itself lives in
//! `Arc<tokio::sync::Mutex<>>` -- `rusqlite::Connection` is not `Sync`, so
//! an async mutex (awaited, never blocking the runtime) is the sharing
//! primitive, and it doubles as the writer serialization the sync engine
//! requires.

use std::sync::Arc;
use std::time::Duration;

use galleon_core::MetadataService;
use galleon_storage::{FilterOptions, IndexStore};
use galleon_sync::debug::FsDebugSink;
use galleon_sync::{
    BoundedCache, EmbeddedMetadataScanner, NullThumbnailer, SyncConfig, SyncEngine, WorkerContext,
};

use crate::config::GalleryConfig;
use crate::error::ApiError;

/// Aggregate-cache TTL; stale aggregates are also actively invalidated by
/// the sync engine's publish phase.
const FILTER_CACHE_TTL: Duration = Duration::from_secs(300);

/// Everything the handlers need, constructed once at startup.
pub struct GalleryService {
    pub store: Arc<tokio::sync::Mutex<IndexStore>>,
    pub engine: Arc<SyncEngine>,
    pub filter_cache: Arc<BoundedCache<String, FilterOptions>>,
    pub config: GalleryConfig,
}

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    service: Option<Arc<GalleryService>>,
}

impl AppState {
    /// Builds the full service stack from configuration.
    pub fn new(config: GalleryConfig) -> Result<Self, ApiError> {
        let store = IndexStore::open(&config.db_path.to_string_lossy())
            .map_err(|e| ApiError::InternalError(format!("could not open index: {e}")))?;
        Ok(Self::with_store(store, config))
    }

    /// Builds the service stack over an in-memory index (for testing).
    pub fn in_memory(config: GalleryConfig) -> Result<Self, ApiError> {
        let store = IndexStore::in_memory()
            .map_err(|e| ApiError::InternalError(format!("could not open index: {e}")))?;
        Ok(Self::with_store(store, config))
    }

    /// State with no service attached; every handler answers 503.
    pub fn uninitialized() -> Self {
        AppState { service: None }
    }

    fn with_store(store: IndexStore, config: GalleryConfig) -> Self {
        let metadata = match &config.debug_dir {
            Some(dir) => {
                MetadataService::with_debug_sink(Arc::new(FsDebugSink::new(dir.clone())))
            }
            None => MetadataService::new(),
        };
        let context = Arc::new(WorkerContext {
            extensions: config.extensions.clone(),
            metadata,
            source: Arc::new(EmbeddedMetadataScanner::new(config.workflow_log_dir.clone())),
            thumbnails: Arc::new(NullThumbnailer),
        });

        let store = Arc::new(tokio::sync::Mutex::new(store));
        let filter_cache = Arc::new(BoundedCache::new(8, FILTER_CACHE_TTL));

        let mut sync_config = SyncConfig::new(config.base_path.clone());
        sync_config.workers = config.workers;
        sync_config.batch_size = config.batch_size;

        let engine = Arc::new(SyncEngine::new(
            Arc::clone(&store),
            context,
            sync_config,
            Arc::clone(&filter_cache),
        ));

        AppState {
            service: Some(Arc::new(GalleryService {
                store,
                engine,
                filter_cache,
                config,
            })),
        }
    }

    /// The service, or the not-initialized refusal.
    pub fn service(&self) -> Result<&Arc<GalleryService>, ApiError> {
        self.service.as_ref().ok_or(ApiError::NotInitialized)
    }
}
