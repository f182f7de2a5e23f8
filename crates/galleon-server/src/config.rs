//! Server configuration from environment variables.
//!
//! - `GALLEON_BASE_PATH`: root of the indexed media tree (default ".")
//! - `GALLEON_DB_PATH`: SQLite database file (default "galleon.db")
//! - `GALLEON_PORT`: listen port (default 8008)
//! - `GALLEON_WORKERS`: extraction worker bound (default 4)
//! - `GALLEON_PAGE_SIZE`: files per query page (default 100)
//! - `GALLEON_WORKFLOW_LOG_DIR`: sidecar workflow-log directory (optional)
//! - `GALLEON_DEBUG_DIR`: extraction debug-artifact directory (optional;
//!   enabling it wires the debug sink into both sync modes)

use std::path::PathBuf;

use galleon_sync::ExtensionSets;

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    pub base_path: PathBuf,
    pub db_path: PathBuf,
    pub port: u16,
    pub page_size: u32,
    pub workers: usize,
    pub batch_size: usize,
    pub extensions: ExtensionSets,
    pub workflow_log_dir: Option<PathBuf>,
    pub debug_dir: Option<PathBuf>,
}

impl GalleryConfig {
    /// Reads configuration from the environment, applying defaults.
    pub fn from_env() -> Self {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

        GalleryConfig {
            base_path: env("GALLEON_BASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            db_path: env("GALLEON_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("galleon.db")),
            port: env("GALLEON_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8008),
            page_size: env("GALLEON_PAGE_SIZE")
                .and_then(|p| p.parse().ok())
                .unwrap_or(100),
            workers: env("GALLEON_WORKERS")
                .and_then(|w| w.parse().ok())
                .unwrap_or(4),
            batch_size: 500,
            extensions: ExtensionSets::default(),
            workflow_log_dir: env("GALLEON_WORKFLOW_LOG_DIR").map(PathBuf::from),
            debug_dir: env("GALLEON_DEBUG_DIR").map(PathBuf::from),
        }
    }

    /// Configuration rooted at `base_path` with defaults everywhere else
    /// (used by tests).
    pub fn for_base(base_path: PathBuf) -> Self {
        GalleryConfig {
            base_path,
            db_path: PathBuf::from(":memory:"),
            port: 0,
            page_size: 100,
            workers: 4,
            batch_size: 500,
            extensions: ExtensionSets::default(),
            workflow_log_dir: None,
            debug_dir: None,
        }
    }
}
