//! Extension sets and worker configuration.
//!
//! Workers run in a pool and cannot lean on any process-wide state, so
//! everything a worker needs travels in one immutable [`WorkerContext`]
//! shared behind an `Arc`.

use std::path::PathBuf;
use std::sync::Arc;

use galleon_core::MetadataService;
use galleon_storage::FileKind;

use crate::source::MetadataSource;
use crate::thumbs::ThumbnailProducer;

/// Configured extension lists per media category, consumed as plain lookup
/// tables. Extensions are stored lowercase with the leading dot.
#[derive(Debug, Clone)]
pub struct ExtensionSets {
    pub video: Vec<String>,
    pub image: Vec<String>,
    pub animated: Vec<String>,
    pub audio: Vec<String>,
}

impl Default for ExtensionSets {
    fn default() -> Self {
        let list = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        ExtensionSets {
            video: list(&[".mp4", ".mkv", ".webm", ".mov", ".avi"]),
            image: list(&[".png", ".jpg", ".jpeg"]),
            animated: list(&[".gif", ".webp"]),
            audio: list(&[".mp3", ".wav", ".ogg", ".flac"]),
        }
    }
}

impl ExtensionSets {
    /// Classifies a lowercase dotted extension into a media category.
    pub fn classify(&self, ext: &str) -> FileKind {
        if self.image.iter().any(|e| e == ext) {
            FileKind::Image
        } else if self.animated.iter().any(|e| e == ext) {
            FileKind::AnimatedImage
        } else if self.video.iter().any(|e| e == ext) {
            FileKind::Video
        } else if self.audio.iter().any(|e| e == ext) {
            FileKind::Audio
        } else {
            FileKind::Unknown
        }
    }

    /// True when the extension belongs to any configured media category.
    pub fn is_media(&self, ext: &str) -> bool {
        self.classify(ext) != FileKind::Unknown
    }
}

/// Reconciliation configuration.
///
/// The worker pool is bounded explicitly (not "all cores") because
/// per-file decoding is memory-heavy; an unbounded pool risks exhausting
/// memory on large batches.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Root of the indexed directory tree.
    pub base_path: PathBuf,
    /// Maximum concurrent extraction workers.
    pub workers: usize,
    /// Records per commit transaction.
    pub batch_size: usize,
    /// Directory names excluded from scanning (cache folders etc.).
    pub excluded_dirs: Vec<String>,
}

impl SyncConfig {
    /// Configuration for the given base path with default bounds.
    pub fn new(base_path: PathBuf) -> Self {
        SyncConfig {
            base_path,
            workers: 4,
            batch_size: 500,
            excluded_dirs: vec![".thumbnails_cache".to_string(), ".sqlite_cache".to_string()],
        }
    }
}

/// Immutable per-worker configuration: extension tables, the metadata
/// byte source, the extraction service, and the thumbnail producer.
///
/// Constructed once per engine and shared by every dispatched worker.
pub struct WorkerContext {
    pub extensions: ExtensionSets,
    pub metadata: MetadataService,
    pub source: Arc<dyn MetadataSource>,
    pub thumbnails: Arc<dyn ThumbnailProducer>,
}
