//! The opaque thumbnail-producer seam.
//!
//! Thumbnail and transcoding mechanics live outside the core: the engine
//! calls [`ThumbnailProducer::produce`] once per new/changed file during
//! dispatch and stores only the returned path reference, never bytes.

use std::path::{Path, PathBuf};

use galleon_storage::FileKind;

/// External thumbnail producer invoked per file.
pub trait ThumbnailProducer: Send + Sync {
    /// Produces (or reuses) a thumbnail for the file, returning the cache
    /// path, or None when no thumbnail could be made.
    fn produce(&self, path: &Path, content_hash: &str, kind: FileKind) -> Option<PathBuf>;
}

/// Producer that never makes thumbnails. Used in tests and in deployments
/// where a separate service owns the thumbnail cache.
pub struct NullThumbnailer;

impl ThumbnailProducer for NullThumbnailer {
    fn produce(&self, _path: &Path, _content_hash: &str, _kind: FileKind) -> Option<PathBuf> {
        None
    }
}
