//! Storage-layer types for file identity and query results.
//!
//! [`FileRecord`] is defined here (not in galleon-core) because file
//! identity is a storage concern -- records only gain their path-derived id
//! when persisted, and the parsing crate never sees the filesystem.

use serde::{Deserialize, Serialize};

/// Media category of an indexed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Image,
    AnimatedImage,
    Video,
    Audio,
    Unknown,
}

impl Default for FileKind {
    fn default() -> Self {
        FileKind::Unknown
    }
}

impl FileKind {
    /// Stable TEXT column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::AnimatedImage => "animated_image",
            FileKind::Video => "video",
            FileKind::Audio => "audio",
            FileKind::Unknown => "unknown",
        }
    }

    /// Parses a TEXT column value; anything unrecognized is `Unknown`.
    pub fn parse(s: &str) -> FileKind {
        match s {
            "image" => FileKind::Image,
            "animated_image" => FileKind::AnimatedImage,
            "video" => FileKind::Video,
            "audio" => FileKind::Audio,
            _ => FileKind::Unknown,
        }
    }
}

/// One indexed file.
///
/// `id` is derived from `path` (see [`crate::ids::file_id`]); the two are
/// only ever rewritten together. `mtime` is epoch seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub path: String,
    pub mtime: f64,
    pub name: String,
    pub kind: FileKind,
    pub duration: Option<String>,
    pub dimensions: Option<String>,
    pub has_workflow: bool,
    pub is_favorite: bool,
    /// Truncated positive prompt of the first sampler (display preview).
    pub prompt_preview: Option<String>,
    /// Sorted, de-duplicated, comma-joined sampler names.
    pub sampler_names: String,
}

/// A file record as returned by paginated queries, with the number of
/// sampler rows attached.
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    #[serde(flatten)]
    pub record: FileRecord,
    pub sampler_count: i64,
}

/// One page of query results plus the total matching count.
#[derive(Debug, Clone, Serialize)]
pub struct FilePage {
    pub files: Vec<FileEntry>,
    pub total: i64,
}

/// One distinct filterable value with the number of files carrying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionCount {
    pub value: String,
    pub file_count: i64,
}

/// Aggregated filterable metadata values and numeric ranges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub models: Vec<OptionCount>,
    pub samplers: Vec<OptionCount>,
    pub schedulers: Vec<OptionCount>,
    pub cfg_range: Option<(f64, f64)>,
    pub steps_range: Option<(i64, i64)>,
    pub width_range: Option<(i64, i64)>,
    pub height_range: Option<(i64, i64)>,
}

/// Per-kind file statistics.
#[derive(Debug, Clone, Serialize)]
pub struct KindStats {
    pub kind: String,
    pub count: i64,
    pub with_workflow: i64,
    pub favorites: i64,
}

/// Sampler-metadata statistics across the whole index.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowStats {
    pub total_files: i64,
    pub total_samplers: i64,
    pub unique_models: i64,
    pub unique_samplers: i64,
    pub unique_schedulers: i64,
}

/// Combined index statistics for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub files: Vec<KindStats>,
    pub workflows: WorkflowStats,
}
