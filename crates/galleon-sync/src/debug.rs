//! Filesystem debug sink for extraction stages.
//!
//! When wired into the metadata service, every processing stage of every
//! file lands as one JSON document under `<root>/<file label>/`. Both sync
//! modes share the same service instance, so enabling the sink covers full
//! and per-folder passes alike.

use std::path::PathBuf;

use serde_json::Value;
use tracing::warn;

use galleon_core::DebugSink;

/// Sink writing one pretty-printed JSON file per stage per file.
pub struct FsDebugSink {
    root: PathBuf,
}

impl FsDebugSink {
    pub fn new(root: PathBuf) -> Self {
        FsDebugSink { root }
    }
}

impl DebugSink for FsDebugSink {
    fn record(&self, label: &str, stage: &str, payload: &Value) {
        let dir = self.root.join(sanitize(label));
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!(error = %e, "could not create debug directory");
            return;
        }
        let path = dir.join(format!("{stage}.json"));
        let body = serde_json::to_string_pretty(payload).unwrap_or_default();
        if let Err(e) = std::fs::write(&path, body) {
            warn!(error = %e, path = %path.display(), "could not write debug stage");
        }
    }
}

fn sanitize(label: &str) -> String {
    label
        .chars()
        .map(|c| if c == '/' || c == '\\' || c == ':' { '_' } else { c })
        .collect()
}
