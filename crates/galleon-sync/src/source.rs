//! Raw embedded-metadata byte readers.
//!
//! Extraction never opens media files itself; it receives raw bytes from a
//! [`MetadataSource`]. The default implementation scans file content for a
//! balanced JSON object (which covers PNG text chunks, EXIF blobs, and
//! appended payloads alike) and falls back to sidecar workflow-log files
//! named after the media file.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

/// Reader that, given a file path, returns the raw embedded-metadata byte
/// string, or None when the file carries none.
pub trait MetadataSource: Send + Sync {
    fn raw_metadata(&self, path: &Path) -> Option<Vec<u8>>;
}

/// Default metadata source: balanced-brace scan over the head of the file,
/// then a sidecar workflow-log lookup.
pub struct EmbeddedMetadataScanner {
    /// Directory holding `<file_name>*.json` workflow logs, if configured.
    workflow_log_dir: Option<PathBuf>,
}

/// Embedded graphs live near the head of the file; scanning is capped so a
/// multi-gigabyte video cannot be pulled into memory.
const SCAN_CAP: usize = 16 * 1024 * 1024;

impl EmbeddedMetadataScanner {
    pub fn new(workflow_log_dir: Option<PathBuf>) -> Self {
        EmbeddedMetadataScanner { workflow_log_dir }
    }

    fn sidecar_log(&self, path: &Path) -> Option<Vec<u8>> {
        let dir = self.workflow_log_dir.as_ref()?;
        let file_name = path.file_name()?.to_string_lossy().into_owned();

        // Latest matching log wins.
        let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
        for entry in std::fs::read_dir(dir).ok()?.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(&file_name) || !name.ends_with(".json") {
                continue;
            }
            let Ok(meta) = entry.metadata() else { continue };
            let modified = meta.modified().unwrap_or(std::time::UNIX_EPOCH);
            if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
                newest = Some((modified, entry.path()));
            }
        }

        let (_, log_path) = newest?;
        let content = std::fs::read_to_string(&log_path).ok()?;
        validate_workflow_json(&content).map(String::into_bytes)
    }
}

impl MetadataSource for EmbeddedMetadataScanner {
    fn raw_metadata(&self, path: &Path) -> Option<Vec<u8>> {
        if let Some(bytes) = read_head(path, SCAN_CAP) {
            if let Some(candidate) = scan_bytes_for_json(&bytes) {
                if let Some(valid) = validate_workflow_json(&candidate) {
                    return Some(valid.into_bytes());
                }
            }
        }

        self.sidecar_log(path)
    }
}

fn read_head(path: &Path, cap: usize) -> Option<Vec<u8>> {
    let file = std::fs::File::open(path).ok()?;
    let mut bytes = Vec::new();
    file.take(cap as u64).read_to_end(&mut bytes).ok()?;
    Some(bytes)
}

/// Scans bytes for the first balanced `{...}` span and returns it when it
/// parses as JSON.
pub fn scan_bytes_for_json(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let start = text.find('{')?;
    let mut depth = 0usize;

    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    let candidate = &text[start..start + offset + ch.len_utf8()];
                    return if serde_json::from_str::<Value>(candidate).is_ok() {
                        Some(candidate.to_string())
                    } else {
                        debug!("balanced span did not parse as JSON");
                        None
                    };
                }
            }
            _ => {}
        }
    }
    None
}

/// Validates a candidate payload and unwraps single-key envelopes.
///
/// A `workflow`/`Workflow`/`prompt`/`Prompt` wrapper holding the linked
/// shape is unwrapped to the inner graph; everything else that is a
/// non-empty object passes through unchanged (deeper envelope handling is
/// the extraction service's concern).
pub fn validate_workflow_json(candidate: &str) -> Option<String> {
    let data: Value = serde_json::from_str(candidate).ok()?;
    let inner = ["workflow", "Workflow", "prompt", "Prompt"]
        .iter()
        .find_map(|key| data.get(*key).filter(|v| !v.is_null()))
        .unwrap_or(&data);

    let is_linked = inner
        .get("nodes")
        .map(Value::is_array)
        .unwrap_or(false);
    if is_linked {
        return serde_json::to_string(inner).ok();
    }
    if inner.as_object().is_some_and(|o| !o.is_empty()) {
        return Some(candidate.to_string());
    }
    None
}
